//! Queue draining: the per-submission scoring state machine.
//!
//! Each cycle selects every open item under the attempt ceiling and fans
//! out, bounded by a semaphore. Items are claimed before processing so an
//! overrunning cycle cannot race the next one onto the same submission.

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinSet;
use tracing::{Instrument as _, debug, info, warn};

use crate::engine::notify::NotificationDispatcher;
use crate::error::Result;
use crate::level;
use crate::model::{LeaderboardEntry, PuzzleRecord, WorkItem};
use crate::persist::Gateway;
use crate::scoring::Scorer;
use crate::telemetry::metrics;
use crate::telemetry::work::{record_drain_outcome, start_drain_span};

/// Attempt ceiling. A transient scoring failure on the final attempt
/// becomes terminal and user-visible.
pub const MAX_ATTEMPTS: i32 = 3;

/// Config key prefix mapping a puzzle id to its announcement post.
pub const ANNOUNCEMENT_KEY_PREFIX: &str = "announcement_";

/// How processing one work item ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Completed by a prior pass before we touched it.
    AlreadyCompleted,
    /// Another cycle holds a live claim.
    ClaimLost,
    /// Puzzle id matched nothing in the catalog. Terminal.
    InvalidPuzzle,
    /// Canonical URL already on the leaderboard. Terminal.
    Duplicate,
    /// Transient failure; the item stays open for the next cycle.
    Retry,
    /// Transient failure on the final attempt. Terminal.
    FailedExhausted,
    /// Scored, but no timing value came back. Terminal.
    Disqualified,
    /// Scored and recorded. Terminal.
    Scored,
}

impl DrainOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DrainOutcome::AlreadyCompleted => "already_completed",
            DrainOutcome::ClaimLost => "claim_lost",
            DrainOutcome::InvalidPuzzle => "invalid_puzzle",
            DrainOutcome::Duplicate => "duplicate",
            DrainOutcome::Retry => "retry",
            DrainOutcome::FailedExhausted => "failed_exhausted",
            DrainOutcome::Disqualified => "disqualified",
            DrainOutcome::Scored => "scored",
        }
    }
}

pub struct ScoringOrchestrator {
    gateway: Arc<dyn Gateway>,
    scorer: Arc<dyn Scorer>,
    notifier: Arc<NotificationDispatcher>,
    permits: Arc<Semaphore>,
    interval: Duration,
    shutdown: Arc<Notify>,
}

impl Clone for ScoringOrchestrator {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            scorer: Arc::clone(&self.scorer),
            notifier: Arc::clone(&self.notifier),
            permits: Arc::clone(&self.permits),
            interval: self.interval,
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl ScoringOrchestrator {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        scorer: Arc<dyn Scorer>,
        notifier: Arc<NotificationDispatcher>,
        max_concurrent: usize,
        interval: Duration,
    ) -> Self {
        Self {
            gateway,
            scorer,
            notifier,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            interval,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Signal the drain loop to shut down.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Run the drain loop until shutdown.
    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            "drain loop started"
        );
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("drain loop shutting down");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
            if let Err(e) = self.drain_queue().await {
                warn!(error = %e, "drain cycle failed");
            }
        }
    }

    /// One drain cycle: fan out over every eligible item, join before
    /// returning.
    pub async fn drain_queue(&self) -> Result<()> {
        let eligible = self.gateway.eligible_work().await?;
        if eligible.is_empty() {
            return Ok(());
        }
        info!(count = eligible.len(), "draining work queue");

        let mut tasks = JoinSet::new();
        for item in eligible {
            let worker = self.clone();
            tasks.spawn(async move {
                let Ok(_permit) = worker.permits.acquire().await else {
                    return;
                };
                let span = start_drain_span(&item.post_id, &item.puzzle_id);
                match worker.process_item(&item).instrument(span.clone()).await {
                    Ok(outcome) => {
                        record_drain_outcome(&span, outcome.as_str());
                        metrics::drain_outcomes()
                            .add(1, &[KeyValue::new("outcome", outcome.as_str())]);
                    }
                    // Isolated: one item's failure never touches its
                    // siblings. State was not advanced, so the next cycle
                    // retries naturally.
                    Err(e) => {
                        warn!(post_id = %item.post_id, error = %e, "processing failed");
                    }
                }
            });
        }
        while tasks.join_next().await.is_some() {}
        Ok(())
    }

    /// The per-item state machine.
    async fn process_item(&self, item: &WorkItem) -> Result<DrainOutcome> {
        // Claim before touching anything. A lost claim means another cycle
        // is already on this item.
        if !self.gateway.claim_work(&item.post_id).await? {
            debug!(post_id = %item.post_id, "claim lost, skipping");
            return Ok(DrainOutcome::ClaimLost);
        }

        // Recheck: a prior pass may have completed this item between
        // selection and claim.
        match self.gateway.get_work(&item.post_id).await? {
            Some(current) if !current.completed => {}
            _ => return Ok(DrainOutcome::AlreadyCompleted),
        }

        let attempts = self.gateway.increment_attempts(&item.post_id).await?;
        debug!(
            attempt = attempts,
            handle = %item.handle,
            puzzle_id = %item.puzzle_id,
            "scoring submission"
        );

        let Some(puzzle) = self.gateway.get_puzzle(&item.puzzle_id).await? else {
            self.gateway.complete_work(&item.post_id).await?;
            self.notifier.notify_invalid_puzzle(item).await;
            return Ok(DrainOutcome::InvalidPuzzle);
        };

        match self.score_and_record(item, &puzzle).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                // Transient: scoring service unreachable or refusing, or a
                // mangled catalog entry. Retried until the ceiling, then
                // the submitter is told instead of left hanging.
                metrics::scoring_failures().add(1, &[]);
                if attempts >= MAX_ATTEMPTS {
                    warn!(post_id = %item.post_id, error = %e, "attempts exhausted");
                    self.gateway.complete_work(&item.post_id).await?;
                    self.notifier.notify_unknown_error(item).await;
                    Ok(DrainOutcome::FailedExhausted)
                } else {
                    warn!(post_id = %item.post_id, attempt = attempts, error = %e, "scoring failed, will retry");
                    self.gateway.release_claim(&item.post_id).await?;
                    Ok(DrainOutcome::Retry)
                }
            }
        }
    }

    async fn score_and_record(
        &self,
        item: &WorkItem,
        puzzle: &PuzzleRecord,
    ) -> Result<DrainOutcome> {
        let submission_url = level::canonical_submission_url(&puzzle.puzzle_url, &item.expression)?;

        // Duplicate-solution guard on the canonical URL: two different
        // posts can normalize to the same solution, and the leaderboard
        // holds at most one entry per solution.
        if let Some(existing) = self
            .gateway
            .leaderboard_entry_by_url(&submission_url)
            .await?
        {
            self.gateway.complete_work(&item.post_id).await?;
            self.notifier.notify_duplicate(item, &existing).await;
            return Ok(DrainOutcome::Duplicate);
        }

        let started = std::time::Instant::now();
        let report = self.scorer.score(&submission_url).await?;
        metrics::scoring_duration_ms().record(started.elapsed().as_millis() as f64, &[]);

        let entry = LeaderboardEntry {
            expression: report.expression.clone(),
            time: report.time,
            level: report.level.clone(),
            play_url: submission_url,
            char_count: report.char_count,
            player: item.handle.clone(),
            gameplay_url: report.gameplay.clone(),
        };
        self.gateway.add_leaderboard_entry(&entry).await?;
        self.gateway.complete_work(&item.post_id).await?;

        if report.time.is_none() {
            self.notifier.notify_disqualified(item).await;
            return Ok(DrainOutcome::Disqualified);
        }

        // Cross-posting is best-effort; a failed thread lookup must not
        // fail an already-recorded score.
        let announcement_key = format!("{ANNOUNCEMENT_KEY_PREFIX}{}", item.puzzle_id);
        let announcement_thread = match self.gateway.get_config(&announcement_key).await {
            Ok(thread) => thread,
            Err(e) => {
                warn!(error = %e, "announcement thread lookup failed");
                None
            }
        };
        self.notifier
            .notify_scored(item, &report, announcement_thread.as_deref())
            .await;
        Ok(DrainOutcome::Scored)
    }
}
