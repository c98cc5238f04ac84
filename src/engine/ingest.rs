//! Submission ingestion: poll search, parse, enqueue.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use opentelemetry::KeyValue;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::QueueResult;
use crate::persist::Gateway;
use crate::social::{SearchStart, SocialApi};
use crate::submission::parse_submission;
use crate::telemetry::metrics;

/// Config key holding the newest post id seen by any prior poll.
pub const CURSOR_KEY: &str = "newest_post_id";

pub struct SubmissionIngester {
    gateway: Arc<dyn Gateway>,
    social: Arc<dyn SocialApi>,
    /// Search query identifying candidate submission posts.
    query: String,
    /// The bot's own identities. Posts from these never self-trigger.
    owner_ids: HashSet<String>,
    interval: Duration,
    shutdown: Arc<Notify>,
}

impl SubmissionIngester {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        social: Arc<dyn SocialApi>,
        query: String,
        owner_ids: HashSet<String>,
        interval: Duration,
    ) -> Self {
        Self {
            gateway,
            social,
            query,
            owner_ids,
            interval,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Signal the ingestion loop to shut down.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Run the ingestion loop until shutdown.
    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            "ingestion loop started"
        );
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("ingestion loop shutting down");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
            if let Err(e) = self.poll_new_submissions().await {
                warn!(error = %e, "ingestion cycle failed");
            }
        }
    }

    /// One poll cycle: page through everything new, enqueue every valid
    /// submission, then advance the cursor.
    pub async fn poll_new_submissions(&self) -> Result<()> {
        let start = match self.gateway.get_config(CURSOR_KEY).await? {
            Some(id) => SearchStart::SinceId(id),
            // First run: bound the window to the last day instead.
            None => SearchStart::SinceTime(Utc::now() - chrono::Duration::hours(24)),
        };

        let mut page_token: Option<String> = None;
        let mut newest_id: Option<String> = None;
        let mut submissions = Vec::new();

        loop {
            let page = self
                .social
                .search_recent(&self.query, &start, page_token.as_deref())
                .await?;

            if page.newest_id.is_some() {
                newest_id = page.newest_id.clone();
            }

            for post in &page.posts {
                if self.owner_ids.contains(&post.author_id) {
                    debug!(post_id = %post.id, "own post, ignoring");
                    continue;
                }
                match parse_submission(&post.id, &post.author_name, &post.text) {
                    Some(submission) => submissions.push(submission),
                    // Not an error. Most matching posts aren't submissions.
                    None => debug!(post_id = %post.id, "not a submission, ignoring"),
                }
            }

            match page.next_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(count = submissions.len(), "new submissions found");
        for submission in &submissions {
            // One bad enqueue must not abort the rest of the cycle.
            match self.gateway.queue_submission(submission).await {
                Ok(QueueResult::Queued) => {
                    metrics::submissions_ingested().add(1, &[KeyValue::new("result", "queued")]);
                }
                Ok(QueueResult::Duplicate) => {
                    metrics::submissions_ingested()
                        .add(1, &[KeyValue::new("result", "duplicate")]);
                    debug!(post_id = %submission.post_id, "already queued, skipping");
                }
                Err(e) => {
                    metrics::submissions_ingested().add(1, &[KeyValue::new("result", "error")]);
                    warn!(post_id = %submission.post_id, error = %e, "enqueue failed");
                }
            }
        }

        // Never move the cursor when nothing came back.
        if let Some(ref id) = newest_id {
            self.gateway.set_config(CURSOR_KEY, id).await?;
        }

        Ok(())
    }
}
