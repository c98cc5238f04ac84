//! Outcome notifications.
//!
//! Thin policy layer mapping scoring outcomes to replies. Nothing here
//! returns an error to the orchestrator: a failed post means the submitter
//! misses a reply, and a failed media upload degrades to a text-only reply.

use std::sync::Arc;

use opentelemetry::KeyValue;
use rand::Rng as _;
use tracing::warn;

use crate::model::{LeaderboardEntry, ScoreReport, WorkItem};
use crate::social::SocialApi;
use crate::telemetry::metrics;

const DUPLICATE_TEXT: &str =
    "Sorry, someone already submitted that solution. Try again with a different answer!";

const INVALID_PUZZLE_TEXT: &str =
    "I'm terribly sorry, but I'm not aware of a puzzle with that name!";

const UNKNOWN_ERROR_TEXT: &str = "Sorry, I encountered an error scoring that submission :(";

const DISQUALIFIED_TEXT: &str = "Sorry, that submission takes longer than 30 seconds to \
    evaluate, so we had to disqualify it. :( Try again with a new solution!";

pub struct NotificationDispatcher {
    social: Arc<dyn SocialApi>,
    /// Public leaderboard page linked from scored replies.
    leaderboard_url: String,
}

impl NotificationDispatcher {
    pub fn new(social: Arc<dyn SocialApi>, leaderboard_url: String) -> Self {
        Self {
            social,
            leaderboard_url,
        }
    }

    /// Successful score: reply on the submission thread with the gameplay
    /// recording, then challenge the announcement thread when one is on
    /// record for the puzzle.
    pub async fn notify_scored(
        &self,
        item: &WorkItem,
        report: &ScoreReport,
        announcement_thread: Option<&str>,
    ) {
        let media_id = match &report.gameplay {
            Some(url) => self.try_upload(url).await,
            None => None,
        };

        let text = scored_message(
            &report.level,
            report.time.unwrap_or_default(),
            report.char_count,
            &self.leaderboard_url,
        );
        self.try_post(&text, Some(&item.post_id), media_id.as_deref(), false, "scored")
            .await;

        if let Some(thread_id) = announcement_thread {
            let challenge = format!(
                "We've just gotten a new submission in from {}! Can you beat them?",
                item.handle
            );
            self.try_post(&challenge, Some(thread_id), media_id.as_deref(), true, "challenge")
                .await;
        }
    }

    /// The solution is already on the leaderboard. Attach the existing
    /// gameplay recording when there is one.
    pub async fn notify_duplicate(&self, item: &WorkItem, existing: &LeaderboardEntry) {
        let media_id = match &existing.gameplay_url {
            Some(url) => self.try_upload(url).await,
            None => None,
        };
        self.try_post(
            DUPLICATE_TEXT,
            Some(&item.post_id),
            media_id.as_deref(),
            false,
            "duplicate",
        )
        .await;
    }

    pub async fn notify_invalid_puzzle(&self, item: &WorkItem) {
        self.try_post(INVALID_PUZZLE_TEXT, Some(&item.post_id), None, false, "invalid_puzzle")
            .await;
    }

    pub async fn notify_unknown_error(&self, item: &WorkItem) {
        self.try_post(UNKNOWN_ERROR_TEXT, Some(&item.post_id), None, false, "unknown_error")
            .await;
    }

    pub async fn notify_disqualified(&self, item: &WorkItem) {
        self.try_post(DISQUALIFIED_TEXT, Some(&item.post_id), None, false, "disqualified")
            .await;
    }

    async fn try_upload(&self, source_url: &str) -> Option<String> {
        match self.social.upload_media(source_url, "video/mp4").await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "media upload failed, replying text-only");
                None
            }
        }
    }

    async fn try_post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        media_id: Option<&str>,
        use_primary: bool,
        kind: &'static str,
    ) {
        match self.social.post(text, reply_to, media_id, use_primary).await {
            Ok(_) => {
                metrics::notifications_sent().add(1, &[KeyValue::new("kind", kind)]);
            }
            Err(e) => {
                warn!(kind, error = %e, "notification post failed");
            }
        }
    }
}

/// Cosmetic variety only; which phrasing lands is not a correctness
/// concern.
fn scored_message(level: &str, time: f64, char_count: i64, leaderboard_url: &str) -> String {
    match rand::thread_rng().gen_range(0..4) {
        0 => format!(
            "Grooooovy! You're on the leaderboard for {level} with a time of {time} (speedy!!) \
             and a character count of {char_count}! Also, we made you an *awesome* video of \
             your run!\r\nCheck your spot on the leaderboards here: {leaderboard_url}"
        ),
        1 => format!(
            "Woohoo!! You're on the leaderboard for {level} with a time of {time} (vroom vroom!) \
             and a character count of {char_count}! Check out this super cool video of your \
             run!\r\nCheck your spot on the leaderboards here: {leaderboard_url}"
        ),
        2 => format!(
            "\u{1f973}\u{1f973}\u{1f973} You're on the {level} leaderboard with a super speedy \
             time of {time} and a character count of {char_count}! We even made this groovy \
             video of your run!\r\nCheck your spot on the leaderboards here: {leaderboard_url}"
        ),
        _ => format!(
            "Cowabunga! You've made it onto the {level} leaderboard! You got an unbelievably \
             fast time of {time} (WOW!) and a character count of {char_count}! There's even a \
             super cool video of your run!\r\nCheck your spot on the leaderboards here: \
             {leaderboard_url}"
        ),
    }
}
