//! Persistence gateway: the record-store operations the pipeline needs.
//!
//! Pure data access over four logical tables (work queue, leaderboard,
//! key/value config, puzzle catalog). Business rules live in the engine;
//! implementations only move records. The production implementation is
//! [`crate::db::Db`]; tests substitute an in-memory store.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{LeaderboardEntry, NewSubmission, PuzzleRecord, QueueResult, WorkItem};

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Value for a config key, if present.
    async fn get_config(&self, key: &str) -> Result<Option<String>>;

    /// Upsert a config key.
    async fn set_config(&self, key: &str, value: &str) -> Result<()>;

    /// Insert a submission into the work queue. A duplicate post id is a
    /// normal outcome, not an error.
    async fn queue_submission(&self, new: &NewSubmission) -> Result<QueueResult>;

    /// All items eligible for a drain cycle: not completed, attempts < 3.
    async fn eligible_work(&self) -> Result<Vec<WorkItem>>;

    /// One work item by post id.
    async fn get_work(&self, post_id: &str) -> Result<Option<WorkItem>>;

    /// Atomically claim an item for processing. False means another cycle
    /// holds a live claim on it.
    async fn claim_work(&self, post_id: &str) -> Result<bool>;

    /// Release a claim so the next cycle can retry the item.
    async fn release_claim(&self, post_id: &str) -> Result<()>;

    /// Mark an item terminally completed.
    async fn complete_work(&self, post_id: &str) -> Result<()>;

    /// Bump the attempt counter, returning the new count.
    async fn increment_attempts(&self, post_id: &str) -> Result<i32>;

    /// Puzzle reference data by id.
    async fn get_puzzle(&self, puzzle_id: &str) -> Result<Option<PuzzleRecord>>;

    /// Leaderboard entry whose canonical URL matches, if any.
    async fn leaderboard_entry_by_url(&self, play_url: &str)
    -> Result<Option<LeaderboardEntry>>;

    /// Record a scored result. At most one entry per canonical URL; a
    /// concurrent duplicate insert is silently dropped.
    async fn add_leaderboard_entry(&self, entry: &LeaderboardEntry) -> Result<()>;
}
