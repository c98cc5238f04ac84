//! Core data model.
//!
//! A work item is one queued submission: the post it arrived in, who sent it,
//! which puzzle it targets, and the free-text solution. Items are mutated by
//! the drain loop and kept forever as historical record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Work queue
// ---------------------------------------------------------------------------

/// One queued submission awaiting scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Platform post identifier. Unique; the dedup and retry key.
    pub post_id: String,

    /// Display name of the submitter.
    pub handle: String,

    /// Puzzle the submission targets, e.g. `puzzle_21`.
    pub puzzle_id: String,

    /// Free-text solution payload, exactly as parsed from the post.
    pub expression: String,

    /// Terminally processed. Completed items are never selected again and
    /// never deleted.
    pub completed: bool,

    /// Scoring attempts so far. Only ever increases; at 3 the item is
    /// excluded from selection and closed out by the orchestrator.
    pub attempts: i32,

    /// Set while a drain cycle holds the item. Stale claims are reclaimable.
    pub claimed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// A parsed, not-yet-queued submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub post_id: String,
    pub handle: String,
    pub puzzle_id: String,
    pub expression: String,
}

/// What happened when a submission was queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueResult {
    /// New work item created.
    Queued,
    /// A work item for this post already exists (dedup hit).
    Duplicate,
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// Immutable reference data for one puzzle. Looked up, never written by the
/// pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub id: String,
    /// Base URL plus an encoded configuration blob after the `?`.
    pub puzzle_url: String,
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// One scored result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub expression: String,

    /// Completion time in seconds. None means the run was disqualified by
    /// the evaluation timeout.
    pub time: Option<f64>,

    pub level: String,

    /// Canonical submission URL, the authoritative duplicate-solution key.
    /// At most one entry exists per distinct value.
    pub play_url: String,

    pub char_count: i64,
    pub player: String,
    pub gameplay_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Scoring service
// ---------------------------------------------------------------------------

/// Payload returned by the external scoring service on a 200 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub expression: String,
    /// URL of the rendered gameplay recording, when one was produced.
    #[serde(default)]
    pub gameplay: Option<String>,
    pub level: String,
    pub char_count: i64,
    pub play_url: String,
    /// Absent or null when the run exceeded the evaluation limit.
    #[serde(default)]
    pub time: Option<f64>,
}
