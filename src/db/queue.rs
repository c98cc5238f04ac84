//! Work queue operations: dedup insert, eligibility, claims, attempts.

use chrono::{Duration, Utc};

use crate::error::{Error, Result};
use crate::model::{NewSubmission, QueueResult, WorkItem};

/// Claims older than this are stale: the cycle that took them is assumed
/// dead and the item becomes reclaimable.
const CLAIM_WINDOW_SECS: i64 = 300;

impl super::Db {
    /// Insert a submission. The primary key on `post_id` makes this
    /// idempotent: re-ingesting the same post is a no-op.
    pub async fn queue_submission(&self, new: &NewSubmission) -> Result<QueueResult> {
        let inserted = sqlx::query(
            "INSERT INTO work_queue (post_id, handle, puzzle_id, expression, completed, attempts)
             VALUES ($1, $2, $3, $4, FALSE, 0)
             ON CONFLICT (post_id) DO NOTHING",
        )
        .bind(&new.post_id)
        .bind(&new.handle)
        .bind(&new.puzzle_id)
        .bind(&new.expression)
        .execute(self.pool())
        .await?
        .rows_affected();

        Ok(if inserted == 0 {
            QueueResult::Duplicate
        } else {
            QueueResult::Queued
        })
    }

    /// Everything a drain cycle should look at: open items under the
    /// attempt ceiling, oldest first.
    pub async fn eligible_work(&self) -> Result<Vec<WorkItem>> {
        let rows: Vec<WorkRow> = sqlx::query_as(
            "SELECT post_id, handle, puzzle_id, expression, completed, attempts, claimed_at, created_at
             FROM work_queue
             WHERE completed = FALSE AND attempts < 3
             ORDER BY created_at",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(WorkRow::into_work_item).collect())
    }

    /// One work item by post id.
    pub async fn get_work(&self, post_id: &str) -> Result<Option<WorkItem>> {
        let row: Option<WorkRow> = sqlx::query_as(
            "SELECT post_id, handle, puzzle_id, expression, completed, attempts, claimed_at, created_at
             FROM work_queue WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(WorkRow::into_work_item))
    }

    /// Conditionally take the claim marker. Returns false when another
    /// cycle holds a claim newer than the stale window.
    pub async fn claim_work(&self, post_id: &str) -> Result<bool> {
        let stale_before = Utc::now() - Duration::seconds(CLAIM_WINDOW_SECS);
        let claimed = sqlx::query(
            "UPDATE work_queue SET claimed_at = now()
             WHERE post_id = $1 AND completed = FALSE
               AND (claimed_at IS NULL OR claimed_at < $2)",
        )
        .bind(post_id)
        .bind(stale_before)
        .execute(self.pool())
        .await?
        .rows_affected();
        Ok(claimed > 0)
    }

    /// Drop the claim marker so the next cycle can retry the item.
    pub async fn release_claim(&self, post_id: &str) -> Result<()> {
        sqlx::query("UPDATE work_queue SET claimed_at = NULL WHERE post_id = $1")
            .bind(post_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Mark an item terminally completed.
    pub async fn complete_work(&self, post_id: &str) -> Result<()> {
        let updated = sqlx::query("UPDATE work_queue SET completed = TRUE WHERE post_id = $1")
            .bind(post_id)
            .execute(self.pool())
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(Error::NotFound(format!("work item {post_id}")));
        }
        Ok(())
    }

    /// Bump the attempt counter, returning the new count.
    pub async fn increment_attempts(&self, post_id: &str) -> Result<i32> {
        let row: Option<(i32,)> = sqlx::query_as(
            "UPDATE work_queue SET attempts = attempts + 1 WHERE post_id = $1 RETURNING attempts",
        )
        .bind(post_id)
        .fetch_optional(self.pool())
        .await?;
        row.map(|r| r.0)
            .ok_or_else(|| Error::NotFound(format!("work item {post_id}")))
    }

    /// Operator listing: most recent items first, regardless of state.
    pub async fn list_work(&self, limit: i64) -> Result<Vec<WorkItem>> {
        let rows: Vec<WorkRow> = sqlx::query_as(
            "SELECT post_id, handle, puzzle_id, expression, completed, attempts, claimed_at, created_at
             FROM work_queue ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(WorkRow::into_work_item).collect())
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct WorkRow {
    post_id: String,
    handle: String,
    puzzle_id: String,
    expression: String,
    completed: bool,
    attempts: i32,
    claimed_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl WorkRow {
    fn into_work_item(self) -> WorkItem {
        WorkItem {
            post_id: self.post_id,
            handle: self.handle,
            puzzle_id: self.puzzle_id,
            expression: self.expression,
            completed: self.completed,
            attempts: self.attempts,
            claimed_at: self.claimed_at,
            created_at: self.created_at,
        }
    }
}
