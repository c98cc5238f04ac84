//! Database connection pool, migrations, and health check.
//!
//! One Postgres pool shared by all four table families. Submodules hold the
//! per-table operations; this module wires the pool and implements the
//! [`Gateway`] trait by delegation.

pub mod kv;
pub mod leaderboard;
pub mod puzzles;
pub mod queue;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::Result;
use crate::model::{LeaderboardEntry, NewSubmission, PuzzleRecord, QueueResult, WorkItem};
use crate::persist::Gateway;

/// Database handle. Owns the connection pool shared across all modules.
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Connect to Postgres and create a connection pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| crate::error::Error::Other(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Simple health check — run a SELECT 1.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Gateway for Db {
    async fn get_config(&self, key: &str) -> Result<Option<String>> {
        Db::get_config(self, key).await
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        Db::set_config(self, key, value).await
    }

    async fn queue_submission(&self, new: &NewSubmission) -> Result<QueueResult> {
        Db::queue_submission(self, new).await
    }

    async fn eligible_work(&self) -> Result<Vec<WorkItem>> {
        Db::eligible_work(self).await
    }

    async fn get_work(&self, post_id: &str) -> Result<Option<WorkItem>> {
        Db::get_work(self, post_id).await
    }

    async fn claim_work(&self, post_id: &str) -> Result<bool> {
        Db::claim_work(self, post_id).await
    }

    async fn release_claim(&self, post_id: &str) -> Result<()> {
        Db::release_claim(self, post_id).await
    }

    async fn complete_work(&self, post_id: &str) -> Result<()> {
        Db::complete_work(self, post_id).await
    }

    async fn increment_attempts(&self, post_id: &str) -> Result<i32> {
        Db::increment_attempts(self, post_id).await
    }

    async fn get_puzzle(&self, puzzle_id: &str) -> Result<Option<PuzzleRecord>> {
        Db::get_puzzle(self, puzzle_id).await
    }

    async fn leaderboard_entry_by_url(
        &self,
        play_url: &str,
    ) -> Result<Option<LeaderboardEntry>> {
        Db::leaderboard_entry_by_url(self, play_url).await
    }

    async fn add_leaderboard_entry(&self, entry: &LeaderboardEntry) -> Result<()> {
        Db::add_leaderboard_entry(self, entry).await
    }
}
