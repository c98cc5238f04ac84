//! Puzzle catalog lookups. The pipeline never writes this table.

use crate::error::Result;
use crate::model::PuzzleRecord;

impl super::Db {
    /// Puzzle reference data by id.
    pub async fn get_puzzle(&self, puzzle_id: &str) -> Result<Option<PuzzleRecord>> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT id, puzzle_url FROM puzzles WHERE id = $1")
                .bind(puzzle_id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(|(id, puzzle_url)| PuzzleRecord { id, puzzle_url }))
    }
}
