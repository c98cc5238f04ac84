//! Leaderboard operations: duplicate-solution lookup and scored-result
//! insert.

use uuid::Uuid;

use crate::error::Result;
use crate::model::LeaderboardEntry;

impl super::Db {
    /// Entry whose canonical submission URL matches, if any. This is the
    /// authoritative duplicate-solution check.
    pub async fn leaderboard_entry_by_url(
        &self,
        play_url: &str,
    ) -> Result<Option<LeaderboardEntry>> {
        let row: Option<EntryRow> = sqlx::query_as(
            "SELECT expression, time, level, play_url, char_count, player, gameplay_url
             FROM leaderboard WHERE play_url = $1",
        )
        .bind(play_url)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(EntryRow::into_entry))
    }

    /// Record a scored result. The unique index on `play_url` absorbs a
    /// concurrent duplicate insert.
    pub async fn add_leaderboard_entry(&self, entry: &LeaderboardEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO leaderboard (id, expression, time, level, play_url, char_count, player, gameplay_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (play_url) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(&entry.expression)
        .bind(entry.time)
        .bind(&entry.level)
        .bind(&entry.play_url)
        .bind(entry.char_count)
        .bind(&entry.player)
        .bind(&entry.gameplay_url)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct EntryRow {
    expression: String,
    time: Option<f64>,
    level: String,
    play_url: String,
    char_count: i64,
    player: String,
    gameplay_url: Option<String>,
}

impl EntryRow {
    fn into_entry(self) -> LeaderboardEntry {
        LeaderboardEntry {
            expression: self.expression,
            time: self.time,
            level: self.level,
            play_url: self.play_url,
            char_count: self.char_count,
            player: self.player,
            gameplay_url: self.gameplay_url,
        }
    }
}
