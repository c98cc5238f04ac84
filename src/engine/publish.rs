//! Puzzle announcement publishing.
//!
//! Announcements always come from the primary identity, and the resulting
//! post id is recorded so scored submissions can be cross-posted back into
//! the thread.

use tracing::info;

use crate::engine::drain::ANNOUNCEMENT_KEY_PREFIX;
use crate::error::{Error, Result};
use crate::persist::Gateway;
use crate::social::SocialApi;

/// Post a puzzle announcement and record its thread id. Returns the new
/// post's id.
pub async fn publish_puzzle(
    gateway: &dyn Gateway,
    social: &dyn SocialApi,
    puzzle_id: &str,
    title: &str,
    description: &str,
) -> Result<String> {
    let puzzle = gateway
        .get_puzzle(puzzle_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("puzzle {puzzle_id}")))?;

    let text = format!("{title} - {description} {}", puzzle.puzzle_url);
    let post_id = social.post(&text, None, None, true).await?;

    gateway
        .set_config(&format!("{ANNOUNCEMENT_KEY_PREFIX}{puzzle_id}"), &post_id)
        .await?;
    info!(puzzle_id, post_id = %post_id, "published puzzle announcement");
    Ok(post_id)
}
