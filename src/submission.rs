//! Submission post parsing.
//!
//! A submission post carries a puzzle tag and a free-text expression sitting
//! between a fixed marker phrase and the share-boilerplate trailer. Anything
//! that doesn't match is not a submission and is dropped silently; most
//! posts matching the search query are retweets, replies, or chatter.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::NewSubmission;

/// Marker phrase preceding the expression in the post template.
const MARKER_PHRASE: &str = "characters";

/// Boilerplate trailer following the expression.
const TRAILER_PHRASE: &str = "Try solving it yourself:";

fn submission_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?s)#(?P<puzzle>puzzle_[0-9]+).*{MARKER_PHRASE}(?P<expression>.*){TRAILER_PHRASE} .+"
        ))
        .expect("submission pattern compiles")
    })
}

/// Parse a raw post body into a normalized submission.
///
/// Returns None for anything that is not a submission.
pub fn parse_submission(post_id: &str, handle: &str, text: &str) -> Option<NewSubmission> {
    let caps = submission_re().captures(text)?;
    let puzzle_id = caps.name("puzzle")?.as_str().to_string();
    let expression = caps.name("expression")?.as_str().trim().to_string();
    if expression.is_empty() {
        return None;
    }
    Some(NewSubmission {
        post_id: post_id.to_string(),
        handle: handle.to_string(),
        puzzle_id,
        expression,
    })
}
