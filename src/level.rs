//! Puzzle configuration URL codec.
//!
//! A puzzle URL is a base URL plus an encoded JSON configuration blob after
//! the `?`. Splicing a submitted expression into that blob and re-encoding
//! yields the canonical submission URL: the true identity of a solution,
//! regardless of how the submitter's text was formatted.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::error::{Error, Result};

/// Key under which the submitted expression is spliced into the blob.
const EXPRESSION_KEY: &str = "expressionOverride";

/// Decode a puzzle URL into its base prefix and configuration blob.
pub fn decode_config(url: &str) -> Result<(String, Value)> {
    let (prefix, blob) = url
        .split_once('?')
        .ok_or_else(|| Error::PuzzleUrl(format!("missing config blob: {url}")))?;
    let bytes = STANDARD
        .decode(blob)
        .map_err(|e| Error::PuzzleUrl(format!("bad blob encoding: {e}")))?;
    let config: Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::PuzzleUrl(format!("bad blob payload: {e}")))?;
    Ok((prefix.to_string(), config))
}

/// Re-encode a configuration blob onto a base prefix.
pub fn encode_config(prefix: &str, config: &Value) -> Result<String> {
    let payload = serde_json::to_vec(config)
        .map_err(|e| Error::PuzzleUrl(format!("unencodable config: {e}")))?;
    Ok(format!("{prefix}?{}", STANDARD.encode(payload)))
}

/// Splice a submitted expression into a puzzle URL, producing the canonical
/// submission URL for that solution.
pub fn canonical_submission_url(puzzle_url: &str, expression: &str) -> Result<String> {
    let (prefix, mut config) = decode_config(puzzle_url)?;
    let Value::Object(ref mut map) = config else {
        return Err(Error::PuzzleUrl(format!(
            "config blob is not an object: {puzzle_url}"
        )));
    };
    map.insert(
        EXPRESSION_KEY.to_string(),
        Value::String(expression.to_string()),
    );
    encode_config(&prefix, &config)
}

/// Read back the spliced expression from a canonical submission URL.
pub fn expression_override(url: &str) -> Result<Option<String>> {
    let (_, config) = decode_config(url)?;
    Ok(config
        .get(EXPRESSION_KEY)
        .and_then(Value::as_str)
        .map(str::to_string))
}
