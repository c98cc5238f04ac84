//! Error types for scorebot-rs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("social platform error ({status}): {message}")]
    Social { status: u16, message: String },

    #[error("scoring service returned status {0}")]
    ScoringStatus(u16),

    #[error("malformed puzzle url: {0}")]
    PuzzleUrl(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
