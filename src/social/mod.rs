//! Social platform capability interface.
//!
//! The pipeline needs exactly four capabilities: search recent tagged posts,
//! post a message (optionally as a reply, optionally with media), upload
//! media fetched from a URL, and refresh an OAuth credential.
//! [`client::HttpSocialClient`] is the production implementation; tests
//! substitute recording fakes.

pub mod auth;
pub mod client;
pub mod pool;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::social::pool::Credential;

/// A raw post returned by search, before submission parsing.
#[derive(Debug, Clone)]
pub struct RawPost {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub posts: Vec<RawPost>,
    /// Continuation token. Absence means this was the last page.
    pub next_token: Option<String>,
    /// Newest post id the platform reports for this search.
    pub newest_id: Option<String>,
}

/// Where a search window starts when no continuation token is in play.
#[derive(Debug, Clone)]
pub enum SearchStart {
    /// Only posts newer than this post id.
    SinceId(String),
    /// Only posts newer than this instant. Used on the very first poll,
    /// bounded to the last 24 hours.
    SinceTime(DateTime<Utc>),
}

/// Refreshed token pair for one credential.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub bearer_token: String,
    pub refresh_token: String,
}

#[async_trait]
pub trait SocialApi: Send + Sync {
    /// Search recent posts matching the query. A `page_token` continues a
    /// prior page and takes precedence over `start`.
    async fn search_recent(
        &self,
        query: &str,
        start: &SearchStart,
        page_token: Option<&str>,
    ) -> Result<SearchPage>;

    /// Post a message, returning the new post's id. `use_primary` bypasses
    /// credential rotation and posts as the primary identity.
    async fn post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        media_id: Option<&str>,
        use_primary: bool,
    ) -> Result<String>;

    /// Fetch media from a URL and upload it to the platform, returning the
    /// platform media id. Ownership is attributed to every pool identity.
    async fn upload_media(&self, source_url: &str, mime_type: &str) -> Result<String>;

    /// Exchange a refresh token for a new token pair.
    async fn refresh_credential(
        &self,
        credential: &Credential,
        refresh_token: &str,
    ) -> Result<TokenPair>;
}
