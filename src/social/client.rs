//! HTTP social platform client over the rotating credential pool.
//!
//! Bearer tokens are not cached here: every call reads the current token
//! for the selected credential from the persistence gateway, so a refresh
//! landed by the lifecycle manager takes effect on the next request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{RawPost, SearchPage, SearchStart, SocialApi, TokenPair};
use crate::error::{Error, Result};
use crate::persist::Gateway;
use crate::social::auth::bearer_token_key;
use crate::social::pool::{Credential, CredentialPool};

const API_BASE: &str = "https://api.twitter.com/2";
const UPLOAD_BASE: &str = "https://upload.twitter.com/1.1";
pub(crate) const TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";
pub(crate) const AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";
pub(crate) const SCOPES: &str = "tweet.read users.read tweet.write offline.access";

/// Sentinel stored bearer when a credential has never been authorized.
const UNKNOWN_TOKEN: &str = "<unknown>";

/// Pages are kept small; the poll interval already respects the search
/// rate limit, so depth matters more than width here.
const SEARCH_PAGE_SIZE: u32 = 10;

pub struct HttpSocialClient {
    http: reqwest::Client,
    pool: Arc<CredentialPool>,
    gateway: Arc<dyn Gateway>,
    api_base: String,
    upload_base: String,
}

impl HttpSocialClient {
    pub fn new(pool: Arc<CredentialPool>, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            http: reqwest::Client::new(),
            pool,
            gateway,
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }

    /// Current bearer token for a credential, as persisted by the refresh
    /// loop. Falls back to a sentinel that the platform will reject with a
    /// 401, which surfaces as a normal transient failure.
    async fn bearer_for(&self, credential: &Credential) -> Result<String> {
        Ok(self
            .gateway
            .get_config(&bearer_token_key(&credential.client_id))
            .await?
            .unwrap_or_else(|| UNKNOWN_TOKEN.to_string()))
    }

    async fn platform_error(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Error::Social { status, message }
    }
}

#[async_trait]
impl SocialApi for HttpSocialClient {
    async fn search_recent(
        &self,
        query: &str,
        start: &SearchStart,
        page_token: Option<&str>,
    ) -> Result<SearchPage> {
        let credential = self.pool.next();
        let bearer = self.bearer_for(credential).await?;

        let mut request = self
            .http
            .get(format!("{}/tweets/search/recent", self.api_base))
            .bearer_auth(bearer)
            .query(&[
                ("query", query.to_string()),
                ("max_results", SEARCH_PAGE_SIZE.to_string()),
                ("expansions", "author_id".to_string()),
                ("tweet.fields", "author_id,created_at".to_string()),
                ("user.fields", "name,username".to_string()),
            ]);

        // A continuation token supersedes the window bounds.
        match page_token {
            Some(token) => request = request.query(&[("next_token", token)]),
            None => match start {
                SearchStart::SinceId(id) => request = request.query(&[("since_id", id)]),
                SearchStart::SinceTime(t) => {
                    let start_time = t.to_rfc3339();
                    request = request.query(&[("start_time", start_time.as_str())]);
                }
            },
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::platform_error(response).await);
        }
        let body: SearchResponse = response.json().await?;

        let posts = body
            .data
            .into_iter()
            .map(|tweet| {
                let author_name = body
                    .includes
                    .users
                    .iter()
                    .find(|u| u.id == tweet.author_id)
                    .map(|u| u.name.clone())
                    .unwrap_or_else(|| tweet.author_id.clone());
                RawPost {
                    id: tweet.id,
                    author_id: tweet.author_id,
                    author_name,
                    text: tweet.text,
                }
            })
            .collect();

        Ok(SearchPage {
            posts,
            next_token: body.meta.next_token,
            newest_id: body.meta.newest_id,
        })
    }

    async fn post(
        &self,
        text: &str,
        reply_to: Option<&str>,
        media_id: Option<&str>,
        use_primary: bool,
    ) -> Result<String> {
        let credential = self.pool.select(use_primary);
        let bearer = self.bearer_for(credential).await?;

        let mut body = json!({ "text": text });
        if let Some(parent) = reply_to {
            body["reply"] = json!({ "in_reply_to_tweet_id": parent });
        }
        if let Some(media) = media_id {
            body["media"] = json!({ "media_ids": [media] });
        }

        let response = self
            .http
            .post(format!("{}/tweets", self.api_base))
            .bearer_auth(bearer)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::platform_error(response).await);
        }
        let created: PostResponse = response.json().await?;
        Ok(created.data.id)
    }

    async fn upload_media(&self, source_url: &str, mime_type: &str) -> Result<String> {
        let media = self.http.get(source_url).send().await?;
        if !media.status().is_success() {
            return Err(Self::platform_error(media).await);
        }
        let bytes = media.bytes().await?;

        let extension = mime_type.split('/').next_back().unwrap_or("bin");
        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name(format!("{}-gameplay.{extension}", Uuid::new_v4()))
            .mime_str(mime_type)?;
        let owners = self
            .pool
            .owner_ids()
            .into_iter()
            .collect::<Vec<_>>()
            .join(",");
        let form = multipart::Form::new()
            .part("media", part)
            .text("additional_owners", owners);

        let credential = self.pool.next();
        let bearer = self.bearer_for(credential).await?;
        let response = self
            .http
            .post(format!("{}/media/upload.json", self.upload_base))
            .bearer_auth(bearer)
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::platform_error(response).await);
        }
        let uploaded: MediaResponse = response.json().await?;
        Ok(uploaded.media_id_string)
    }

    async fn refresh_credential(
        &self,
        credential: &Credential,
        refresh_token: &str,
    ) -> Result<TokenPair> {
        use secrecy::ExposeSecret as _;

        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(
                &credential.client_id,
                Some(credential.client_secret.expose_secret()),
            )
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", credential.client_id.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::platform_error(response).await);
        }
        let token: TokenResponse = response.json().await?;
        Ok(TokenPair {
            bearer_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchTweet>,
    #[serde(default)]
    includes: SearchIncludes,
    #[serde(default)]
    meta: SearchMeta,
}

#[derive(Debug, Deserialize)]
struct SearchTweet {
    id: String,
    author_id: String,
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchIncludes {
    #[serde(default)]
    users: Vec<SearchUser>,
}

#[derive(Debug, Deserialize)]
struct SearchUser {
    id: String,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchMeta {
    newest_id: Option<String>,
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    media_id_string: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}
