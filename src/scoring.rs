//! External scoring service client.
//!
//! The service is a black box: canonical submission URL in, score report
//! out. It is slow and unreliable; callers treat any non-200 or transport
//! failure as transient and retry up to the attempt ceiling.

use async_trait::async_trait;
use serde_json::json;

use crate::error::{Error, Result};
use crate::model::ScoreReport;

#[async_trait]
pub trait Scorer: Send + Sync {
    /// Score one submission.
    async fn score(&self, submission_url: &str) -> Result<ScoreReport>;
}

pub struct HttpScorer {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpScorer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Scorer for HttpScorer {
    async fn score(&self, submission_url: &str) -> Result<ScoreReport> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "level": submission_url }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::ScoringStatus(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}
