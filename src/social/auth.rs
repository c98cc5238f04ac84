//! Credential lifecycle: periodic token refresh plus the one-time
//! interactive authorization flow.
//!
//! Refresh runs on its own polling loop, independent of ingestion and
//! draining. The interactive flow is operator-invoked only and never runs
//! from the scheduled loops.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore as _;
use secrecy::ExposeSecret as _;
use serde::Deserialize;
use sha2::{Digest as _, Sha256};
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tokio::sync::Notify;
use tracing::{info, warn};

use super::SocialApi;
use super::client::{AUTHORIZE_URL, SCOPES, TOKEN_URL};
use super::pool::{Credential, CredentialPool};
use crate::error::{Error, Result};
use crate::persist::Gateway;
use crate::telemetry::metrics;

/// Stored refresh-token sentinel for a credential that has never completed
/// the interactive flow. The exchange fails cleanly and the failure is
/// isolated to that credential.
const NULL_REFRESH_TOKEN: &str = "<null>";

/// Config key holding a credential's current bearer token.
pub fn bearer_token_key(client_id: &str) -> String {
    format!("bearer_token_{client_id}")
}

/// Config key holding a credential's current refresh token.
pub fn refresh_token_key(client_id: &str) -> String {
    format!("refresh_token_{client_id}")
}

pub struct CredentialLifecycleManager {
    pool: Arc<CredentialPool>,
    social: Arc<dyn SocialApi>,
    gateway: Arc<dyn Gateway>,
    redirect_uri: String,
    interval: Duration,
    shutdown: Arc<Notify>,
}

impl CredentialLifecycleManager {
    pub fn new(
        pool: Arc<CredentialPool>,
        social: Arc<dyn SocialApi>,
        gateway: Arc<dyn Gateway>,
        redirect_uri: String,
        interval: Duration,
    ) -> Self {
        Self {
            pool,
            social,
            gateway,
            redirect_uri,
            interval,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Signal the refresh loop to shut down.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Run the refresh loop until shutdown.
    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            credentials = self.pool.len(),
            "credential refresh loop started"
        );
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("credential refresh loop shutting down");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
            self.refresh_all().await;
        }
    }

    /// Refresh every pool credential. One credential's failure never
    /// blocks the others.
    pub async fn refresh_all(&self) {
        for credential in self.pool.all() {
            match self.refresh_one(credential).await {
                Ok(()) => {
                    metrics::credential_refreshes().add(
                        1,
                        &[opentelemetry::KeyValue::new("result", "ok")],
                    );
                }
                Err(e) => {
                    metrics::credential_refreshes().add(
                        1,
                        &[opentelemetry::KeyValue::new("result", "error")],
                    );
                    warn!(
                        client_id = %credential.client_id,
                        error = %e,
                        "credential refresh failed"
                    );
                }
            }
        }
    }

    async fn refresh_one(&self, credential: &Credential) -> Result<()> {
        let key = refresh_token_key(&credential.client_id);
        let refresh_token = self
            .gateway
            .get_config(&key)
            .await?
            .unwrap_or_else(|| NULL_REFRESH_TOKEN.to_string());

        let pair = self
            .social
            .refresh_credential(credential, &refresh_token)
            .await?;

        self.gateway
            .set_config(&bearer_token_key(&credential.client_id), &pair.bearer_token)
            .await?;
        self.gateway.set_config(&key, &pair.refresh_token).await?;
        info!(client_id = %credential.client_id, "refreshed credential tokens");
        Ok(())
    }

    /// Interactive authorization-code exchange for every credential with no
    /// stored bearer token. Operator-invoked; prompts on stdin per
    /// credential.
    pub async fn force_user_authentication(&self) -> Result<()> {
        for credential in self.pool.all() {
            let bearer_key = bearer_token_key(&credential.client_id);
            if self.gateway.get_config(&bearer_key).await?.is_some() {
                info!(client_id = %credential.client_id, "already authorized, skipping");
                continue;
            }
            self.authorize_interactive(credential).await?;
        }
        Ok(())
    }

    async fn authorize_interactive(&self, credential: &Credential) -> Result<()> {
        let (verifier, challenge) = pkce_pair();

        let authorize_url = format!(
            "{AUTHORIZE_URL}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={challenge}&code_challenge_method=S256",
            credential.client_id,
            self.redirect_uri,
            SCOPES.replace(' ', "%20"),
            uuid::Uuid::new_v4(),
        );

        println!("Authorize {} by visiting:\n  {authorize_url}", credential.client_id);
        println!("Paste the 'code' parameter from the callback URL:");

        let mut code = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut code)
            .await
            .map_err(|e| Error::Other(format!("reading authorization code: {e}")))?;
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::Config("empty authorization code".to_string()));
        }

        let response = reqwest::Client::new()
            .post(TOKEN_URL)
            .basic_auth(
                &credential.client_id,
                Some(credential.client_secret.expose_secret()),
            )
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", credential.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code_verifier", verifier.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Social {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let token: CodeExchangeResponse = response.json().await?;

        self.gateway
            .set_config(&bearer_token_key(&credential.client_id), &token.access_token)
            .await?;
        self.gateway
            .set_config(&refresh_token_key(&credential.client_id), &token.refresh_token)
            .await?;
        info!(client_id = %credential.client_id, "authorized credential");
        Ok(())
    }
}

/// PKCE verifier + S256 challenge.
fn pkce_pair() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let verifier = URL_SAFE_NO_PAD.encode(bytes);
    let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
    (verifier, challenge)
}

#[derive(Debug, Deserialize)]
struct CodeExchangeResponse {
    access_token: String,
    refresh_token: String,
}
