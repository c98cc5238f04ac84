//! Rotating credential pool.
//!
//! Posting picks the next credential by a monotonic round-robin counter;
//! the primary identity (pool index 0) is used for puzzle announcements
//! regardless of rotation, so announcements always come from one account.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level TOML wrapper.
#[derive(Debug, Deserialize)]
struct PoolFile {
    credential: Vec<CredentialConfig>,
}

#[derive(Debug, Deserialize)]
struct CredentialConfig {
    client_id: String,
    client_secret: String,
    owner_user_id: String,
}

/// One OAuth client in the pool.
#[derive(Debug, Clone)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Platform user id of the identity this client posts as.
    pub owner_user_id: String,
}

pub struct CredentialPool {
    credentials: Vec<Credential>,
    counter: AtomicUsize,
}

impl CredentialPool {
    pub fn new(credentials: Vec<Credential>) -> Result<Self> {
        if credentials.is_empty() {
            return Err(Error::Config("credential pool is empty".to_string()));
        }
        Ok(Self {
            credentials,
            counter: AtomicUsize::new(0),
        })
    }

    /// Load the pool from a TOML file. The first `[[credential]]` entry is
    /// the primary identity.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read credentials file {}: {e}", path.display()))
        })?;
        let file: PoolFile = toml::from_str(&raw).map_err(|e| {
            Error::Config(format!("bad credentials file {}: {e}", path.display()))
        })?;
        Self::new(
            file.credential
                .into_iter()
                .map(|c| Credential {
                    client_id: c.client_id,
                    client_secret: SecretString::from(c.client_secret),
                    owner_user_id: c.owner_user_id,
                })
                .collect(),
        )
    }

    /// Next credential by rotation. The counter only ever advances; the
    /// index wraps modulo pool size.
    pub fn next(&self) -> &Credential {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        &self.credentials[n % self.credentials.len()]
    }

    /// The primary identity.
    pub fn primary(&self) -> &Credential {
        &self.credentials[0]
    }

    /// Rotation-or-primary selection used by posting.
    pub fn select(&self, use_primary: bool) -> &Credential {
        if use_primary { self.primary() } else { self.next() }
    }

    pub fn all(&self) -> &[Credential] {
        &self.credentials
    }

    /// Platform user ids of every identity in the pool. Posts authored by
    /// these must never be treated as submissions.
    pub fn owner_ids(&self) -> HashSet<String> {
        self.credentials
            .iter()
            .map(|c| c.owner_user_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
