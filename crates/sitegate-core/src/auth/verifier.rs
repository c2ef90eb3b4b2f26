//! Salted-hash credential verification.
//!
//! `CredentialVerifier` owns the credential table state. The first call that
//! needs the table fetches it from the configured source; every later call
//! reuses that snapshot, including after a failed fetch.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use super::hashing::DigestAlgorithm;
use crate::api::CredentialSource;
use crate::config::Config;
use crate::models::CredentialTable;
use crate::utils::short_hash;

static NOT_LOADED: TableState = TableState::NotLoaded;
static EMPTY_TABLE: CredentialTable = CredentialTable::empty();

/// Why a login attempt was refused.
/// The display text is safe to show to the person logging in.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Secure hashing is not supported")]
    HashUnavailable,
}

impl RejectReason {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::HashUnavailable => "hash_unavailable",
        }
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Accepted { role: String, user_hash: String },
    Rejected(RejectReason),
}

impl VerifyOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn role(&self) -> Option<&str> {
        match self {
            Self::Accepted { role, .. } => Some(role),
            Self::Rejected(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTable {
    pub table: CredentialTable,
    pub loaded_at: DateTime<Utc>,
}

/// Lifecycle of the credential table. Moves out of `NotLoaded` once and never back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableState {
    NotLoaded,
    Loaded(LoadedTable),
    /// The fetch failed; the verifier behaves as if no accounts exist
    Failed(String),
}

impl TableState {
    /// Records to match against. Failed and unloaded states have none.
    pub fn table(&self) -> &CredentialTable {
        match self {
            Self::Loaded(loaded) => &loaded.table,
            Self::NotLoaded | Self::Failed(_) => &EMPTY_TABLE,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

pub struct CredentialVerifier<S> {
    source: S,
    salt: String,
    algorithm: Option<DigestAlgorithm>,
    state: OnceCell<TableState>,
}

impl<S: CredentialSource> CredentialVerifier<S> {
    /// Create a verifier hashing with SHA-256
    pub fn new(source: S, salt: impl Into<String>) -> Self {
        Self {
            source,
            salt: salt.into(),
            algorithm: Some(DigestAlgorithm::Sha256),
            state: OnceCell::new(),
        }
    }

    pub fn from_config(source: S, config: &Config) -> Self {
        let algorithm = DigestAlgorithm::from_name(&config.hash_algorithm);
        if algorithm.is_none() {
            warn!(algorithm = %config.hash_algorithm, "Unsupported hash algorithm configured");
        }
        Self {
            source,
            salt: config.salt.clone(),
            algorithm,
            state: OnceCell::new(),
        }
    }

    /// Replace the digest primitive. `None` makes hashing unavailable.
    pub fn with_algorithm(mut self, algorithm: Option<DigestAlgorithm>) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current table state without triggering a fetch
    pub fn table_state(&self) -> &TableState {
        self.state.get().unwrap_or(&NOT_LOADED)
    }

    pub fn is_degraded(&self) -> bool {
        self.table_state().is_degraded()
    }

    /// Fetch the table if no fetch has happened yet and return the resulting state.
    /// Concurrent callers share one fetch.
    pub async fn initialize(&self) -> &TableState {
        self.state
            .get_or_init(|| async {
                match self.source.fetch_records().await {
                    Ok(records) => {
                        info!(source = self.source.name(), records = records.len(), "Credential table loaded");
                        TableState::Loaded(LoadedTable {
                            table: CredentialTable::new(records),
                            loaded_at: Utc::now(),
                        })
                    }
                    Err(e) => {
                        error!(source = self.source.name(), error = %e, "Failed to load credential table");
                        TableState::Failed(e.to_string())
                    }
                }
            })
            .await
    }

    /// The cached table, loading it first if needed. Empty after a failed load.
    pub async fn load_table(&self) -> &CredentialTable {
        self.initialize().await.table()
    }

    /// Salted digest with the configured primitive, `None` if it is unavailable
    pub fn hash(&self, input: &str) -> Option<String> {
        self.algorithm.map(|alg| alg.digest(input, &self.salt))
    }

    /// Digest of a username as `verify` computes it: surrounding whitespace is dropped
    pub fn username_hash(&self, username: &str) -> Option<String> {
        self.hash(username.trim())
    }

    pub async fn verify(&self, username: &str, password: &str) -> VerifyOutcome {
        if username.trim().is_empty() || password.is_empty() {
            debug!("Rejecting login with empty username or password");
            return VerifyOutcome::Rejected(RejectReason::InvalidCredentials);
        }

        let (Some(user_hash), Some(pass_hash)) = (self.username_hash(username), self.hash(password)) else {
            warn!("Hash primitive unavailable, cannot verify credentials");
            return VerifyOutcome::Rejected(RejectReason::HashUnavailable);
        };

        let table = self.load_table().await;
        match table.find_match(&user_hash, &pass_hash) {
            Some(record) => {
                info!(user = %short_hash(&user_hash), role = %record.role, "Credentials verified");
                VerifyOutcome::Accepted {
                    role: record.role.clone(),
                    user_hash,
                }
            }
            None => {
                debug!(user = %short_hash(&user_hash), records = table.len(), "No matching credential record");
                VerifyOutcome::Rejected(RejectReason::InvalidCredentials)
            }
        }
    }
}
