//! Page gating on top of the verifier and a session store.

use anyhow::Result;
use tracing::{info, warn};

use super::session::{SessionMarker, SessionStore};
use super::verifier::{CredentialVerifier, RejectReason, VerifyOutcome};
use crate::api::CredentialSource;
use crate::config::{Config, DEFAULT_HOME_PAGE};
use crate::utils::short_hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success { role: String, redirect: String },
    Failure { reason: RejectReason, message: String },
}

/// What a page should do after checking the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Redirect(String),
}

/// Last path segment of a page path. The site root is the home page.
pub fn page_name(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_HOME_PAGE,
    }
}

pub struct SessionGate<S, T> {
    verifier: CredentialVerifier<S>,
    store: T,
    login_page: String,
    home_page: String,
}

impl<S: CredentialSource, T: SessionStore> SessionGate<S, T> {
    pub fn new(
        verifier: CredentialVerifier<S>,
        store: T,
        login_page: impl Into<String>,
        home_page: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            store,
            login_page: login_page.into(),
            home_page: home_page.into(),
        }
    }

    pub fn from_config(verifier: CredentialVerifier<S>, store: T, config: &Config) -> Self {
        Self::new(verifier, store, config.login_page.clone(), config.home_page.clone())
    }

    pub fn verifier(&self) -> &CredentialVerifier<S> {
        &self.verifier
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    pub fn login_page(&self) -> &str {
        &self.login_page
    }

    pub fn home_page(&self) -> &str {
        &self.home_page
    }

    /// Verify and, on success, persist the session marker
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        match self.verifier.verify(username, password).await {
            VerifyOutcome::Accepted { role, user_hash } => {
                SessionMarker::new(user_hash.clone(), role.clone()).write(&self.store)?;
                info!(user = %short_hash(&user_hash), role = %role, "Login successful");
                Ok(LoginOutcome::Success {
                    role,
                    redirect: self.home_page.clone(),
                })
            }
            VerifyOutcome::Rejected(reason) => {
                warn!(reason = reason.code(), degraded = self.verifier.is_degraded(), "Login failed");
                Ok(LoginOutcome::Failure {
                    reason,
                    message: reason.user_message(),
                })
            }
        }
    }

    /// Clear the session and return the page to send the visitor to
    pub fn logout(&self) -> Result<String> {
        SessionMarker::clear(&self.store)?;
        info!("Logged out");
        Ok(self.login_page.clone())
    }

    /// Current session, if any. Unreadable storage counts as logged out.
    pub fn current_session(&self) -> Option<SessionMarker> {
        match SessionMarker::read(&self.store) {
            Ok(marker) => marker,
            Err(e) => {
                warn!(error = %e, "Failed to read session, treating as logged out");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_session().is_some()
    }

    /// Decide whether the page at `current_path` may render
    pub fn check_auth(&self, current_path: &str) -> GateDecision {
        let on_login_page = page_name(current_path) == self.login_page;
        match (self.is_authenticated(), on_login_page) {
            (false, false) => GateDecision::Redirect(self.login_page.clone()),
            (true, true) => GateDecision::Redirect(self.home_page.clone()),
            _ => GateDecision::Proceed,
        }
    }

    /// Home page to jump to when already logged in
    pub fn redirect_if_authenticated(&self) -> Option<String> {
        self.is_authenticated().then(|| self.home_page.clone())
    }
}
