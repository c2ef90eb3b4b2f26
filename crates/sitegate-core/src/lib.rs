//! sitegate core - salted-hash page authentication for small static sites.
//!
//! Credentials live in a published spreadsheet as salted SHA-256 digests of
//! username and password, plus a role. The verifier fetches that sheet once,
//! compares digests, and the gate persists a session marker that every page
//! checks before rendering.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{CredentialSource, SheetClient, SourceError, StaticSource};
pub use auth::{
    CredentialVerifier, FileStore, GateDecision, LoginOutcome, MemoryStore, RejectReason,
    SessionGate, SessionMarker, SessionStore, TableState, VerifyOutcome,
};
pub use config::Config;
pub use models::{CredentialRecord, CredentialTable};
