//! Authentication module for verifying credentials and gating pages.
//!
//! This module provides:
//! - `hash`: salted SHA-256 digests, hex encoded
//! - `CredentialVerifier`: matches digests against the credential sheet
//! - `SessionMarker` / `SessionStore`: the persisted logged-in flag
//! - `SessionGate`: login, logout and per-page access checks
//!
//! The sheet is fetched once per verifier; a failed fetch leaves the
//! verifier in a degraded state where every login is refused.

pub mod gate;
pub mod hashing;
pub mod session;
pub mod verifier;

pub use gate::{page_name, GateDecision, LoginOutcome, SessionGate};
pub use hashing::{hash, DigestAlgorithm, DIGEST_HEX_LEN};
pub use session::{FileStore, MemoryStore, SessionMarker, SessionStore};
pub use verifier::{CredentialVerifier, LoadedTable, RejectReason, TableState, VerifyOutcome};
