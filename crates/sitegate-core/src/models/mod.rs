//! Data models for the credential sheet.
//!
//! - `CredentialRecord`, `CredentialTable`: the parsed credential snapshot
//! - `GvizResponse`: the raw Google Visualization response the sheet is served as

pub mod credential;
pub mod gviz;

pub use credential::{CredentialRecord, CredentialTable, DEFAULT_ROLE};
pub use gviz::GvizResponse;
