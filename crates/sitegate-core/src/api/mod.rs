//! Client module for the credential spreadsheet.
//!
//! This module provides the `CredentialSource` seam and the `SheetClient`
//! that fetches the published credential sheet over HTTP.
//!
//! The sheet is served as a Google Visualization query response: a JSON
//! body wrapped in a JavaScript callback that is stripped before parsing.

pub mod client;
pub mod error;

pub use client::{CredentialSource, SheetClient, StaticSource};
pub use error::SourceError;
