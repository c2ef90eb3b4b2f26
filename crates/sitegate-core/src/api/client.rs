//! HTTP client for the published credential sheet.
//!
//! This module provides the `CredentialSource` trait the verifier fetches
//! through, the `SheetClient` that implements it over HTTP, and an
//! in-memory `StaticSource`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

use super::SourceError;
use crate::config::Config;
use crate::models::{CredentialRecord, GvizResponse};

/// HTTP request timeout in seconds.
/// Sheets usually answer in well under a second; 30s covers cold starts.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Anything the verifier can load credential records from.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Fetch every record, in source order.
    async fn fetch_records(&self) -> Result<Vec<CredentialRecord>, SourceError>;
}

/// Client for a published credential sheet.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct SheetClient {
    client: Client,
    url: String,
}

impl SheetClient {
    /// Create a new sheet client with the default timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_timeout(
            config.sheet_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SourceError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl CredentialSource for SheetClient {
    fn name(&self) -> &'static str {
        "sheet"
    }

    async fn fetch_records(&self) -> Result<Vec<CredentialRecord>, SourceError> {
        if self.url.trim().is_empty() {
            return Err(SourceError::NotConfigured);
        }

        let response = self
            .client
            .get(&self.url)
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        debug!(bytes = text.len(), "Credential sheet response received");

        GvizResponse::parse(&text)?.into_records()
    }
}

/// In-memory credential source.
/// Counts fetches so callers can observe caching.
#[derive(Debug, Default)]
pub struct StaticSource {
    records: Vec<CredentialRecord>,
    failure: Option<String>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(records: Vec<CredentialRecord>) -> Self {
        Self {
            records,
            failure: None,
            fetches: AtomicUsize::new(0),
        }
    }

    /// A source whose every fetch fails with the given reason
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            failure: Some(reason.into()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_records(&self) -> Result<Vec<CredentialRecord>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(reason) => Err(SourceError::InvalidResponse(reason.clone())),
            None => Ok(self.records.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a local port, returning its URL.
    async fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("Failed to accept");
            let mut buf = vec![0u8; 4096];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}/gviz/tq", addr)
    }

    #[tokio::test]
    async fn test_sheet_client_parses_envelope() {
        let body = r#"/*O_o*/
google.visualization.Query.setResponse({"status":"ok","table":{"rows":[{"c":[{"v":"Date(2024,0,1)"},{"v":"ab12"},{"v":"cd34"},{"v":"admin"}]}]}});"#;
        let url = serve_once("200 OK", body.to_string()).await;

        let client = SheetClient::new(url).expect("Failed to build client");
        let records = client.fetch_records().await.expect("Fetch should succeed");
        assert_eq!(records, vec![CredentialRecord::new("ab12", "cd34", "admin")]);
    }

    #[tokio::test]
    async fn test_sheet_client_maps_status() {
        let url = serve_once("404 Not Found", "no such sheet".to_string()).await;

        let client = SheetClient::new(url).expect("Failed to build client");
        let err = client.fetch_records().await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(ref body) if body == "no such sheet"));
    }

    #[tokio::test]
    async fn test_sheet_client_unconfigured() {
        let client = SheetClient::new("  ").expect("Failed to build client");
        assert!(matches!(
            client.fetch_records().await,
            Err(SourceError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_sheet_client_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = SheetClient::with_timeout(format!("http://{}/", addr), Duration::from_secs(5))
            .expect("Failed to build client");
        assert!(matches!(
            client.fetch_records().await,
            Err(SourceError::NetworkError(_))
        ));
    }

    #[tokio::test]
    async fn test_static_source_counts_fetches() {
        let source = StaticSource::new(vec![CredentialRecord::new("a", "b", "user")]);
        assert_eq!(source.fetch_count(), 0);
        assert_eq!(source.fetch_records().await.unwrap().len(), 1);
        assert_eq!(source.fetch_records().await.unwrap().len(), 1);
        assert_eq!(source.fetch_count(), 2);

        let broken = StaticSource::unavailable("offline");
        assert!(broken.fetch_records().await.is_err());
        assert_eq!(broken.fetch_count(), 1);
    }
}
