// # HTTP transport
//
// The import pipeline only needs "GET a URL as text". Everything it fetches goes
// through the `Fetcher` trait so sources can be exercised against canned payloads.

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Cause of a failed unit of import work
#[derive(Error, Debug)]
pub enum ImportCause {
    #[error("HTTP request failed: {0}")]
    Network(String),
    #[error("Unexpected payload: {0}")]
    Parse(String),
    #[error("Cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    FileSystem(#[from] std::io::Error),
}

impl From<serde_json::Error> for ImportCause {
    fn from(e: serde_json::Error) -> Self {
        ImportCause::Parse(e.to_string())
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the response body
    async fn get_text(&self, url: &str) -> Result<String, ImportCause>;
}

/// GET `url` and deserialize the body as JSON
pub async fn get_json<T: DeserializeOwned>(
    fetcher: &dyn Fetcher,
    url: &str,
) -> Result<T, ImportCause> {
    let body = fetcher.get_text(url).await?;
    serde_json::from_str(&body)
        .map_err(|e| ImportCause::Parse(format!("Invalid JSON from {}: {}", url, e)))
}

const USER_AGENT: &str = concat!("champ-r/", env!("CARGO_PKG_VERSION"));

/// `Fetcher` backed by a shared reqwest client
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ImportCause> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ImportCause::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String, ImportCause> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImportCause::Network(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} returned status {}", url, status);
            return Err(ImportCause::Network(format!(
                "{} returned status {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ImportCause::Network(format!("Failed to read body of {}: {}", url, e)))
    }
}
