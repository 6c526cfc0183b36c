//! The one outbound I/O capability: fetching the bytes behind a URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::TransportError;

const DID_JSON_ACCEPT: &str = "application/did+json, application/json";

/// Retrieves a document over the network.
///
/// Implementations should honour `timeout`; callers additionally bound the
/// returned future, so an implementation that ignores it cannot hang them.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &Url, timeout: Duration) -> Result<Vec<u8>, TransportError>;
}

/// HTTP GET via `reqwest`
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    /// HTTP client for fetching DID documents
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Uses a preconfigured client, e.g. one with a proxy or custom roots.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &Url, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, DID_JSON_ACCEPT)
            .timeout(timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(TransportError::NotFound),
            status if !status.is_success() => {
                tracing::trace!(%url, %status, "unsuccessful response");
                return Err(TransportError::Status(status.as_u16()));
            }
            _ => {}
        }

        Ok(response.bytes().await?.to_vec())
    }
}
