//! HTTP retrieval of a single remote collection.

use crate::error::FetchError;
use crate::models::Resource;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("postjoin/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Downloads JSON arrays from the remote endpoints.
///
/// Cloning is cheap: clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    http_client: reqwest::Client,
    timeout_seconds: u64,
}

impl Fetcher {
    /// Create a fetcher with the given timeout and user agent.
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http_client,
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Fetch `url` and decode its body as a JSON array of `T`, keeping
    /// the order the endpoint returned.
    pub async fn fetch_collection<T>(
        &self,
        resource: Resource,
        url: &str,
    ) -> Result<Vec<T>, FetchError>
    where
        T: DeserializeOwned,
    {
        debug!("Requesting {} from {}", resource, url);

        let request_error = |source: reqwest::Error| {
            if source.is_timeout() {
                FetchError::Timeout {
                    resource,
                    url: url.to_string(),
                    seconds: self.timeout_seconds,
                    source,
                }
            } else {
                FetchError::Request {
                    resource,
                    url: url.to_string(),
                    source,
                }
            }
        };

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                resource,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(request_error)?;

        let items: Vec<T> =
            serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
                resource,
                url: url.to_string(),
                source,
            })?;

        info!("Fetched {} {} ({} bytes)", items.len(), resource, body.len());
        Ok(items)
    }
}
