//! Outbound page fetching.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};

/// Knobs for the outbound fetch client. Built once at startup and passed in;
/// the timeout is the only budget applied to a fetch.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("linkhold/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Fetches page bodies (to allow mocking in tests).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and read at most `limit` bytes of the response body.
    ///
    /// Only transport-level failures are errors; non-2xx responses are read
    /// like any other (error pages have titles too).
    async fn fetch_prefix(&self, url: &str, limit: usize) -> Result<Bytes>;
}

/// [`PageFetcher`] backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_prefix(&self, url: &str, limit: usize) -> Result<Bytes> {
        let mut response = self.client.get(url).send().await?;

        let mut buf = BytesMut::with_capacity(limit.min(16 * 1024));
        while let Some(chunk) = response.chunk().await? {
            let remaining = limit - buf.len();
            if chunk.len() >= remaining {
                buf.extend_from_slice(&chunk[..remaining]);
                break;
            }
            buf.extend_from_slice(&chunk);
        }

        // Dropping the response here releases the connection without
        // draining whatever the server still wants to send.
        Ok(buf.freeze())
    }
}
