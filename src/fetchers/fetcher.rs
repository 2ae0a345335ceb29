use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// A fetched document with its response status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level fetch failure
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Network(String),
}

// Base trait for anything that can retrieve a single document
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` once, giving up after `timeout`.
    ///
    /// Non-2xx responses are returned as pages; callers decide what they mean.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError>;
}
