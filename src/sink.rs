//! External persistence for finished analyses.
//!
//! Writes are best effort. The pipeline logs a failed store and still
//! returns the analysis to its caller.

use crate::config::Persistence;
use crate::results::Analysis;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on a single insert request
const STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("store rejected insert with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Receives every assembled analysis
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    async fn store(&self, analysis: &Analysis) -> Result<(), SinkError>;
}

/// Sink used when persistence is disabled
pub struct NoopSink;

#[async_trait]
impl AnalysisSink for NoopSink {
    async fn store(&self, _analysis: &Analysis) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Serialize)]
struct InsertRow<'a> {
    url: &'a str,
    data: &'a Analysis,
}

/// Inserts analyses as rows through a PostgREST-style endpoint
pub struct RestSink {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestSink {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(STORE_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisSink for RestSink {
    async fn store(&self, analysis: &Analysis) -> Result<(), SinkError> {
        let rows = [InsertRow {
            url: analysis.url(),
            data: analysis,
        }];

        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        ::log::debug!("stored analysis of {} in {}", analysis.url(), self.endpoint);
        Ok(())
    }
}

/// Builds the sink matching the resolved persistence capability
pub fn sink_for(
    persistence: &Persistence,
) -> Result<Arc<dyn AnalysisSink>, reqwest::Error> {
    Ok(match persistence {
        Persistence::Enabled {
            base_url,
            api_key,
            table,
        } => Arc::new(RestSink::new(base_url, api_key, table)?),
        Persistence::Disabled => Arc::new(NoopSink),
    })
}
