use crate::error::AnalysisError;
use std::fmt;
use url::Url;

/// A validated absolute http(s) URL to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    url: Url,
}

impl PageTarget {
    /// Validates a caller-supplied URL; no network access happens here
    pub fn parse(raw: &str) -> Result<Self, AnalysisError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AnalysisError::MissingUrl);
        }

        let url = Url::parse(raw).map_err(|e| AnalysisError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(AnalysisError::InvalidUrl {
                    url: raw.to_string(),
                    reason: format!("unsupported scheme {}", other),
                });
            }
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(AnalysisError::InvalidUrl {
                url: raw.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Location of the robots policy for this target's origin
    pub fn robots_url(&self) -> String {
        format!("{}/robots.txt", self.url.origin().ascii_serialization())
    }
}

impl fmt::Display for PageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}
