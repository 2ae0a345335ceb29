use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Broad class of a failure, used to pick the status a caller sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied a missing or malformed input
    Validation,
    /// Robots policy forbids the page
    Policy,
    /// Target page could not be retrieved
    UpstreamFetch,
    /// Bundle could not be produced
    Synthesis,
}

impl ErrorKind {
    /// HTTP status equivalent of this kind
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Policy => 403,
            ErrorKind::UpstreamFetch => 502,
            ErrorKind::Synthesis => 500,
        }
    }
}

/// Errors surfaced by the analysis pipeline
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("url required")]
    MissingUrl,

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("page disallowed by robots.txt: {url}")]
    DisallowedByRobots { url: String },

    #[error("failed to fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },
}

impl AnalysisError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::MissingUrl => "missing_url",
            AnalysisError::InvalidUrl { .. } => "invalid_url",
            AnalysisError::DisallowedByRobots { .. } => "disallowed_by_robots",
            AnalysisError::FetchFailed { .. } => "fetch_failed",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::MissingUrl | AnalysisError::InvalidUrl { .. } => ErrorKind::Validation,
            AnalysisError::DisallowedByRobots { .. } => ErrorKind::Policy,
            AnalysisError::FetchFailed { .. } => ErrorKind::UpstreamFetch,
        }
    }
}

/// Errors raised while building an export bundle
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("failed to read stylesheet {}: {source}", path.display())]
    Stylesheet {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid project: {0}")]
    InvalidProject(String),

    #[error("failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to write archive entry: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthesisError {
    pub fn code(&self) -> &'static str {
        match self {
            SynthesisError::InvalidProject(_) => "invalid_project",
            _ => "synthesis_failed",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SynthesisError::InvalidProject(_) => ErrorKind::Validation,
            _ => ErrorKind::Synthesis,
        }
    }
}

/// Structured error object returned to callers in place of a success payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code, e.g. `fetch_failed`
    pub error: String,
    /// Human-readable detail
    pub message: String,
}

impl From<&AnalysisError> for ErrorBody {
    fn from(err: &AnalysisError) -> Self {
        Self {
            error: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<&SynthesisError> for ErrorBody {
    fn from(err: &SynthesisError) -> Self {
        Self {
            error: err.code().to_string(),
            message: err.to_string(),
        }
    }
}
