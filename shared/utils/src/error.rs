use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failure to retrieve the bulletin from upstream.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Failed to connect to {url}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream {url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { url: url.to_string() }
        } else if err.is_connect() {
            Self::Connect {
                url: url.to_string(),
                source: err,
            }
        } else if let Some(status) = err.status() {
            Self::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// The downloaded bytes could not be turned into text.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Document is empty")]
    Empty,

    #[error("Document is not a PDF (content type {content_type:?})")]
    NotPdf { content_type: Option<String> },

    #[error("Failed to decode PDF: {message}")]
    Decode { message: String },

    #[error("PDF contains no extractable text")]
    NoText,

    #[error("Extraction aborted: {message}")]
    Aborted { message: String },
}

/// The text did not contain anything the bulletin grammar recognises.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("No measurement records found ({lines_scanned} lines scanned, {lines_skipped} skipped)")]
    NoRecords {
        lines_scanned: usize,
        lines_skipped: usize,
    },
}

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Fetch,
    Extract,
    Parse,
    Run,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Extract => write!(f, "extract"),
            Self::Parse => write!(f, "parse"),
            Self::Run => write!(f, "run"),
        }
    }
}

/// Any failure of a single pipeline run. Recovered by the scheduler.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Pipeline run exceeded {}s and was abandoned", .0.as_secs())]
    Timeout(Duration),
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Fetch(_) => PipelineStage::Fetch,
            Self::Extraction(_) => PipelineStage::Extract,
            Self::Parse(_) => PipelineStage::Parse,
            Self::Timeout(_) => PipelineStage::Run,
        }
    }
}

/// Service-level errors surfaced to API callers or at startup.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CoteError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl CoteError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Configuration { .. } => 500,
            Self::NotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }
}

pub type CoteResult<T> = Result<T, CoteError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<CoteError> for ErrorResponse {
    fn from(error: CoteError) -> Self {
        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

impl From<regex::Error> for CoteError {
    fn from(error: regex::Error) -> Self {
        Self::configuration(format!("invalid line pattern: {}", error))
    }
}
