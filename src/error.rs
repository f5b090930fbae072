use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be set")]
    Missing { key: &'static str },

    #[error("Invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Failed to read configuration file {path}: {message}")]
    File { path: String, message: String },
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed for {url}: HTTP {status}")]
    Authentication { url: String, status: u16 },

    #[error("Resource not found: {url}")]
    NotFound { url: String },

    #[error("Transient failure for {url}: {message}")]
    Transient {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Unexpected HTTP {status} from {url}: {body}")]
    UnexpectedStatus { url: String, status: u16, body: String },

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

/// Serializable classification of an [`ApiError`], used in recorded failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    AuthenticationError,
    NotFoundError,
    TransientError,
    HttpError,
    InvalidResponse,
    NotReady,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Authentication { .. } => ErrorKind::AuthenticationError,
            ApiError::NotFound { .. } => ErrorKind::NotFoundError,
            ApiError::Transient { .. } => ErrorKind::TransientError,
            ApiError::UnexpectedStatus { .. } => ErrorKind::HttpError,
            ApiError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authentication { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Transient { status, .. } => *status,
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::InvalidResponse { .. } => None,
        }
    }

    /// Authentication failures on the control plane end the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Authentication { .. })
    }
}

/// Errors that abort a collection run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}
