use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Index not ready: no index has been built or loaded")]
    NotReady,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Length mismatch: {vectors} vectors but {metadata} metadata entries")]
    LengthMismatch { vectors: usize, metadata: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("Tool '{0}' not ready. Index may not be loaded.")]
    ToolNotReady(String),

    /// Network failure talking to an upstream service. `status` is set when
    /// the upstream answered with a non-success HTTP status.
    #[error("Upstream transport error{}: {message}", status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    UpstreamTransport { status: Option<u16>, message: String },

    #[error("Upstream protocol error: {0}")]
    UpstreamProtocol(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::UpstreamTransport { status: None, message: message.into() }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::UpstreamTransport { status: Some(status), message: message.into() }
    }

    /// Only server-side (5xx) answers are retried; connection failures and
    /// client errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamTransport { status: Some(s), .. } if (500..600).contains(s))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
