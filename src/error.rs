//! error types, one enum per concern.
//!
//! controllers map these onto the three user-facing classes: validation
//! (never leaves the page), server (non-success response) and connectivity
//! (the request did not complete).

/// a request that could not complete.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unreadable response body: {0}")]
    Body(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("failed to write '{key}': {reason}")]
    Write { key: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid client config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoginError {
    #[error("{0} is required")]
    Validation(&'static str),
    #[error("a login request is already pending")]
    InProgress,
    /// non-success response; `None` when the body carried no `error` text.
    #[error("login rejected: {}", .0.as_deref().unwrap_or("<no message>"))]
    Server(Option<String>),
    #[error("login request failed: {0}")]
    Connectivity(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<TransportError> for LoginError {
    fn from(err: TransportError) -> Self {
        LoginError::Connectivity(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("no active session")]
    NoSession,
    #[error("a chat turn is already in flight")]
    TurnInFlight,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChartError {
    #[error("chart canvas not available: {0}")]
    Canvas(String),
    #[error("chart construction failed: {0}")]
    Construct(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    #[error("metrics rejected: {}", .0.as_deref().unwrap_or("<no message>"))]
    Server(Option<String>),
    #[error("metrics request failed: {0}")]
    Connectivity(#[from] TransportError),
    #[error("metrics payload did not decode: {0}")]
    Decode(String),
    #[error(transparent)]
    Chart(#[from] ChartError),
}
