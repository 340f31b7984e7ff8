use thiserror::Error;

/// Every failure a gateway operation can surface.
///
/// Callers are expected to branch on the variant rather than on the
/// rendered message. Only [`Unreachable`](GatewayError::Unreachable) and
/// [`Timeout`](GatewayError::Timeout) are transient; see
/// [`is_retryable`](GatewayError::is_retryable).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Transport error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Remote error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("Store rejected request: {0}")]
    StoreRejected(String),

    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Invalid content id: {0}")]
    InvalidContentId(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A fan-out task panicked or was aborted before producing a result.
    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("Client shut down")]
    Shutdown,
}

impl GatewayError {
    /// Whether the failure is transient and worth one more attempt.
    ///
    /// Decode and protocol failures are permanent: a second attempt would
    /// hit the same contract mismatch or the same remote-side error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Unreachable(_) | GatewayError::Timeout(_))
    }

    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        GatewayError::Transport {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by a transport failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::MalformedResponse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
