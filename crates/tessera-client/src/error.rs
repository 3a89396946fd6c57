use std::fmt;

/// Which budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// A single HTTP request exceeded its own timeout.
    Request,
    /// The overall budget of a multi-request operation is spent.
    GeneralMethod,
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutKind::Request => write!(f, "request"),
            TimeoutKind::GeneralMethod => write!(f, "general method"),
        }
    }
}

/// Hard failures at the command-execution boundary.
///
/// Soft (application-level) errors never surface here; they travel inside
/// the response envelope.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("http error {status}: {body}")]
    Http {
        status: http::StatusCode,
        body: String,
    },

    #[error("{kind} timeout of {timeout_ms}ms exceeded")]
    Timeout { kind: TimeoutKind, timeout_ms: u64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout { .. })
    }
}
