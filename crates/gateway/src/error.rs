//! Gateway error types.

use thiserror::Error;

/// Errors returned by gateway clients.
///
/// These are boundary errors: they abort whatever operation issued the
/// request and are never folded into handler failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The gateway rejected the request (HTTP 4xx).
    ///
    /// The message is built from the gateway's `error.cause` and
    /// `error.explanation` fields.
    #[error("Gateway rejected request ({status}): {message}")]
    Client { status: u16, message: String },

    /// The gateway failed or answered with something that is not JSON.
    #[error("Gateway server error: {message}")]
    Server { status: Option<u16>, message: String },

    /// The request never got a response.
    #[error("Gateway transport error: {0}")]
    Transport(String),

    /// The response was JSON but not the document we expected.
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Client { .. } => "client",
            GatewayError::Server { .. } => "server",
            GatewayError::Transport(_) => "transport",
            GatewayError::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Transport(e.to_string())
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
