use thiserror::Error;

/// Failure taxonomy for one client operation. Every error is terminal for
/// the operation that raised it; the controller stays usable afterwards.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Caught locally before any request is issued.
    #[error("{0}")]
    Validation(String),
    /// Service unreachable or the response body could not be decoded.
    #[error("service unreachable: {0}")]
    Transport(String),
    /// Non-success status from the repository service.
    #[error("{message}")]
    Service { status: u16, message: String },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
