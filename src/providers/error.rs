//! Error types for answer and suggestion providers.

use thiserror::Error;

/// Errors raised by an external provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP transport failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("provider returned HTTP status {0}")]
    Status(u16),

    /// Upstream payload could not be interpreted.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Reported confidence is not a probability.
    #[error("confidence {0} is outside [0, 1]")]
    InvalidConfidence(f64),

    /// Provider cannot serve requests right now.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Check if the failure came from the network or the upstream server.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status(_))
    }
}

/// Convenience result alias for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;
