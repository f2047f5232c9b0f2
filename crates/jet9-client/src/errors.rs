//! Client error type.

use jet9_core::EnvelopeError;

/// Failure to obtain a response envelope.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Host is not an `http://` or `https://` URL.
    #[error("invalid host '{host}': should be http(s)://")]
    InvalidHost {
        /// Rejected host string.
        host: String,
    },

    /// Connection, TLS, or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx reply whose body is not an envelope.
    #[error("unexpected HTTP status {status}: {source}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Why the body could not be decoded.
        #[source]
        source: EnvelopeError,
    },

    /// 2xx reply whose body is not a valid envelope.
    #[error("can't convert response: {0}")]
    Envelope(#[from] EnvelopeError),
}

impl ClientError {
    /// Whether the failure happened below the envelope layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::UnexpectedStatus { .. })
    }

    /// Whether the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}
