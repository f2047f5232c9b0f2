//! Envelope error type and protocol status codes.

// ── Status code constants ───────────────────────────────────────────

/// Default success code.
pub const OK: u16 = 200;
/// Lowest code treated as an error; everything below is a success.
pub const ERROR_THRESHOLD: u16 = 300;
/// Request envelope could not be decoded.
pub const BAD_REQUEST: u16 = 400;
/// Action not registered on the subsystem.
pub const NOT_FOUND: u16 = 404;
/// Handler misbehaved or failed unexpectedly.
pub const INTERNAL_ERROR: u16 = 500;

/// Whether a protocol status code denotes success.
pub fn is_success_code(code: u16) -> bool {
    code < ERROR_THRESHOLD
}

/// Failure to decode or validate an envelope.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// Body is not JSON, or not a JSON object.
    #[error("payload is not a valid JSON object: {reason}")]
    MalformedPayload {
        /// Parser or shape diagnostic.
        reason: String,
    },

    /// A mandatory envelope key is absent.
    #[error("mandatory key [{key}] not found")]
    MissingField {
        /// First missing key, in declared key order.
        key: &'static str,
    },

    /// A mandatory key is present but holds the wrong JSON type.
    #[error("key [{field}] must be {expected}")]
    InvalidField {
        /// Offending key.
        field: &'static str,
        /// What the key should have held.
        expected: &'static str,
    },
}

impl EnvelopeError {
    /// Protocol status used when this error is answered with an envelope.
    pub fn status(&self) -> u16 {
        BAD_REQUEST
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedPayload { .. } => "malformed_payload",
            Self::MissingField { .. } => "missing_field",
            Self::InvalidField { .. } => "invalid_field",
        }
    }
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload {
            reason: err.to_string(),
        }
    }
}
