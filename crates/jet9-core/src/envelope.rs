//! Request and response envelopes and their JSON codec.
//!
//! Decoding is two-step: the raw JSON is parsed into a mapping, every
//! mandatory key is checked in declared order (the first absent key is
//! reported), and only then are the values type-checked.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::{EnvelopeError, ERROR_THRESHOLD};

/// Mandatory request keys, in check order.
pub const REQUEST_KEYS: [&str; 4] = ["uuid", "timestamp", "action", "params"];

/// Mandatory response keys, in check order.
pub const RESPONSE_KEYS: [&str; 6] = ["version", "uuid", "timestamp", "result", "code", "error"];

/// Generate a fresh envelope identifier.
pub fn new_uuid() -> String {
    Uuid::now_v7().to_string()
}

/// Current UTC time as an ISO-8601 string.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Return the first key of `keys` absent from `map`.
pub fn first_missing_key(map: &Map<String, Value>, keys: &[&'static str]) -> Option<&'static str> {
    keys.iter().copied().find(|key| !map.contains_key(*key))
}

/// Inbound action invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Caller-supplied request identifier.
    pub uuid: String,
    /// Caller-supplied ISO-8601 timestamp.
    pub timestamp: String,
    /// Name of the action to invoke.
    pub action: String,
    /// Action parameters.
    pub params: Map<String, Value>,
    /// Opaque auth token; carried as sent, never validated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authtoken: Option<Value>,
    /// Any other top-level keys, passed through to the handler untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestEnvelope {
    /// Build a request with a fresh uuid and the current timestamp.
    pub fn new(action: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            uuid: new_uuid(),
            timestamp: now_timestamp(),
            action: action.into(),
            params,
            authtoken: None,
            extra: Map::new(),
        }
    }

    /// Attach an auth token.
    #[must_use]
    pub fn with_authtoken(mut self, authtoken: impl Into<String>) -> Self {
        self.authtoken = Some(Value::String(authtoken.into()));
        self
    }

    /// The auth token, when it was sent as a string.
    pub fn authtoken_str(&self) -> Option<&str> {
        self.authtoken.as_ref().and_then(Value::as_str)
    }

    /// The request as a JSON mapping.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Error payload of a failed response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub message: String,
    /// Any extra keys sent alongside `message`.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ErrorBody {
    /// Error body carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Map::new(),
        }
    }
}

/// Outbound response, as written by the server and parsed by the client.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    /// Fresh identifier generated per response.
    pub uuid: String,
    /// Handler version tag.
    pub version: String,
    /// Generation time.
    pub timestamp: String,
    /// Protocol status; `< 300` is success.
    pub code: u16,
    /// Success payload.
    pub result: Option<Map<String, Value>>,
    /// Failure payload.
    pub error: Option<ErrorBody>,
    #[serde(skip)]
    raw: Option<String>,
}

impl ResponseEnvelope {
    /// Assemble an envelope from its parts.
    pub fn new(
        uuid: String,
        version: String,
        timestamp: String,
        code: u16,
        result: Option<Map<String, Value>>,
        error: Option<ErrorBody>,
    ) -> Self {
        Self {
            uuid,
            version,
            timestamp,
            code,
            result,
            error,
            raw: None,
        }
    }

    /// True iff `code >= 300` and an error payload is present.
    pub fn is_error(&self) -> bool {
        self.code >= ERROR_THRESHOLD && self.error.is_some()
    }

    /// True iff `code < 300` and a result payload is present.
    pub fn is_success(&self) -> bool {
        self.code < ERROR_THRESHOLD && self.result.is_some()
    }

    /// Error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// Raw text this envelope was decoded from, if it came off the wire.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl fmt::Display for ResponseEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => f.write_str(raw),
            None => f.write_str(&serde_json::to_string(self).map_err(|_| fmt::Error)?),
        }
    }
}

// ── Codec ───────────────────────────────────────────────────────────

/// Decode an inbound request body.
pub fn decode_request(raw: &[u8]) -> Result<RequestEnvelope, EnvelopeError> {
    let value: Value = serde_json::from_slice(raw)?;
    let mut map = into_object(value, "request is not a JSON object")?;

    if let Some(key) = first_missing_key(&map, &REQUEST_KEYS) {
        return Err(EnvelopeError::MissingField { key });
    }

    let uuid = take_string(&mut map, "uuid")?;
    let timestamp = take_string(&mut map, "timestamp")?;
    let action = take_string(&mut map, "action")?;
    let params = match map.remove("params") {
        Some(Value::Object(params)) => params,
        _ => {
            return Err(EnvelopeError::InvalidField {
                field: "params",
                expected: "an object",
            });
        }
    };
    let authtoken = map.remove("authtoken").filter(|token| !token.is_null());

    Ok(RequestEnvelope {
        uuid,
        timestamp,
        action,
        params,
        authtoken,
        extra: map,
    })
}

/// Decode a response from its raw JSON text.
pub fn decode_response(raw: &str) -> Result<ResponseEnvelope, EnvelopeError> {
    let value: Value = serde_json::from_str(raw)?;
    let mut envelope = decode_response_value(value)?;
    envelope.raw = Some(raw.to_owned());
    Ok(envelope)
}

/// Decode a response from an already-parsed JSON value.
pub fn decode_response_value(value: Value) -> Result<ResponseEnvelope, EnvelopeError> {
    let mut map = into_object(value, "response is not a JSON object")?;

    if let Some(key) = first_missing_key(&map, &RESPONSE_KEYS) {
        return Err(EnvelopeError::MissingField { key });
    }

    let version = take_string(&mut map, "version")?;
    let uuid = take_string(&mut map, "uuid")?;
    let timestamp = take_string(&mut map, "timestamp")?;
    let code = map
        .remove("code")
        .and_then(|v| v.as_u64())
        .and_then(|n| u16::try_from(n).ok())
        .ok_or(EnvelopeError::InvalidField {
            field: "code",
            expected: "an integer status code",
        })?;
    let result = match map.remove("result") {
        Some(Value::Null) => None,
        Some(Value::Object(result)) => Some(result),
        _ => {
            return Err(EnvelopeError::InvalidField {
                field: "result",
                expected: "an object or null",
            });
        }
    };
    let error = match map.remove("error") {
        Some(Value::Null) => None,
        Some(body @ Value::Object(_)) => Some(serde_json::from_value::<ErrorBody>(body).map_err(
            |_| EnvelopeError::InvalidField {
                field: "error",
                expected: "an object with a string message",
            },
        )?),
        _ => {
            return Err(EnvelopeError::InvalidField {
                field: "error",
                expected: "an object with a string message",
            });
        }
    };

    Ok(ResponseEnvelope::new(uuid, version, timestamp, code, result, error))
}

/// Serialize a request for the wire.
pub fn encode_request(request: &RequestEnvelope) -> Vec<u8> {
    serde_json::to_vec(request).unwrap_or_default()
}

/// Serialize a response for the wire.
pub fn encode_response(response: &ResponseEnvelope) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_default()
}

fn into_object(value: Value, reason: &str) -> Result<Map<String, Value>, EnvelopeError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(EnvelopeError::MalformedPayload {
            reason: reason.to_owned(),
        }),
    }
}

fn take_string(map: &mut Map<String, Value>, field: &'static str) -> Result<String, EnvelopeError> {
    match map.remove(field) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(EnvelopeError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}
