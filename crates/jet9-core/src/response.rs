//! Response builder.
//!
//! Actions never hand raw values to the transport. They call [`build`] with
//! a status code and a JSON value, and get back a [`ResponseBody`] in which
//! exactly one of `result` / `error` is set, consistent with the code. A
//! value of the wrong shape for its code is downgraded to a `500` body.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::error;

use crate::envelope::{new_uuid, now_timestamp, ErrorBody, ResponseEnvelope};
use crate::errors::{ERROR_THRESHOLD, INTERNAL_ERROR};

/// Message used when a success code carries a non-mapping result.
pub const NON_MAPPING_RESULT: &str = "internal error: non-mapping result with success code";

/// Message used when an error code carries a non-string result.
pub const NON_STRING_ERROR: &str = "internal error: non-string error result";

/// Normalized `(code, result, error)` triple, before envelope enrichment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponseBody {
    code: u16,
    result: Option<Map<String, Value>>,
    error: Option<ErrorBody>,
}

/// Normalize a `(code, result)` pair into a response body.
///
/// - `code < 300` with an object: success body.
/// - `code >= 300` with a string: error body carrying that message.
/// - anything else: `500` error body with a fixed internal-error message.
pub fn build(code: u16, result: Value) -> ResponseBody {
    if code < ERROR_THRESHOLD {
        match result {
            Value::Object(map) => ResponseBody {
                code,
                result: Some(map),
                error: None,
            },
            other => {
                error!(
                    code,
                    result_type = json_type_name(&other),
                    "action returned a non-mapping result with a success code"
                );
                ResponseBody::internal(NON_MAPPING_RESULT)
            }
        }
    } else {
        match result {
            Value::String(message) => ResponseBody {
                code,
                result: None,
                error: Some(ErrorBody::new(message)),
            },
            other => {
                error!(
                    code,
                    result_type = json_type_name(&other),
                    "action returned a non-string result with an error code"
                );
                ResponseBody::internal(NON_STRING_ERROR)
            }
        }
    }
}

impl ResponseBody {
    /// Success body; same rules as [`build`].
    pub fn success(code: u16, result: Map<String, Value>) -> Self {
        build(code, Value::Object(result))
    }

    /// Error body; same rules as [`build`].
    pub fn failure(code: u16, message: impl Into<String>) -> Self {
        build(code, Value::String(message.into()))
    }

    /// `500` body with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: INTERNAL_ERROR,
            result: None,
            error: Some(ErrorBody::new(message)),
        }
    }

    /// Protocol status code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Success payload.
    pub fn result(&self) -> Option<&Map<String, Value>> {
        self.result.as_ref()
    }

    /// Failure payload.
    pub fn error(&self) -> Option<&ErrorBody> {
        self.error.as_ref()
    }

    /// Whether this body reports a failure.
    pub fn is_error(&self) -> bool {
        self.code >= ERROR_THRESHOLD
    }

    /// Stamp a fresh uuid, `version`, and the current time onto the body.
    pub fn into_envelope(self, version: &str) -> ResponseEnvelope {
        ResponseEnvelope::new(
            new_uuid(),
            version.to_owned(),
            now_timestamp(),
            self.code,
            self.result,
            self.error,
        )
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn as_json(body: &ResponseBody) -> Value {
        serde_json::to_value(body).unwrap()
    }

    #[test]
    fn success_with_mapping() {
        let body = build(200, json!({"x": 1}));
        assert_eq!(
            as_json(&body),
            json!({"code": 200, "result": {"x": 1}, "error": null})
        );
    }

    #[test]
    fn success_with_non_mapping_downgrades() {
        let body = build(200, json!("not a mapping"));
        assert_eq!(
            as_json(&body),
            json!({
                "code": 500,
                "error": {"message": "internal error: non-mapping result with success code"},
                "result": null
            })
        );
    }

    #[test]
    fn error_with_string() {
        let body = build(400, json!("bad domain"));
        assert_eq!(
            as_json(&body),
            json!({"code": 400, "error": {"message": "bad domain"}, "result": null})
        );
    }

    #[test]
    fn error_with_mapping_downgrades() {
        let body = build(400, json!({"x": 1}));
        assert_eq!(
            as_json(&body),
            json!({
                "code": 500,
                "error": {"message": "internal error: non-string error result"},
                "result": null
            })
        );
    }

    #[test]
    fn custom_success_code_is_kept() {
        let body = build(210, json!({"dns:request": {}}));
        assert_eq!(body.code(), 210);
        assert!(!body.is_error());
    }

    #[test]
    fn success_constructor_with_error_code_downgrades() {
        let body = ResponseBody::success(404, Map::new());
        assert_eq!(body.code(), INTERNAL_ERROR);
        assert_eq!(body.error().unwrap().message, NON_STRING_ERROR);
    }

    #[test]
    fn failure_constructor_with_success_code_downgrades() {
        let body = ResponseBody::failure(200, "oops");
        assert_eq!(body.code(), INTERNAL_ERROR);
        assert_eq!(body.error().unwrap().message, NON_MAPPING_RESULT);
    }

    #[test]
    fn envelope_enrichment_applies_to_downgrades() {
        let env = build(200, json!(42)).into_envelope("1.0");
        assert_eq!(env.code, 500);
        assert_eq!(env.version, "1.0");
        assert!(!env.uuid.is_empty());
        assert!(!env.timestamp.is_empty());
        assert!(env.is_error());
    }

    #[test]
    fn each_envelope_gets_a_fresh_uuid() {
        let a = build(200, json!({})).into_envelope("1.0");
        let b = build(200, json!({})).into_envelope("1.0");
        assert_ne!(a.uuid, b.uuid);
    }

    fn any_json() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            ".*".prop_map(Value::String),
            prop::collection::vec(any::<i32>(), 0..4).prop_map(|v| json!(v)),
            prop::collection::hash_map("[a-z]{1,6}", any::<i32>(), 0..4).prop_map(|m| json!(m)),
        ]
    }

    proptest! {
        #[test]
        fn result_and_error_are_exclusive(code in 0u16..1000, value in any_json()) {
            let env = build(code, value).into_envelope("1.0");
            prop_assert!(env.result.is_some() != env.error.is_some());
            prop_assert_eq!(env.is_error(), env.code >= ERROR_THRESHOLD && env.error.is_some());
            if env.code < ERROR_THRESHOLD {
                prop_assert!(env.error.is_none());
                prop_assert!(env.result.is_some());
            }
        }
    }
}
