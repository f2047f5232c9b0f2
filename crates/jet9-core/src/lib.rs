//! # jet9-core
//!
//! Wire protocol for the jet9 JSON-over-HTTP API.
//!
//! - Request and response envelopes with mandatory-key validation
//! - Envelope codec (`decode_request`, `decode_response`, `encode_*`)
//! - Response builder that normalizes `(code, result)` pairs into bodies
//!   where exactly one of `result`/`error` is set

#![deny(unsafe_code)]

pub mod envelope;
pub mod errors;
pub mod response;

pub use envelope::{
    decode_request, decode_response, decode_response_value, encode_request, encode_response,
    ErrorBody, RequestEnvelope, ResponseEnvelope,
};
pub use errors::EnvelopeError;
pub use response::{build, ResponseBody};
