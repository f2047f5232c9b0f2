//! # jet9-client
//!
//! Sends action requests to a jet9 server and decodes the response
//! envelopes.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;

pub use client::Jet9Client;
pub use errors::ClientError;
