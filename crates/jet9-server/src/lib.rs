//! # jet9-server
//!
//! Axum listener for the jet9 protocol: one `POST` endpoint per subsystem,
//! plus `/health` and `/metrics`.

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use errors::ServerError;
pub use server::{Jet9Server, RESERVED_PATHS};
pub use shutdown::ShutdownCoordinator;
