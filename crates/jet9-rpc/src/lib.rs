//! # jet9-rpc
//!
//! Action registration, routing, and dispatch.
//!
//! - [`ActionHandler`]: one named action; returns a [`jet9_core::ResponseBody`]
//! - [`Subsystem`]: action table plus version tag, served at `/{name}`
//! - [`ModuleCatalog`]: compiled-in modules, each exporting subsystems
//! - [`RouterBuilder`]: turns the catalog into an immutable [`RouteTable`]
//! - [`Dispatcher`]: decodes a request body, resolves and runs the action,
//!   and returns the enriched response envelope

#![deny(unsafe_code)]

pub mod dispatch;
pub mod errors;
pub mod handler;
pub mod metrics;
pub mod module;
pub mod router;
pub mod subsystem;

pub use dispatch::Dispatcher;
pub use errors::{DispatchError, RegistryError, RouterError};
pub use handler::{action_fn, ActionHandler, FnAction};
pub use module::{Exports, ModuleCatalog, ModuleEntry, ModuleLoader};
pub use router::{Route, RouteTable, RouterBuilder};
pub use subsystem::Subsystem;
