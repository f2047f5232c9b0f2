//! `dns` sample module.
//!
//! - `list`: echoes the decoded request back under `"dns:request"` with
//!   code `210`
//! - `error_list`: always fails with code `400`

use jet9_core::{build, RequestEnvelope, ResponseBody};
use jet9_rpc::subsystem::DEFAULT_VERSION;
use jet9_rpc::{action_fn, Exports, RegistryError, Subsystem};
use serde_json::json;

/// Module name in the catalog.
pub const MODULE: &str = "dns";

/// Subsystem name, served at `/dns`.
pub const SUBSYSTEM: &str = "dns";

/// Success code returned by `list`.
pub const LIST_CODE: u16 = 210;

fn list(request: &RequestEnvelope) -> ResponseBody {
    build(LIST_CODE, json!({ "dns:request": request.to_value() }))
}

fn error_list(_request: &RequestEnvelope) -> ResponseBody {
    build(400, json!("ERROR: some error here"))
}

/// Subsystem with the `list` and `error_list` actions.
pub fn subsystem() -> Result<Subsystem, RegistryError> {
    Subsystem::new(DEFAULT_VERSION)
        .with_action("list", action_fn(list))?
        .with_action("error_list", action_fn(error_list))
}

/// Module loader.
pub fn load() -> Result<Exports, RegistryError> {
    let mut exports = Exports::new();
    let _ = exports.insert(SUBSYSTEM.to_owned(), subsystem()?);
    Ok(exports)
}
