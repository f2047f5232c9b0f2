//! Compiled-in module catalog.
//!
//! A module is a named loader that returns the subsystems it exports. The
//! catalog lists every module linked into the binary; the router builder
//! walks it in order.

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{RegistryError, RouterError};
use crate::subsystem::Subsystem;

/// Modules whose names start with this prefix are never loaded.
pub const RESERVED_PREFIX: &str = "__";

/// Subsystems exported by one module, keyed by subsystem name.
pub type Exports = BTreeMap<String, Subsystem>;

/// Builds a module's exports.
pub type ModuleLoader = fn() -> Result<Exports, RegistryError>;

/// One catalog entry.
#[derive(Clone, Copy)]
pub struct ModuleEntry {
    /// Module name, used in logs, errors, and the `modules` allow-list.
    pub name: &'static str,
    /// Export constructor.
    pub load: ModuleLoader,
}

impl ModuleEntry {
    /// Whether the router builder should load this module.
    pub fn is_eligible(&self) -> bool {
        !self.name.is_empty() && !self.name.starts_with(RESERVED_PREFIX)
    }
}

impl fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered list of modules linked into the binary.
#[derive(Clone, Debug, Default)]
pub struct ModuleCatalog {
    entries: Vec<ModuleEntry>,
}

impl ModuleCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module.
    pub fn add(&mut self, name: &'static str, load: ModuleLoader) {
        self.entries.push(ModuleEntry { name, load });
    }

    /// Builder form of [`add`](Self::add).
    #[must_use]
    pub fn with_module(mut self, name: &'static str, load: ModuleLoader) -> Self {
        self.add(name, load);
        self
    }

    /// All entries, in registration order.
    pub fn entries(&self) -> &[ModuleEntry] {
        &self.entries
    }

    /// All module names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Restrict the catalog to the modules named in `allow`.
    ///
    /// Catalog order is preserved. A name with no matching entry is an error
    /// rather than a silent no-op.
    pub fn select(&self, allow: &[String]) -> Result<Self, RouterError> {
        if let Some(unknown) = allow
            .iter()
            .find(|name| !self.entries.iter().any(|e| e.name == name.as_str()))
        {
            return Err(RouterError::UnknownModule(unknown.clone()));
        }
        let entries = self
            .entries
            .iter()
            .filter(|e| allow.iter().any(|name| name == e.name))
            .copied()
            .collect();
        Ok(Self { entries })
    }
}
