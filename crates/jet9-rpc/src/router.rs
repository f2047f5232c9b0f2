//! Route table construction.
//!
//! [`RouterBuilder::build`] loads every eligible module, validates the
//! exported subsystem names, and produces one [`Route`] per subsystem. Any
//! failure aborts the whole build, so a server never starts with a partial
//! route table.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::RouterError;
use crate::module::ModuleCatalog;
use crate::subsystem::{validate_name, Subsystem};

/// URL path a subsystem is served on.
pub fn route_pattern(subsystem: &str) -> String {
    format!("/{subsystem}")
}

/// One served subsystem.
#[derive(Clone, Debug)]
pub struct Route {
    pattern: String,
    subsystem: String,
    module: String,
    handler: Arc<Subsystem>,
}

impl Route {
    /// Route serving `handler` as `subsystem`, owned by `module`.
    pub fn new(subsystem: impl Into<String>, module: impl Into<String>, handler: Subsystem) -> Self {
        let subsystem = subsystem.into();
        Self {
            pattern: route_pattern(&subsystem),
            subsystem,
            module: module.into(),
            handler: Arc::new(handler),
        }
    }

    /// Canonical path, e.g. `/dns`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Trailing-slash variant, e.g. `/dns/`.
    pub fn slash_pattern(&self) -> String {
        format!("{}/", self.pattern)
    }

    /// Subsystem name.
    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    /// Name of the module that exported this subsystem.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Action table.
    pub fn handler(&self) -> &Arc<Subsystem> {
        &self.handler
    }
}

/// Immutable set of routes. Read-only once built.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Routes in load order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Route for a subsystem name.
    pub fn get(&self, subsystem: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.subsystem == subsystem)
    }

    /// Served subsystem names, in load order.
    pub fn subsystems(&self) -> Vec<&str> {
        self.routes.iter().map(Route::subsystem).collect()
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes were built.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Builds a [`RouteTable`] from a [`ModuleCatalog`].
#[derive(Clone, Debug)]
pub struct RouterBuilder {
    catalog: ModuleCatalog,
    reserved: Vec<String>,
}

impl RouterBuilder {
    /// Builder over every module in `catalog`.
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self {
            catalog,
            reserved: Vec::new(),
        }
    }

    /// Builder over the modules named in `allow`, or all of them for `None`.
    pub fn with_allow_list(
        catalog: &ModuleCatalog,
        allow: Option<&[String]>,
    ) -> Result<Self, RouterError> {
        let catalog = match allow {
            Some(names) => catalog.select(names)?,
            None => catalog.clone(),
        };
        Ok(Self::new(catalog))
    }

    /// Refuse subsystems named like any of `names`.
    #[must_use]
    pub fn reserve(mut self, names: &[&str]) -> Self {
        self.reserved.extend(names.iter().map(|n| (*n).to_owned()));
        self
    }

    /// Load modules and assemble routes.
    ///
    /// Does not bind or serve anything. Errors are fatal: a module that fails
    /// to load, an invalid subsystem name, or a subsystem exported by two
    /// modules yields no routes at all.
    pub fn build(&self) -> Result<RouteTable, RouterError> {
        let mut owners: HashMap<String, &'static str> = HashMap::new();
        let mut routes = Vec::new();

        for entry in self.catalog.entries() {
            if !entry.is_eligible() {
                debug!(module = entry.name, "skipping reserved module");
                continue;
            }

            let exports = (entry.load)().map_err(|source| RouterError::ModuleLoad {
                module: entry.name.to_owned(),
                source,
            })?;

            for (subsystem, handler) in exports {
                validate_name("subsystem", &subsystem).map_err(|source| {
                    RouterError::ModuleLoad {
                        module: entry.name.to_owned(),
                        source,
                    }
                })?;
                if self.reserved.contains(&subsystem) {
                    return Err(RouterError::ReservedSubsystem {
                        subsystem,
                        module: entry.name.to_owned(),
                    });
                }
                if let Some(first) = owners.get(&subsystem) {
                    return Err(RouterError::DuplicateRegistration {
                        subsystem,
                        first_module: (*first).to_owned(),
                        second_module: entry.name.to_owned(),
                    });
                }
                debug!(
                    module = entry.name,
                    subsystem = %subsystem,
                    version = handler.version(),
                    actions = ?handler.actions(),
                    "registering subsystem"
                );
                let _ = owners.insert(subsystem.clone(), entry.name);
                routes.push(Route::new(subsystem, entry.name, handler));
            }
        }

        info!(routes = routes.len(), "route table built");
        Ok(RouteTable { routes })
    }
}
