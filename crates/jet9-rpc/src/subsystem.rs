//! Subsystem: a named group of actions with a version tag.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{DispatchError, RegistryError};
use crate::handler::ActionHandler;

/// Version stamped on responses when a module does not set its own.
pub const DEFAULT_VERSION: &str = "1.0";

/// Action table for one subsystem.
///
/// Lookup is an exact match on the action name; there is no fallback to
/// arbitrary handler attributes.
pub struct Subsystem {
    version: String,
    actions: HashMap<String, Arc<dyn ActionHandler>>,
}

impl Subsystem {
    /// Empty subsystem reporting `version` on every response.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            actions: HashMap::new(),
        }
    }

    /// Register `handler` under `action`.
    pub fn register(
        &mut self,
        action: &str,
        handler: impl ActionHandler + 'static,
    ) -> Result<(), RegistryError> {
        validate_name("action", action)?;
        if self.actions.contains_key(action) {
            return Err(RegistryError::DuplicateAction {
                action: action.to_owned(),
            });
        }
        let _ = self.actions.insert(action.to_owned(), Arc::new(handler));
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_action(
        mut self,
        action: &str,
        handler: impl ActionHandler + 'static,
    ) -> Result<Self, RegistryError> {
        self.register(action, handler)?;
        Ok(self)
    }

    /// Find the handler for `action`.
    pub fn resolve(&self, action: &str) -> Result<Arc<dyn ActionHandler>, DispatchError> {
        self.actions
            .get(action)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownAction {
                action: action.to_owned(),
            })
    }

    /// Version reported on this subsystem's responses.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Registered action names (sorted).
    pub fn actions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check whether an action is registered.
    pub fn has_action(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }
}

impl Default for Subsystem {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION)
    }
}

impl fmt::Debug for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subsystem")
            .field("version", &self.version)
            .field("actions", &self.actions())
            .finish()
    }
}

/// Names end up in URL paths, so keep them to `[A-Za-z0-9_.-]` and never
/// a dot-only segment like `..`.
pub(crate) fn validate_name(kind: &'static str, name: &str) -> Result<(), RegistryError> {
    let valid = !name.is_empty()
        && !name.chars().all(|c| c == '.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidName {
            kind,
            name: name.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::action_fn;
    use assert_matches::assert_matches;
    use jet9_core::{RequestEnvelope, ResponseBody};
    use serde_json::{json, Map};

    fn ok_action() -> impl ActionHandler {
        action_fn(|_req: &RequestEnvelope| ResponseBody::success(200, Map::new()))
    }

    #[test]
    fn register_and_list_actions() {
        let subsystem = Subsystem::default()
            .with_action("list", ok_action())
            .unwrap()
            .with_action("error_list", ok_action())
            .unwrap();
        assert_eq!(subsystem.actions(), vec!["error_list", "list"]);
        assert!(subsystem.has_action("list"));
        assert!(!subsystem.has_action("delete"));
        assert_eq!(subsystem.version(), "1.0");
    }

    #[test]
    fn duplicate_action_is_rejected() {
        let mut subsystem = Subsystem::new("2.1");
        subsystem.register("list", ok_action()).unwrap();
        let err = subsystem.register("list", ok_action()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateAction {
                action: "list".into()
            }
        );
    }

    #[test]
    fn invalid_action_names_are_rejected() {
        let mut subsystem = Subsystem::default();
        assert_matches!(
            subsystem.register("", ok_action()),
            Err(RegistryError::InvalidName { kind: "action", .. })
        );
        assert_matches!(
            subsystem.register("a/b", ok_action()),
            Err(RegistryError::InvalidName { .. })
        );
    }

    #[test]
    fn dot_only_names_are_rejected() {
        for name in [".", "..", "..."] {
            assert_matches!(
                validate_name("subsystem", name),
                Err(RegistryError::InvalidName { kind: "subsystem", .. })
            );
        }
        assert!(validate_name("subsystem", "v1.2").is_ok());
        assert!(validate_name("subsystem", ".hidden").is_ok());
    }

    #[tokio::test]
    async fn resolve_known_action() {
        let subsystem = Subsystem::default()
            .with_action(
                "echo",
                action_fn(|req: &RequestEnvelope| {
                    jet9_core::build(200, json!({ "params": req.params }))
                }),
            )
            .unwrap();
        let handler = subsystem.resolve("echo").unwrap();
        let mut params = Map::new();
        let _ = params.insert("x".into(), json!(1));
        let body = handler
            .handle(&RequestEnvelope::new("echo", params))
            .await;
        assert_eq!(body.result().unwrap()["params"]["x"], 1);
    }

    #[test]
    fn resolve_unknown_action() {
        let subsystem = Subsystem::default();
        let err = subsystem.resolve("missing").err().unwrap();
        assert_matches!(err, DispatchError::UnknownAction { ref action } if action == "missing");
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn debug_lists_actions() {
        let subsystem = Subsystem::default().with_action("list", ok_action()).unwrap();
        let debug = format!("{subsystem:?}");
        assert!(debug.contains("list"));
        assert!(debug.contains("1.0"));
    }
}
