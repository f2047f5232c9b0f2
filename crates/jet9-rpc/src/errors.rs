//! Registration, router-build, and dispatch errors.

use std::time::Duration;

use jet9_core::errors::{BAD_REQUEST, INTERNAL_ERROR, NOT_FOUND};
use jet9_core::{EnvelopeError, ResponseBody};

/// Failure while a module assembles its subsystems.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The same action name was registered twice on one subsystem.
    #[error("action '{action}' is already registered")]
    DuplicateAction {
        /// Offending action name.
        action: String,
    },

    /// A subsystem or action name is empty or not path-safe.
    #[error("invalid {kind} name '{name}'")]
    InvalidName {
        /// `"subsystem"` or `"action"`.
        kind: &'static str,
        /// Rejected name.
        name: String,
    },

    /// Module-specific setup failure.
    #[error("{0}")]
    Setup(String),
}

/// Failure while building the route table. Any of these aborts startup.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// A module loader returned an error.
    #[error("module '{module}' failed to load: {source}")]
    ModuleLoad {
        /// Module name.
        module: String,
        /// Underlying failure.
        #[source]
        source: RegistryError,
    },

    /// Two modules exported the same subsystem name.
    #[error("subsystem '{subsystem}' exported by both '{first_module}' and '{second_module}'")]
    DuplicateRegistration {
        /// Contested subsystem name.
        subsystem: String,
        /// Module that registered it first.
        first_module: String,
        /// Module that tried to register it again.
        second_module: String,
    },

    /// A module exported a subsystem whose path the server keeps for itself.
    #[error("subsystem '{subsystem}' from module '{module}' uses a reserved path")]
    ReservedSubsystem {
        /// Rejected subsystem name.
        subsystem: String,
        /// Module that exported it.
        module: String,
    },

    /// A configured module name is not in the catalog.
    #[error("module '{0}' is not in the catalog")]
    UnknownModule(String),
}

/// Per-request failure, answered with an error envelope.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Request body did not decode into an envelope.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// Action not registered on the subsystem.
    #[error("unknown action '{action}'")]
    UnknownAction {
        /// Requested action name.
        action: String,
    },

    /// Action exceeded the handler timeout.
    #[error("action '{action}' timed out after {timeout:?}")]
    Timeout {
        /// Action name.
        action: String,
        /// Configured limit.
        timeout: Duration,
    },

    /// Action panicked.
    #[error("action '{action}' panicked")]
    Panicked {
        /// Action name.
        action: String,
    },
}

impl DispatchError {
    /// Protocol status code for the error envelope.
    pub fn status(&self) -> u16 {
        match self {
            Self::Envelope(_) => BAD_REQUEST,
            Self::UnknownAction { .. } => NOT_FOUND,
            Self::Timeout { .. } | Self::Panicked { .. } => INTERNAL_ERROR,
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Envelope(err) => err.kind(),
            Self::UnknownAction { .. } => "unknown_action",
            Self::Timeout { .. } => "timeout",
            Self::Panicked { .. } => "panic",
        }
    }

    /// Client-facing message. Internal failures do not leak details.
    pub fn client_message(&self) -> String {
        match self {
            Self::Envelope(_) | Self::UnknownAction { .. } => self.to_string(),
            Self::Timeout { .. } => "internal error: action timed out".to_owned(),
            Self::Panicked { .. } => "internal error: action failed".to_owned(),
        }
    }

    /// Error body carrying [`status`](Self::status) and the client message.
    pub fn to_body(&self) -> ResponseBody {
        ResponseBody::failure(self.status(), self.client_message())
    }
}
