//! Request dispatch.

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use jet9_core::{decode_request, ResponseBody, ResponseEnvelope};
use metrics::{counter, histogram};
use tracing::{debug, error, instrument, warn, Span};

use crate::errors::DispatchError;
use crate::metrics::{ERRORS_TOTAL, REQUESTS_TOTAL, REQUEST_DURATION_SECONDS};
use crate::router::Route;

/// Maximum time a single action is allowed to run unless configured.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(60);

const SLOW_REQUEST: Duration = Duration::from_secs(5);

/// Turns a raw request body into a response envelope for one route.
#[derive(Clone, Copy, Debug)]
pub struct Dispatcher {
    handler_timeout: Duration,
}

impl Dispatcher {
    /// Dispatcher with the given per-action timeout.
    pub fn new(handler_timeout: Duration) -> Self {
        Self { handler_timeout }
    }

    /// Configured per-action timeout.
    pub fn handler_timeout(&self) -> Duration {
        self.handler_timeout
    }

    /// Decode, resolve, run, and enrich.
    ///
    /// Never fails: every error path becomes an error envelope stamped with
    /// the subsystem's version.
    #[instrument(skip_all, fields(subsystem = route.subsystem(), action = tracing::field::Empty))]
    pub async fn dispatch(&self, route: &Route, body: &[u8]) -> ResponseEnvelope {
        let response = match self.invoke(route, body).await {
            Ok(response) => response,
            Err(err) => {
                counter!(
                    ERRORS_TOTAL,
                    "subsystem" => route.subsystem().to_owned(),
                    "error_type" => err.kind()
                )
                .increment(1);
                match &err {
                    DispatchError::Timeout { .. } | DispatchError::Panicked { .. } => {
                        error!(error = %err, "action failed");
                    }
                    DispatchError::Envelope(_) | DispatchError::UnknownAction { .. } => {
                        debug!(error = %err, "request rejected");
                    }
                }
                err.to_body()
            }
        };
        response.into_envelope(route.handler().version())
    }

    /// Run the action named in `body` and return its normalized body.
    pub async fn invoke(&self, route: &Route, body: &[u8]) -> Result<ResponseBody, DispatchError> {
        let request = decode_request(body)?;
        let action = request.action.clone();
        let _ = Span::current().record("action", action.as_str());

        let handler = route.handler().resolve(&action)?;
        counter!(
            REQUESTS_TOTAL,
            "subsystem" => route.subsystem().to_owned(),
            "action" => action.clone()
        )
        .increment(1);

        let start = Instant::now();
        let outcome = tokio::time::timeout(
            self.handler_timeout,
            AssertUnwindSafe(handler.handle(&request)).catch_unwind(),
        )
        .await;

        let duration = start.elapsed();
        histogram!(
            REQUEST_DURATION_SECONDS,
            "subsystem" => route.subsystem().to_owned(),
            "action" => action.clone()
        )
        .record(duration.as_secs_f64());

        if duration >= SLOW_REQUEST {
            warn!(duration_secs = duration.as_secs_f64(), "slow request");
        }

        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_panic)) => Err(DispatchError::Panicked { action }),
            Err(_elapsed) => Err(DispatchError::Timeout {
                action,
                timeout: self.handler_timeout,
            }),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLER_TIMEOUT)
    }
}
