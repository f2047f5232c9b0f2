//! Action handler trait.

use async_trait::async_trait;
use jet9_core::{RequestEnvelope, ResponseBody};

/// One named operation on a subsystem.
///
/// Handlers build their answer with [`jet9_core::build`] (or the
/// [`ResponseBody`] constructors), so every response is normalized before
/// it reaches the transport.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Run the action against a decoded request.
    async fn handle(&self, request: &RequestEnvelope) -> ResponseBody;
}

/// Adapter that turns a synchronous closure into an [`ActionHandler`].
pub struct FnAction<F>(F);

/// Wrap `f` as an action handler.
pub fn action_fn<F>(f: F) -> FnAction<F>
where
    F: Fn(&RequestEnvelope) -> ResponseBody + Send + Sync,
{
    FnAction(f)
}

#[async_trait]
impl<F> ActionHandler for FnAction<F>
where
    F: Fn(&RequestEnvelope) -> ResponseBody + Send + Sync,
{
    async fn handle(&self, request: &RequestEnvelope) -> ResponseBody {
        (self.0)(request)
    }
}
