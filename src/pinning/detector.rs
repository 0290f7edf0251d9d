use super::channel::PropagationChannel;
use super::method::is_read_only;
use super::state::PinState;
use http::request;
use std::sync::Arc;
use tracing::debug;

/// Decides, before handling, whether a request's reads go to the primary
#[derive(Debug, Clone)]
pub struct PinningDetector {
    channel: Arc<dyn PropagationChannel>,
}

impl PinningDetector {
    pub fn new(channel: Arc<dyn PropagationChannel>) -> Self {
        Self { channel }
    }

    /// Derive the request's [`PinState`] and attach it to its extensions
    ///
    /// The state is always rebuilt from scratch: any `PinState` already on the
    /// request is replaced.
    pub async fn detect(&self, request: &mut request::Parts) -> PinState {
        let read_only = is_read_only(&request.method);
        let evidence = self.channel.lookup(request).await;

        let state = PinState::with_pinned(evidence || !read_only);

        debug!(
            method = %request.method,
            evidence,
            pinned = state.is_pinned(),
            "pinning detected"
        );

        request.extensions.insert(state.clone());
        state
    }
}
