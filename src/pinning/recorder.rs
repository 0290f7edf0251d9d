use super::channel::PropagationChannel;
use super::marker::has_write_marker;
use super::method::is_read_only;
use http::{request, response};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Writes pinning evidence after a request that wrote
///
/// Evidence is only ever written or refreshed here, never cleared; it
/// disappears when its window runs out.
#[derive(Debug, Clone)]
pub struct PinningRecorder {
    channel: Arc<dyn PropagationChannel>,
    window: Duration,
}

impl PinningRecorder {
    pub fn new(channel: Arc<dyn PropagationChannel>, window: Duration) -> Self {
        Self { channel, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether the finished request counts as a write
    pub fn is_write(request: &request::Parts, response: &response::Parts) -> bool {
        !is_read_only(&request.method) || has_write_marker(response)
    }

    /// Record evidence for `request` on `response` if it wrote; returns
    /// whether anything was recorded
    pub async fn record(&self, request: &request::Parts, response: &mut response::Parts) -> bool {
        if !Self::is_write(request, response) {
            return false;
        }

        debug!(method = %request.method, window = ?self.window, "recording pinning evidence");
        self.channel.record(request, response, self.window).await;
        true
    }
}
