//! Tower middleware wiring pinning into an HTTP service stack.
//!
//! [`PinningLayer`] wraps an inner service so that every request goes
//! through three steps:
//!
//! - the detector derives a [`PinState`] and puts it in the request's
//!   extensions before the inner service sees the request
//! - the inner service handles the request; handlers and the database router
//!   consult the state through [`RoutingConsultation`]
//! - the recorder inspects the finished response and refreshes pinning
//!   evidence if the request wrote
//!
//! If the inner service fails, or the future is dropped, nothing is recorded.
//!
//! [`PinState`]: crate::pinning::PinState
//! [`RoutingConsultation`]: crate::pinning::RoutingConsultation

use crate::config::PinningConfig;
use crate::core::Result;
use crate::pinning::channel::{self, PropagationChannel};
use crate::pinning::{PinningDetector, PinningRecorder};
use futures::future::BoxFuture;
use http::{Request, Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

#[derive(Debug, Clone)]
pub struct PinningLayer {
    detector: PinningDetector,
    recorder: PinningRecorder,
}

impl PinningLayer {
    /// Layer using an explicit channel
    pub fn new(channel: Arc<dyn PropagationChannel>, config: &PinningConfig) -> Self {
        Self {
            detector: PinningDetector::new(Arc::clone(&channel)),
            recorder: PinningRecorder::new(channel, config.pinning_window()),
        }
    }

    /// Layer using the channel selected by `config`
    pub fn from_config(config: &PinningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(channel::from_config(config), config))
    }
}

impl<S> Layer<S> for PinningLayer {
    type Service = PinningService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PinningService {
            inner,
            detector: self.detector.clone(),
            recorder: self.recorder.clone(),
        }
    }
}

/// Service produced by [`PinningLayer`]
#[derive(Debug, Clone)]
pub struct PinningService<S> {
    inner: S,
    detector: PinningDetector,
    recorder: PinningRecorder,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for PinningService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // The clone may not be ready; keep the one poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let detector = self.detector.clone();
        let recorder = self.recorder.clone();

        Box::pin(async move {
            let (mut parts, body) = request.into_parts();
            detector.detect(&mut parts).await;
            let request_parts = parts.clone();

            let response = inner.call(Request::from_parts(parts, body)).await?;

            let (mut response_parts, body) = response.into_parts();
            recorder.record(&request_parts, &mut response_parts).await;
            Ok(Response::from_parts(response_parts, body))
        })
    }
}
