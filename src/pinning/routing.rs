//! The contract the database router uses to ask where a read should go.

use super::state::PinState;
use axum::extract::FromRequestParts;
use http::request::Parts;
use std::convert::Infallible;

/// Queried by the database router once per read operation
pub trait RoutingConsultation {
    fn is_pinned(&self) -> bool;
}

impl RoutingConsultation for PinState {
    fn is_pinned(&self) -> bool {
        PinState::is_pinned(self)
    }
}

/// Which side of the topology a read should use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    Primary,
    Replica,
}

impl ReadTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadTarget::Primary => "primary",
            ReadTarget::Replica => "replica",
        }
    }
}

impl std::fmt::Display for ReadTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the read target for the current request
pub fn read_target<C: RoutingConsultation + ?Sized>(consultation: &C) -> ReadTarget {
    if consultation.is_pinned() {
        ReadTarget::Primary
    } else {
        ReadTarget::Replica
    }
}

/// Handlers take `PinState` as an argument to hand it to their router.
///
/// Without the pinning layer in front of the handler this yields a fresh,
/// unpinned state.
#[axum::async_trait]
impl<S> FromRequestParts<S> for PinState
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<PinState>().cloned().unwrap_or_default())
    }
}
