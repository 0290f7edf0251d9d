//! How pinning evidence travels from a writing request to later ones.
//!
//! Two interchangeable strategies sit behind [`PropagationChannel`]:
//! [`CookieChannel`] hands the client a short-lived cookie, while
//! [`CacheChannel`] keeps an entry in a shared [`PinStore`] keyed by the
//! client's session. Neither lookup nor record can fail from the caller's
//! point of view; a missing cookie, session or entry is simply "no evidence".

mod cache;
mod cookie;
mod store;

pub use cache::{CACHE_KEY_PREFIX, CacheChannel, SessionKey};
pub use cookie::CookieChannel;
pub use store::{MemoryStore, PinStore};

use crate::config::{ChannelKind, PinningConfig};
use async_trait::async_trait;
use http::{request, response};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Value written as pinning evidence; only its presence is interpreted
pub const PIN_VALUE: &str = "y";

#[async_trait]
pub trait PropagationChannel: Send + Sync + Debug {
    /// Whether the request carries evidence of a recent write
    async fn lookup(&self, request: &request::Parts) -> bool;

    /// Write or refresh evidence so it lives for `ttl` from now
    async fn record(&self, request: &request::Parts, response: &mut response::Parts, ttl: Duration);
}

/// Build the channel selected by `config`
///
/// The cache variant gets a fresh in-process [`MemoryStore`]; use
/// [`CacheChannel::new`] directly to share a store across services.
pub fn from_config(config: &PinningConfig) -> Arc<dyn PropagationChannel> {
    match config.channel {
        ChannelKind::Cookie => Arc::new(CookieChannel::new(config.cookie_name.clone())),
        ChannelKind::Cache => Arc::new(CacheChannel::new(MemoryStore::default())),
    }
}
