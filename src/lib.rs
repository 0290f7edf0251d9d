// ============================================================================
// multidb-pinning Library
// ============================================================================

//! Request-scoped primary pinning for primary/replica database topologies.
//!
//! A request that writes is marked "read from the primary", and the mark is
//! carried to the same client's next requests for a short window so they do
//! not read stale data from a lagging replica.
//!
//! ```no_run
//! use axum::{Router, routing::get};
//! use multidb_pinning::{PinState, PinningConfig, PinningLayer, read_target};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PinningConfig::from_env()?;
//! let app: Router = Router::new()
//!     .route("/", get(|pin: PinState| async move { read_target(&pin).to_string() }))
//!     .layer(PinningLayer::from_config(&config)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod pinning;
pub mod web;

pub use config::{ChannelKind, PinningConfig};
pub use core::{PinError, Result};
pub use pinning::{
    CacheChannel, CookieChannel, DbWrite, MemoryStore, PinState, PinStore, PinningDetector,
    PinningRecorder, PropagationChannel, ReadTarget, RoutingConsultation, SessionKey, Wrote,
    mark_as_write, read_target,
};
pub use web::{PinningLayer, PinningService};
