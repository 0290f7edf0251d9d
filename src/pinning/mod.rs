//! Primary pinning: detect, consult, propagate.

pub mod channel;
pub mod detector;
pub mod marker;
pub mod method;
pub mod recorder;
pub mod routing;
pub mod state;

pub use channel::{
    CacheChannel, CookieChannel, MemoryStore, PinStore, PropagationChannel, SessionKey,
};
pub use detector::PinningDetector;
pub use marker::{DbWrite, Wrote, has_write_marker, mark_as_write};
pub use method::{READ_ONLY_METHODS, is_read_only};
pub use recorder::PinningRecorder;
pub use routing::{ReadTarget, RoutingConsultation, read_target};
pub use state::{PinState, PrimaryGuard};
