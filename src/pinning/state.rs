//! Per-request pin flag.
//!
//! A [`PinState`] is created by the detector for every incoming request and
//! travels in that request's extensions. Clones share one flag, so handler
//! code and the database router see the same value for the same request,
//! while two requests never share storage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct PinState {
    pinned: Arc<AtomicBool>,
}

impl PinState {
    /// Create an unpinned state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state with an initial value
    pub fn with_pinned(pinned: bool) -> Self {
        Self {
            pinned: Arc::new(AtomicBool::new(pinned)),
        }
    }

    pub fn pin(&self) {
        self.pinned.store(true, Ordering::SeqCst);
    }

    pub fn unpin(&self) {
        self.pinned.store(false, Ordering::SeqCst);
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.load(Ordering::SeqCst)
    }

    /// Pin until the returned guard is dropped
    ///
    /// The previous value is restored on drop, so a forced section inside an
    /// already pinned request stays pinned afterwards.
    pub fn force_primary(&self) -> PrimaryGuard {
        let previous = self.pinned.swap(true, Ordering::SeqCst);
        PrimaryGuard {
            state: self.clone(),
            previous,
        }
    }
}

/// RAII guard returned by [`PinState::force_primary`]
#[derive(Debug)]
#[must_use = "the state is restored as soon as the guard is dropped"]
pub struct PrimaryGuard {
    state: PinState,
    previous: bool,
}

impl Drop for PrimaryGuard {
    fn drop(&mut self) {
        self.state.pinned.store(self.previous, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_unpin() {
        let state = PinState::new();
        assert!(!state.is_pinned());

        state.pin();
        assert!(state.is_pinned());

        state.unpin();
        assert!(!state.is_pinned());
    }

    #[test]
    fn test_clones_share_flag() {
        let state = PinState::new();
        let seen_by_router = state.clone();

        state.pin();
        assert!(seen_by_router.is_pinned());
    }

    #[test]
    fn test_separate_states_are_independent() {
        let first = PinState::with_pinned(true);
        let second = PinState::new();
        assert!(first.is_pinned());
        assert!(!second.is_pinned());
    }

    #[test]
    fn test_force_primary_restores_unpinned() {
        let state = PinState::new();
        {
            let _guard = state.force_primary();
            assert!(state.is_pinned());
        }
        assert!(!state.is_pinned());
    }

    #[test]
    fn test_force_primary_keeps_existing_pin() {
        let state = PinState::with_pinned(true);
        drop(state.force_primary());
        assert!(state.is_pinned());
    }
}
