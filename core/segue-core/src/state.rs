//! Transition state shared by the trigger and the overlay.
//!
//! The store is an explicit container rather than a process global: each
//! orchestrator (and each test) owns its own instance. Observers hold a
//! [`Subscription`] and poll it; a subscription yields a snapshot once per change
//! and never couples observers to one another.

use serde::Serialize;

/// Whether a transition animation is currently owed to the user.
///
/// `should_wait_for_content` is only meaningful while `is_transitioning` is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TransitionState {
    pub is_transitioning: bool,
    pub should_wait_for_content: bool,
}

impl TransitionState {
    pub const IDLE: TransitionState = TransitionState {
        is_transitioning: false,
        should_wait_for_content: false,
    };
}

#[derive(Debug, Default)]
pub struct TransitionStore {
    state: TransitionState,
    revision: u64,
}

impl TransitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TransitionState {
        self.state
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.is_transitioning
    }

    pub fn should_wait_for_content(&self) -> bool {
        self.state.is_transitioning && self.state.should_wait_for_content
    }

    /// Increases on every effective change; unchanged writes leave it alone.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Marks a transition as owed. Calling it again overwrites both flags.
    pub fn start_transition(&mut self, wait_for_content: bool) {
        self.set(TransitionState {
            is_transitioning: true,
            should_wait_for_content: wait_for_content,
        });
    }

    /// Clears both flags. Safe to call when already idle.
    pub fn end_transition(&mut self) {
        self.set(TransitionState::IDLE);
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            seen: self.revision,
        }
    }

    fn set(&mut self, next: TransitionState) {
        if self.state != next {
            self.state = next;
            self.revision += 1;
        }
    }
}

/// A pull-based observer of a [`TransitionStore`].
#[derive(Debug, Clone)]
pub struct Subscription {
    seen: u64,
}

impl Subscription {
    /// Returns the current state if it changed since the last poll.
    pub fn poll(&mut self, store: &TransitionStore) -> Option<TransitionState> {
        if store.revision() == self.seen {
            return None;
        }
        self.seen = store.revision();
        Some(store.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let store = TransitionStore::new();
        assert_eq!(store.snapshot(), TransitionState::IDLE);
    }

    #[test]
    fn test_start_transition_sets_both_flags() {
        let mut store = TransitionStore::new();
        store.start_transition(true);
        assert!(store.is_transitioning());
        assert!(store.should_wait_for_content());
    }

    #[test]
    fn test_end_transition_resets_both_flags() {
        let mut store = TransitionStore::new();
        store.start_transition(true);
        store.end_transition();
        assert_eq!(store.snapshot(), TransitionState::IDLE);
    }

    #[test]
    fn test_end_transition_is_idempotent() {
        let mut store = TransitionStore::new();
        store.start_transition(false);
        store.end_transition();
        let once = (store.snapshot(), store.revision());
        store.end_transition();
        assert_eq!((store.snapshot(), store.revision()), once);
    }

    #[test]
    fn test_restart_overwrites_wait_flag() {
        let mut store = TransitionStore::new();
        store.start_transition(true);
        store.start_transition(false);
        assert!(store.is_transitioning());
        assert!(!store.should_wait_for_content());
    }

    #[test]
    fn test_subscriptions_are_independent() {
        let mut store = TransitionStore::new();
        let mut overlay = store.subscribe();
        let mut logger = store.subscribe();

        store.start_transition(true);
        assert_eq!(
            overlay.poll(&store),
            Some(TransitionState {
                is_transitioning: true,
                should_wait_for_content: true,
            })
        );
        assert_eq!(overlay.poll(&store), None);

        store.end_transition();
        assert_eq!(logger.poll(&store), Some(TransitionState::IDLE));
        assert_eq!(overlay.poll(&store), Some(TransitionState::IDLE));
    }

    #[test]
    fn test_no_op_write_does_not_notify() {
        let mut store = TransitionStore::new();
        let mut sub = store.subscribe();
        store.end_transition();
        assert_eq!(sub.poll(&store), None);
    }
}
