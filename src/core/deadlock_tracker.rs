//! Global stall detection for the running actors
//!
//! This module provides the `DeadlockTracker` struct, which records which actors
//! are active and which of those are stalled on a withdrawal the balance cannot
//! cover.
//!
//! # Design
//!
//! A deadlock here means every active actor is stalled at the same time. The
//! ledger has a single resource and only withdrawals can stall, so when nobody
//! is free to deposit the balance can never recover.
//!
//! All state lives behind one mutex. The active and stalled counts are always
//! derived from the same view of the map, never from two separate reads.

use crate::types::ActorId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Status of a registered actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ActorState {
    stalled: bool,
}

/// Tracks active and stalled actors
///
/// Registered actors are active by definition; an actor leaves the map
/// entirely when it completes or is cancelled.
#[derive(Debug)]
pub struct DeadlockTracker {
    /// Maximum number of actors registered at once
    capacity: usize,

    /// Registered (active) actors and their stall flag
    actors: Mutex<HashMap<ActorId, ActorState>>,
}

impl DeadlockTracker {
    /// Create a tracker for at most `capacity` concurrent actors
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            actors: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Register `actor` as active and not stalled
    ///
    /// Ignored when the tracker is full or the actor is already registered.
    pub fn register(&self, actor: ActorId) {
        let mut actors = self.lock();
        if actors.contains_key(&actor) {
            tracing::warn!(actor, "actor already registered");
            return;
        }
        if actors.len() >= self.capacity {
            tracing::warn!(actor, capacity = self.capacity, "tracker full, registration ignored");
            return;
        }
        actors.insert(actor, ActorState::default());
    }

    /// Remove `actor` entirely
    ///
    /// Unregistering an actor that is not registered is a no-op.
    pub fn unregister(&self, actor: ActorId) {
        self.lock().remove(&actor);
    }

    /// Flag `actor` as stalled on a withdrawal
    pub fn mark_stalled(&self, actor: ActorId) {
        if let Some(state) = self.lock().get_mut(&actor) {
            state.stalled = true;
        }
    }

    /// Clear the stalled flag of `actor`
    pub fn clear_stalled(&self, actor: ActorId) {
        if let Some(state) = self.lock().get_mut(&actor) {
            state.stalled = false;
        }
    }

    /// Whether every active actor is stalled
    ///
    /// Zero active actors is normal completion, not a deadlock.
    pub fn all_active_stalled(&self) -> bool {
        Self::all_stalled(&self.lock())
    }

    /// Flag `actor` as stalled and evaluate the global condition in one step
    ///
    /// # Returns
    ///
    /// `true` if, after marking, every active actor is stalled.
    pub fn stall_and_check(&self, actor: ActorId) -> bool {
        let mut actors = self.lock();
        if let Some(state) = actors.get_mut(&actor) {
            state.stalled = true;
        }
        Self::all_stalled(&actors)
    }

    /// Number of registered actors
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// Number of registered actors currently stalled
    pub fn stalled_count(&self) -> usize {
        self.lock().values().filter(|state| state.stalled).count()
    }

    /// Whether `actor` is currently registered
    pub fn is_registered(&self, actor: ActorId) -> bool {
        self.lock().contains_key(&actor)
    }

    fn all_stalled(actors: &HashMap<ActorId, ActorState>) -> bool {
        !actors.is_empty() && actors.values().all(|state| state.stalled)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ActorId, ActorState>> {
        self.actors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_tracker_is_not_deadlocked() {
        let tracker = DeadlockTracker::new(4);
        assert!(!tracker.all_active_stalled());
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_single_stalled_actor_is_deadlocked() {
        let tracker = DeadlockTracker::new(1);
        tracker.register(1);

        assert!(tracker.stall_and_check(1));
        assert_eq!(tracker.active_count(), 1);
        assert_eq!(tracker.stalled_count(), 1);
    }

    #[rstest]
    #[case::none_stalled(&[], false)]
    #[case::some_stalled(&[1, 2], false)]
    #[case::all_stalled(&[1, 2, 3], true)]
    fn test_all_active_stalled(#[case] stalled: &[ActorId], #[case] expected: bool) {
        let tracker = DeadlockTracker::new(3);
        for actor in 1..=3 {
            tracker.register(actor);
        }
        for &actor in stalled {
            tracker.mark_stalled(actor);
        }

        assert_eq!(tracker.all_active_stalled(), expected);
    }

    #[test]
    fn test_clear_stalled_breaks_deadlock() {
        let tracker = DeadlockTracker::new(2);
        tracker.register(1);
        tracker.register(2);
        tracker.mark_stalled(1);
        tracker.mark_stalled(2);
        assert!(tracker.all_active_stalled());

        tracker.clear_stalled(2);
        assert!(!tracker.all_active_stalled());
        assert_eq!(tracker.stalled_count(), 1);
    }

    #[test]
    fn test_unregistering_free_actor_exposes_deadlock() {
        let tracker = DeadlockTracker::new(2);
        tracker.register(1);
        tracker.register(2);
        tracker.mark_stalled(1);
        assert!(!tracker.all_active_stalled());

        // Actor 2 finishes its run; actor 1 is now the only one left
        tracker.unregister(2);
        assert!(tracker.all_active_stalled());
    }

    #[test]
    fn test_unregister_unknown_actor_is_noop() {
        let tracker = DeadlockTracker::new(2);
        tracker.register(1);
        tracker.mark_stalled(1);

        tracker.unregister(99);
        tracker.unregister(99);

        assert!(tracker.is_registered(1));
        assert_eq!(tracker.active_count(), 1);
        assert_eq!(tracker.stalled_count(), 1);
    }

    #[test]
    fn test_unregister_removes_stall_flag() {
        let tracker = DeadlockTracker::new(2);
        tracker.register(1);
        tracker.mark_stalled(1);
        tracker.unregister(1);

        assert!(!tracker.is_registered(1));
        assert_eq!(tracker.stalled_count(), 0);
        assert!(!tracker.all_active_stalled());
    }

    #[test]
    fn test_register_respects_capacity_and_duplicates() {
        let tracker = DeadlockTracker::new(2);
        tracker.register(1);
        tracker.register(1);
        tracker.register(2);
        tracker.register(3);

        assert_eq!(tracker.active_count(), 2);
        assert!(!tracker.is_registered(3));
    }

    #[test]
    fn test_marking_unregistered_actor_is_ignored() {
        let tracker = DeadlockTracker::new(2);
        tracker.register(1);

        assert!(!tracker.stall_and_check(5));
        tracker.mark_stalled(6);
        assert_eq!(tracker.stalled_count(), 0);
        assert!(!tracker.is_registered(5));
    }
}
