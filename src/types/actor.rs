//! Actor-related types for the card balance simulator
//!
//! These are the values an actor hands back to the coordinator: its final
//! report, and the deadlock report it raises when every active actor is
//! stalled.

use super::transaction::ActorId;

/// How an actor's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorExit {
    /// Every operation from its source was committed
    Completed,

    /// The cancellation signal interrupted the run
    ///
    /// Remaining operations were skipped and the in-flight one left no log entry.
    Cancelled,

    /// An operation was rejected with an error (balance overflow)
    Failed,
}

/// Final state of a single actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorReport {
    /// The actor this report belongs to
    pub id: ActorId,

    /// Sum of committed deposits minus committed withdrawals
    ///
    /// Owned by the actor for its whole run and only published here.
    pub net_delta: i64,

    /// Number of operations that committed
    pub completed_operations: usize,

    /// Whether the actor finished or was cancelled
    pub exit: ActorExit,
}

impl ActorReport {
    /// Whether the actor ran all of its operations
    pub fn is_completed(&self) -> bool {
        self.exit == ActorExit::Completed
    }
}

/// Raised by the actor that observed all active actors stalled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlockReport {
    /// Actor whose stall completed the global condition
    pub detected_by: ActorId,

    /// Number of active actors at detection time (all of them stalled)
    pub active_actors: usize,

    /// Ledger log length at detection time
    pub log_len: usize,
}
