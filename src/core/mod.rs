//! Core simulation module
//!
//! This module contains the concurrency core:
//! - `ledger` - Shared balance and commit log, serialized through a scoped commit slot
//! - `deadlock_tracker` - Active/stalled bookkeeping and the global stall check
//! - `actor` - A card draining its operations against the ledger
//! - `coordinator` - Spawning cards, deadlock abort and result collection
//! - `traits` - Operation sources (randomized and scripted)
//! - `audit` - Balance consistency check over a committed log

pub mod actor;
pub mod audit;
pub mod coordinator;
pub mod deadlock_tracker;
pub mod ledger;
pub mod traits;

pub use actor::{Actor, ActorContext, ActorTiming};
pub use audit::{audit_log, AuditMismatch};
pub use coordinator::{Coordinator, SimulationOutcome};
pub use deadlock_tracker::DeadlockTracker;
pub use ledger::Ledger;
pub use traits::{OperationSource, RandomOperations, ScriptedOperations};
