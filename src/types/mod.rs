//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `actor`: Actor reports and the deadlock report
//! - `transaction`: Committed transactions, operations and withdrawal outcomes
//! - `error`: Error types for the simulator

pub mod actor;
pub mod error;
pub mod transaction;

pub use actor::{ActorExit, ActorReport, DeadlockReport};
pub use error::SimulationError;
pub use transaction::{ActorId, Operation, Transaction, WithdrawOutcome};
