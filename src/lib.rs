//! Card Balance Simulator Library
//! # Overview
//!
//! This library simulates many cards concurrently depositing into and
//! withdrawing from a single shared balance, and detects the global deadlock
//! that arises when every active card is waiting for funds.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Transaction, Operation, reports, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Concurrency core:
//!   - [`core::ledger`] - Shared balance and commit log, one mutation at a time
//!   - [`core::deadlock_tracker`] - Active/stalled bookkeeping
//!   - [`core::actor`] - A card's deposit/withdraw loop
//!   - [`core::coordinator`] - Spawning cards and the deadlock abort
//! - [`simulation`] - Configuration and the runtime-owning entry point
//! - [`io`] - Report output with balance audit
//!
//! # Ledger Rules
//!
//! - **Deposit**: Always commits
//! - **Withdrawal**: Commits only if the balance is positive and stays strictly
//!   positive; otherwise the card stalls and retries after a random backoff
//!
//! # Deadlock
//!
//! When every active card is stalled on a withdrawal, nobody can deposit and
//! the balance can never recover. The coordinator then cancels all cards and
//! reports the committed log without its last `cards - 1` entries.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod simulation;
pub mod types;

pub use core::{Coordinator, DeadlockTracker, Ledger, SimulationOutcome};
pub use io::write_report;
pub use simulation::{run_simulation, SimulationConfig};
pub use types::{
    ActorExit, ActorId, ActorReport, DeadlockReport, Operation, SimulationError, Transaction,
    WithdrawOutcome,
};
