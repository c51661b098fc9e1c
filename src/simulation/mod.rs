//! Running a complete simulation
//!
//! This module ties the pieces together for the binary and the integration
//! tests: it builds a multi-threaded tokio runtime sized from the
//! configuration, runs the coordinator on it, and writes the report.
//!
//! # Architecture
//!
//! ```text
//! run_simulation
//!     ├── SimulationConfig (cards, balance, timing, worker_threads)
//!     ├── tokio runtime    (multi-thread, time driver)
//!     ├── Coordinator      (spawns cards, handles deadlock)
//!     │   ├── Arc<Ledger>
//!     │   └── Arc<DeadlockTracker>
//!     └── io::report       (card summary + audited transaction table)
//! ```

pub mod config;

pub use config::{SimulationConfig, DEFAULT_ITERATIONS};

use crate::core::{Coordinator, SimulationOutcome};
use crate::io::report::write_report;
use crate::types::SimulationError;
use std::io::Write;

/// Exit status of a run that completed normally
pub const EXIT_SUCCESS: i32 = 0;

/// Exit status of a fatal runtime or output error
pub const EXIT_FAILURE: i32 = 1;

/// Exit status of a run aborted by deadlock detection
pub const EXIT_DEADLOCK: i32 = 255;

impl SimulationOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.is_deadlocked() {
            EXIT_DEADLOCK
        } else {
            EXIT_SUCCESS
        }
    }
}

/// Run a simulation on a dedicated runtime and write its report to `output`
///
/// A deadlock is announced on `diagnostics` before the table is written.
///
/// # Returns
///
/// * `Ok(SimulationOutcome)` - The run finished, normally or by deadlock abort
/// * `Err(SimulationError::Runtime)` - The runtime could not be created
/// * `Err(SimulationError::Output)` - The report could not be written
pub fn run_simulation(
    config: &SimulationConfig,
    output: &mut dyn Write,
    diagnostics: &mut dyn Write,
) -> Result<SimulationOutcome, SimulationError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_time()
        .build()
        .map_err(|e| SimulationError::runtime(format!("Failed to create tokio runtime: {}", e)))?;

    let coordinator = Coordinator::new(config.clone());
    let outcome = runtime.block_on(coordinator.run());

    write_report(&outcome, output, diagnostics)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_run_simulation_writes_report() {
        let config = SimulationConfig::new(3, 100)
            .unwrap()
            .with_iterations(5)
            .with_pacing(Duration::from_millis(1))
            .with_max_backoff(Duration::from_millis(1))
            .with_commit_latency(Duration::ZERO)
            .with_worker_threads(2)
            .with_seed(Some(1));
        let mut output = Vec::new();
        let mut diagnostics = Vec::new();

        let outcome = run_simulation(&config, &mut output, &mut diagnostics).unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.contains("Transaction  Withdrawal   Deposit      Balance"));
        assert_eq!(
            text.lines().filter(|line| line.contains('(')).count(),
            outcome.log.len()
        );
        assert!(matches!(outcome.exit_code(), EXIT_SUCCESS | EXIT_DEADLOCK));
    }

    #[test]
    fn test_zero_balance_withdraw_only_exits_with_deadlock_status() {
        // Any withdrawal from a zero balance stalls, even a zero one
        let config = SimulationConfig::new(1, 0)
            .unwrap()
            .with_pacing(Duration::ZERO)
            .with_max_backoff(Duration::from_millis(1))
            .with_commit_latency(Duration::ZERO)
            .with_worker_threads(1)
            .with_seed(Some(9));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .build()
            .unwrap();
        let sources: Vec<Box<dyn crate::core::OperationSource>> = vec![Box::new(
            crate::core::ScriptedOperations::new([crate::types::Operation::Withdraw(0)]),
        )];

        let outcome = runtime.block_on(Coordinator::new(config).run_with_sources(sources));

        assert_eq!(outcome.exit_code(), EXIT_DEADLOCK);
        assert!(outcome.log.is_empty());
    }
}
