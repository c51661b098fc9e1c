//! Simulation configuration
//!
//! A `SimulationConfig` is built once (from the command line or by a test) and
//! handed to the coordinator, which derives the ledger, tracker and actor
//! settings from it. Nothing reads configuration from global state.

use crate::core::ActorTiming;
use crate::types::{ActorId, SimulationError};
use std::time::Duration;

/// Operations each card performs in a run
pub const DEFAULT_ITERATIONS: usize = 20;

/// Configuration for a simulation run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of concurrent cards
    pub card_count: usize,
    /// Balance the shared ledger starts with
    pub starting_balance: i64,
    /// Operations each card performs
    pub iterations: usize,
    /// Pause between two operations of the same card
    pub pacing: Duration,
    /// Upper bound of the random backoff after a stalled withdrawal
    pub max_backoff: Duration,
    /// Time a mutation spends holding the ledger between read and commit
    pub commit_latency: Duration,
    /// Seed for reproducible operations and backoff; entropy when `None`
    pub seed: Option<u64>,
    /// Worker threads of the tokio runtime
    pub worker_threads: usize,
    /// On deadlock, drop the last `card_count - 1` log entries from the report
    pub trim_unverified_tail: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let timing = ActorTiming::default();
        Self {
            card_count: 1,
            starting_balance: 0,
            iterations: DEFAULT_ITERATIONS,
            pacing: timing.pacing,
            max_backoff: timing.max_backoff,
            commit_latency: Duration::from_millis(5),
            seed: None,
            worker_threads: num_cpus::get(),
            trim_unverified_tail: true,
        }
    }
}

impl SimulationConfig {
    /// Create a configuration for `card_count` cards sharing `starting_balance`
    ///
    /// # Returns
    ///
    /// * `Ok(SimulationConfig)` - Defaults for everything else
    /// * `Err(SimulationError::InvalidConfig)` - `card_count` is zero or exceeds the actor id range
    pub fn new(card_count: usize, starting_balance: i64) -> Result<Self, SimulationError> {
        if card_count == 0 {
            return Err(SimulationError::invalid_config(
                "card count must be a positive integer",
            ));
        }
        if ActorId::try_from(card_count).is_err() {
            return Err(SimulationError::invalid_config(format!(
                "card count {} exceeds the maximum of {}",
                card_count,
                ActorId::MAX
            )));
        }

        Ok(Self {
            card_count,
            starting_balance,
            ..Self::default()
        })
    }

    /// Set the number of operations per card
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the pause between operations
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the upper bound of the stall backoff
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Set the simulated commit latency
    pub fn with_commit_latency(mut self, commit_latency: Duration) -> Self {
        self.commit_latency = commit_latency;
        self
    }

    /// Make the run reproducible (up to scheduling order)
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Set the runtime worker count
    ///
    /// Zero falls back to the default with a warning.
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = if worker_threads == 0 {
            let default = num_cpus::get();
            tracing::warn!(
                "Invalid worker_threads ({}), using default ({})",
                worker_threads,
                default
            );
            default
        } else {
            worker_threads
        };
        self
    }

    /// Choose whether a deadlock report drops the unverified log tail
    pub fn with_trim_unverified_tail(mut self, trim: bool) -> Self {
        self.trim_unverified_tail = trim;
        self
    }

    /// Delays handed to every actor
    pub fn actor_timing(&self) -> ActorTiming {
        ActorTiming {
            pacing: self.pacing,
            max_backoff: self.max_backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_uses_defaults() {
        let config = SimulationConfig::new(4, 100).unwrap();

        assert_eq!(config.card_count, 4);
        assert_eq!(config.starting_balance, 100);
        assert_eq!(config.iterations, 20);
        assert_eq!(config.pacing, Duration::from_millis(200));
        assert_eq!(config.max_backoff, Duration::from_millis(200));
        assert_eq!(config.commit_latency, Duration::from_millis(5));
        assert_eq!(config.worker_threads, num_cpus::get());
        assert!(config.trim_unverified_tail);
        assert_eq!(config.seed, None);
    }

    #[rstest]
    #[case::zero_cards(0)]
    #[case::too_many_cards(usize::MAX)]
    fn test_new_rejects_card_count(#[case] card_count: usize) {
        let result = SimulationConfig::new(card_count, 0);
        assert!(matches!(result, Err(SimulationError::InvalidConfig { .. })));
    }

    #[test]
    fn test_negative_starting_balance_allowed() {
        let config = SimulationConfig::new(2, -50).unwrap();
        assert_eq!(config.starting_balance, -50);
    }

    #[rstest]
    #[case::custom(3, 3)]
    #[case::zero_falls_back(0, num_cpus::get())]
    fn test_with_worker_threads(#[case] requested: usize, #[case] expected: usize) {
        let config = SimulationConfig::default().with_worker_threads(requested);
        assert_eq!(config.worker_threads, expected);
    }

    #[test]
    fn test_actor_timing_follows_config() {
        let config = SimulationConfig::default()
            .with_pacing(Duration::from_millis(7))
            .with_max_backoff(Duration::from_millis(9));

        assert_eq!(
            config.actor_timing(),
            ActorTiming {
                pacing: Duration::from_millis(7),
                max_backoff: Duration::from_millis(9)
            }
        );
    }
}
