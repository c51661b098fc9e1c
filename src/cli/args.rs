use crate::simulation::{SimulationConfig, DEFAULT_ITERATIONS};
use crate::types::SimulationError;
use clap::Parser;
use std::time::Duration;

/// Simulate cards sharing one bank balance, with deadlock detection
#[derive(Parser, Debug)]
#[command(name = "card-balance-simulator")]
#[command(
    about = "Simulate cards depositing into and withdrawing from one shared balance",
    long_about = None
)]
#[command(allow_negative_numbers = true)]
pub struct CliArgs {
    /// Number of cards running concurrently
    #[arg(value_name = "CARDS", help = "Number of cards (positive integer)")]
    pub card_count: usize,

    /// Balance the shared account starts with
    #[arg(value_name = "BALANCE", help = "Starting balance (integer)")]
    pub starting_balance: i64,

    /// Operations each card performs
    #[arg(
        long = "iterations",
        value_name = "COUNT",
        default_value_t = DEFAULT_ITERATIONS,
        help = "Operations per card"
    )]
    pub iterations: usize,

    /// Pause between two operations of a card, in milliseconds
    #[arg(long = "pacing-ms", value_name = "MS", default_value_t = 200)]
    pub pacing_ms: u64,

    /// Upper bound of the random backoff after a stalled withdrawal, in milliseconds
    #[arg(long = "max-backoff-ms", value_name = "MS", default_value_t = 200)]
    pub max_backoff_ms: u64,

    /// Time a mutation holds the ledger between read and commit, in milliseconds
    #[arg(long = "commit-latency-ms", value_name = "MS", default_value_t = 5)]
    pub commit_latency_ms: u64,

    /// Seed for reproducible card operations
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Runtime worker threads
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Runtime worker threads (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// Report every committed transaction on deadlock instead of trimming the tail
    #[arg(long = "full-log-on-deadlock")]
    pub full_log_on_deadlock: bool,
}

impl CliArgs {
    /// Build the simulation configuration from the parsed arguments
    ///
    /// # Returns
    ///
    /// * `Ok(SimulationConfig)` - Ready to run
    /// * `Err(SimulationError::InvalidConfig)` - The card count is not usable
    pub fn to_simulation_config(&self) -> Result<SimulationConfig, SimulationError> {
        let mut config = SimulationConfig::new(self.card_count, self.starting_balance)?
            .with_iterations(self.iterations)
            .with_pacing(Duration::from_millis(self.pacing_ms))
            .with_max_backoff(Duration::from_millis(self.max_backoff_ms))
            .with_commit_latency(Duration::from_millis(self.commit_latency_ms))
            .with_seed(self.seed)
            .with_trim_unverified_tail(!self.full_log_on_deadlock);

        if let Some(worker_threads) = self.worker_threads {
            config = config.with_worker_threads(worker_threads);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::positive(&["program", "4", "100"], 4, 100)]
    #[case::negative_balance(&["program", "2", "-15"], 2, -15)]
    #[case::zero_balance(&["program", "1", "0"], 1, 0)]
    fn test_positional_parsing(
        #[case] args: &[&str],
        #[case] cards: usize,
        #[case] balance: i64,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.card_count, cards);
        assert_eq!(parsed.starting_balance, balance);
    }

    #[test]
    fn test_defaults() {
        let parsed = CliArgs::try_parse_from(["program", "3", "50"]).unwrap();
        let config = parsed.to_simulation_config().unwrap();

        assert_eq!(config.iterations, 20);
        assert_eq!(config.pacing, Duration::from_millis(200));
        assert_eq!(config.max_backoff, Duration::from_millis(200));
        assert_eq!(config.commit_latency, Duration::from_millis(5));
        assert_eq!(config.worker_threads, num_cpus::get());
        assert_eq!(config.seed, None);
        assert!(config.trim_unverified_tail);
    }

    #[test]
    fn test_all_options() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--iterations",
            "5",
            "--pacing-ms",
            "1",
            "--max-backoff-ms",
            "2",
            "--commit-latency-ms",
            "0",
            "--seed",
            "77",
            "--worker-threads",
            "3",
            "--full-log-on-deadlock",
            "6",
            "-1",
        ])
        .unwrap();
        let config = parsed.to_simulation_config().unwrap();

        assert_eq!(config.card_count, 6);
        assert_eq!(config.starting_balance, -1);
        assert_eq!(config.iterations, 5);
        assert_eq!(config.pacing, Duration::from_millis(1));
        assert_eq!(config.max_backoff, Duration::from_millis(2));
        assert_eq!(config.commit_latency, Duration::ZERO);
        assert_eq!(config.seed, Some(77));
        assert_eq!(config.worker_threads, 3);
        assert!(!config.trim_unverified_tail);
    }

    // Error handling tests
    #[rstest]
    #[case::missing_both(&["program"])]
    #[case::missing_balance(&["program", "3"])]
    #[case::too_many(&["program", "3", "10", "7"])]
    #[case::card_count_not_integer(&["program", "three", "10"])]
    #[case::balance_not_integer(&["program", "3", "10.5"])]
    #[case::negative_card_count(&["program", "-3", "10"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        let result = CliArgs::try_parse_from(args);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_cards_is_config_error() {
        let parsed = CliArgs::try_parse_from(["program", "0", "10"]).unwrap();
        let result = parsed.to_simulation_config();
        assert!(matches!(result, Err(SimulationError::InvalidConfig { .. })));
    }
}
