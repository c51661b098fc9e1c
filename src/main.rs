//! Card balance simulator CLI
//!
//! Runs N cards against one shared balance and prints the transaction table.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- 5 100
//! cargo run -- --seed 42 --pacing-ms 10 8 0
//! RUST_LOG=debug cargo run -- 3 20
//! ```
//!
//! The first positional argument is the number of cards, the second the
//! starting balance. The report goes to stdout; diagnostics go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success, and also invalid arguments (usage is printed to stderr)
//! - 1: Fatal error (runtime could not start, output could not be written)
//! - 255: Deadlock detected; the partial transaction table was printed

use card_balance_simulator::cli;
use card_balance_simulator::simulation::{run_simulation, EXIT_FAILURE, EXIT_SUCCESS};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Bad arguments are reported but are not a failing exit
    let args = match cli::try_parse_args() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            process::exit(EXIT_SUCCESS);
        }
    };

    let config = match args.to_simulation_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_SUCCESS);
        }
    };

    // stderr stays unlocked: worker threads log to it during the run
    let stdout = std::io::stdout();
    match run_simulation(&config, &mut stdout.lock(), &mut std::io::stderr()) {
        Ok(outcome) => process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_FAILURE);
        }
    }
}
