// CLI module
// Command-line interface and argument parsing

mod args;

pub use args::CliArgs;

use clap::Parser;

/// Parse command-line arguments using clap
///
/// Unlike `CliArgs::parse`, a parse failure (including `--help`) is returned
/// to the caller instead of exiting, so the binary decides the exit status.
///
/// # Returns
///
/// * `Ok(CliArgs)` - The parsed arguments
/// * `Err(clap::Error)` - Usage error or help/version request, ready to print
pub fn try_parse_args() -> Result<CliArgs, clap::Error> {
    CliArgs::try_parse()
}
