//! Error types for the card balance simulator
//!
//! # Error Categories
//!
//! - **Configuration Errors**: Invalid startup values, reported before anything runs
//! - **Cancellation**: An actor was interrupted at a suspension point (graceful, not a failure)
//! - **Arithmetic Errors**: A balance update would overflow
//! - **Runtime/Output Errors**: The tokio runtime could not be built, or the report could not be written
//!
//! Insufficient funds is deliberately absent: it is the
//! [`WithdrawOutcome::InsufficientFunds`](super::WithdrawOutcome) outcome.

use super::transaction::ActorId;
use thiserror::Error;

/// Main error type for the simulator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// A configuration value is unusable
    ///
    /// Raised before the simulation starts; the process exits without running.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong with the configuration
        message: String,
    },

    /// The operation was interrupted by the cancellation signal
    ///
    /// Actors convert this into a graceful exit. The interrupted operation
    /// left no trace in the ledger.
    #[error("Operation cancelled for actor {actor}")]
    Cancelled {
        /// Actor whose operation was interrupted
        actor: ActorId,
    },

    /// Balance arithmetic would overflow
    ///
    /// The operation is rejected and the balance is left unchanged.
    #[error("Arithmetic overflow in {operation} for actor {actor}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Actor that requested it
        actor: ActorId,
    },

    /// The async runtime could not be created or a task failed
    #[error("Runtime error: {message}")]
    Runtime {
        /// Description of the runtime failure
        message: String,
    },

    /// Writing the report failed
    #[error("Output error: {message}")]
    Output {
        /// Description of the write failure
        message: String,
    },
}

impl From<std::io::Error> for SimulationError {
    fn from(error: std::io::Error) -> Self {
        SimulationError::Output {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl SimulationError {
    /// Create an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        SimulationError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a Cancelled error
    pub fn cancelled(actor: ActorId) -> Self {
        SimulationError::Cancelled { actor }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, actor: ActorId) -> Self {
        SimulationError::ArithmeticOverflow {
            operation: operation.to_string(),
            actor,
        }
    }

    /// Create a Runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        SimulationError::Runtime {
            message: message.into(),
        }
    }

    /// Whether this error is the cooperative cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SimulationError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::invalid_config(
        SimulationError::InvalidConfig { message: "card count must be positive".to_string() },
        "Invalid configuration: card count must be positive"
    )]
    #[case::cancelled(
        SimulationError::Cancelled { actor: 3 },
        "Operation cancelled for actor 3"
    )]
    #[case::arithmetic_overflow(
        SimulationError::ArithmeticOverflow { operation: "deposit".to_string(), actor: 1 },
        "Arithmetic overflow in deposit for actor 1"
    )]
    #[case::runtime(
        SimulationError::Runtime { message: "no threads".to_string() },
        "Runtime error: no threads"
    )]
    #[case::output(
        SimulationError::Output { message: "Broken pipe".to_string() },
        "Output error: Broken pipe"
    )]
    fn test_error_display(#[case] error: SimulationError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::invalid_config(
        SimulationError::invalid_config("bad"),
        SimulationError::InvalidConfig { message: "bad".to_string() }
    )]
    #[case::cancelled(SimulationError::cancelled(9), SimulationError::Cancelled { actor: 9 })]
    #[case::arithmetic_overflow(
        SimulationError::arithmetic_overflow("withdraw", 2),
        SimulationError::ArithmeticOverflow { operation: "withdraw".to_string(), actor: 2 }
    )]
    fn test_helper_functions(#[case] result: SimulationError, #[case] expected: SimulationError) {
        assert_eq!(result, expected);
    }

    #[test]
    fn test_is_cancelled() {
        assert!(SimulationError::cancelled(1).is_cancelled());
        assert!(!SimulationError::runtime("x").is_cancelled());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "Broken pipe");
        let error: SimulationError = io_error.into();
        assert!(matches!(error, SimulationError::Output { .. }));
        assert_eq!(error.to_string(), "Output error: Broken pipe");
    }
}
