//! Transaction-related types for the card balance simulator
//!
//! This module defines the committed transaction record, the operations a card
//! can request, and the outcome of a withdrawal attempt.

use std::fmt;

/// Actor identifier
///
/// Assigned by the coordinator, starting at 1.
pub type ActorId = u32;

/// A committed mutation of the shared balance
///
/// Created exactly once per commit, while the ledger's commit slot is held.
/// Never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    /// Commit sequence number
    ///
    /// Strictly increasing in commit order, starting at 1.
    pub seq: u64,

    /// Signed amount: negative for a withdrawal, positive for a deposit
    pub amount: i64,

    /// Balance immediately after this transaction committed
    pub result_balance: i64,

    /// The actor that requested the mutation
    pub actor_id: ActorId,
}

impl Transaction {
    /// Whether this transaction removed funds from the balance
    pub fn is_withdrawal(&self) -> bool {
        self.amount < 0
    }

    /// Balance just before this transaction committed
    pub fn previous_balance(&self) -> i64 {
        self.result_balance.wrapping_sub(self.amount)
    }
}

/// An operation a card asks the ledger to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Add funds to the shared balance (always succeeds)
    Deposit(u32),

    /// Remove funds from the shared balance
    ///
    /// Only succeeds when the resulting balance stays strictly positive.
    Withdraw(u32),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deposit(amount) => write!(f, "deposit({})", amount),
            Operation::Withdraw(amount) => write!(f, "withdraw({})", amount),
        }
    }
}

/// Result of a withdrawal attempt against the ledger
///
/// `InsufficientFunds` is the stall condition, not an error: nothing was
/// mutated and nothing was logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawOutcome {
    /// The withdrawal committed and produced this log entry
    Committed(Transaction),

    /// The balance could not cover the withdrawal
    InsufficientFunds {
        /// Balance observed while the commit slot was held
        balance: i64,
    },
}
