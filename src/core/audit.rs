//! Balance consistency check over a committed log
//!
//! Each entry must move the balance from the previous entry's result (or the
//! initial balance for the first entry) by exactly its signed amount. The check
//! always continues past a mismatch, comparing the next entry against the
//! balance that was actually recorded.

use crate::types::Transaction;

/// A log entry whose recorded balance disagrees with its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditMismatch {
    /// Position of the entry in the audited slice
    pub index: usize,

    /// `previous balance + signed amount`
    pub expected_balance: i64,

    /// `result_balance` recorded in the entry
    pub actual_balance: i64,
}

/// Check every adjacent pair of `entries`, starting from `initial_balance`
///
/// # Returns
///
/// One `AuditMismatch` per inconsistent entry. An empty vector means the log
/// is consistent.
pub fn audit_log(initial_balance: i64, entries: &[Transaction]) -> Vec<AuditMismatch> {
    let mut previous = initial_balance;
    let mut mismatches = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.previous_balance() != previous {
            mismatches.push(AuditMismatch {
                index,
                expected_balance: previous.wrapping_add(entry.amount),
                actual_balance: entry.result_balance,
            });
        }
        previous = entry.result_balance;
    }

    mismatches
}
