//! Report output for a finished run
//!
//! This module renders what the coordinator returned:
//! - one `CARD <id> <net>` line per card that ran to completion
//! - the transaction table, each row checked against the previous balance
//!
//! An audit mismatch is flagged on the line after the offending row; it never
//! stops the rest of the table from being written.

use crate::core::audit::audit_log;
use crate::core::SimulationOutcome;
use crate::types::{ActorReport, SimulationError, Transaction};
use std::collections::HashSet;
use std::io::Write;

/// Line written after a row that fails the balance audit
pub const AUDIT_ERROR_LINE: &str = " ERROR CONDITION ERROR CONDITION ERROR CONDITION";

/// Message for the error stream when a run ends in deadlock
pub const DEADLOCK_MESSAGE: &str =
    "DEADLOCK DETECTED. Show all successful transactions then EXIT.";

const COLUMN_WIDTH: usize = 13;

/// Write the full report for `outcome`
///
/// Card summaries are only written for runs that completed, matching the
/// point at which a card would announce its own result. A deadlocked run
/// announces the abort on `diagnostics` before any of the table is written.
pub fn write_report(
    outcome: &SimulationOutcome,
    output: &mut dyn Write,
    diagnostics: &mut dyn Write,
) -> Result<(), SimulationError> {
    if outcome.is_deadlocked() {
        write_deadlock_notice(diagnostics)?;
    } else {
        write_card_summary(&outcome.reports, output)?;
    }
    write_transaction_table(outcome.initial_balance, &outcome.log, output)?;
    output.flush()?;
    Ok(())
}

/// Write the deadlock announcement, preceded by a blank line
pub fn write_deadlock_notice(diagnostics: &mut dyn Write) -> Result<(), SimulationError> {
    writeln!(diagnostics)?;
    writeln!(diagnostics, "{}", DEADLOCK_MESSAGE)?;
    diagnostics.flush()?;
    Ok(())
}

/// Write one `CARD <id> <net>` line per completed card
pub fn write_card_summary(
    reports: &[ActorReport],
    output: &mut dyn Write,
) -> Result<(), SimulationError> {
    for report in reports.iter().filter(|report| report.is_completed()) {
        writeln!(output, "CARD {} {}", report.id, report.net_delta)?;
    }
    Ok(())
}

/// Write the transaction table for `entries`
///
/// # Returns
///
/// The number of rows that failed the audit.
pub fn write_transaction_table(
    initial_balance: i64,
    entries: &[Transaction],
    output: &mut dyn Write,
) -> Result<usize, SimulationError> {
    let mismatched: HashSet<usize> = audit_log(initial_balance, entries)
        .into_iter()
        .map(|mismatch| mismatch.index)
        .collect();

    writeln!(output)?;
    write_row(output, "Transaction", "Withdrawal", "Deposit", "Balance")?;
    write_row(output, "", "", "", &initial_balance.to_string())?;

    for (index, entry) in entries.iter().enumerate() {
        let label = format!("{}({})", index + 1, entry.actor_id);
        let amount = entry.amount.unsigned_abs().to_string();
        let (withdrawal, deposit) = if entry.is_withdrawal() {
            (amount.as_str(), "")
        } else {
            ("", amount.as_str())
        };

        write_row(output, &label, withdrawal, deposit, &entry.result_balance.to_string())?;

        if mismatched.contains(&index) {
            writeln!(output, "{}", AUDIT_ERROR_LINE)?;
        }
    }

    Ok(mismatched.len())
}

fn write_row(
    output: &mut dyn Write,
    transaction: &str,
    withdrawal: &str,
    deposit: &str,
    balance: &str,
) -> std::io::Result<()> {
    writeln!(
        output,
        "{:<w$}{:<w$}{:<w$}{:<w$}",
        transaction,
        withdrawal,
        deposit,
        balance,
        w = COLUMN_WIDTH
    )
}
