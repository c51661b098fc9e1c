//! I/O module
//!
//! Handles report output.
//!
//! # Components
//!
//! - `report` - Card summary and audited transaction table

pub mod report;

pub use report::{
    write_card_summary, write_deadlock_notice, write_report, write_transaction_table,
};
