//! Shared balance and commit log
//!
//! This module provides the `Ledger` struct, which owns the single balance every
//! card mutates and the append-only log of committed transactions.
//!
//! # Design
//!
//! Every mutation runs inside a `CommitSlot`: a scoped hold on the ledger's
//! async mutex that also raises the `busy` flag. The slot is released when it
//! goes out of scope, so every exit path (commit, insufficient funds, overflow,
//! cancellation) leaves the ledger free for the next waiting mutation.
//!
//! ```text
//! deposit / withdraw
//!     ├── acquire CommitSlot    (cancellable wait, FIFO over waiters)
//!     ├── read balance
//!     ├── decide                (withdraw may release here: InsufficientFunds)
//!     ├── commit latency        (cancellable, slot still held)
//!     └── commit                (balance + log entry, then slot dropped)
//! ```
//!
//! # Thread Safety
//!
//! The log sits behind its own lock and is only appended to while the commit
//! slot is held, so log order is commit order. Readers of the log never wait for
//! a whole mutation, only for the append itself.

use crate::types::{ActorId, SimulationError, Transaction, WithdrawOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// State guarded by the commit slot
#[derive(Debug)]
struct LedgerState {
    balance: i64,
    next_seq: u64,
}

/// Exclusive right to mutate the ledger
///
/// Holding one means no other mutation is in flight. Dropping it clears the
/// busy flag before the mutex guard is released.
struct CommitSlot<'a> {
    state: MutexGuard<'a, LedgerState>,
    busy: &'a AtomicBool,
}

impl Drop for CommitSlot<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// The shared account every card deposits into and withdraws from
#[derive(Debug)]
pub struct Ledger {
    /// Balance at construction, kept for auditing the log
    initial_balance: i64,

    /// Balance and sequence counter; the mutex is the commit slot
    state: Mutex<LedgerState>,

    /// True while a mutation holds the commit slot
    busy: AtomicBool,

    /// Committed transactions in commit order
    log: RwLock<Vec<Transaction>>,

    /// Simulated processing time between reading and committing the balance
    commit_latency: Duration,
}

impl Ledger {
    /// Create a ledger with no simulated commit latency
    pub fn new(initial_balance: i64) -> Self {
        Self::with_commit_latency(initial_balance, Duration::ZERO)
    }

    /// Create a ledger whose mutations take `commit_latency` while holding the slot
    pub fn with_commit_latency(initial_balance: i64, commit_latency: Duration) -> Self {
        Self {
            initial_balance,
            state: Mutex::new(LedgerState {
                balance: initial_balance,
                next_seq: 1,
            }),
            busy: AtomicBool::new(false),
            log: RwLock::new(Vec::new()),
            commit_latency,
        }
    }

    /// Balance the ledger was created with
    pub fn initial_balance(&self) -> i64 {
        self.initial_balance
    }

    /// Current committed balance
    ///
    /// Waits for any in-flight mutation to finish so the value is never a
    /// half-applied one.
    pub async fn balance(&self) -> i64 {
        self.state.lock().await.balance
    }

    /// Whether a mutation currently holds the commit slot
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Deposit `amount` on behalf of `actor`
    ///
    /// Always commits unless cancelled or the balance would overflow.
    ///
    /// # Returns
    ///
    /// * `Ok(Transaction)` - The committed log entry
    /// * `Err(SimulationError::Cancelled)` - `cancel` fired while waiting; nothing was committed
    /// * `Err(SimulationError::ArithmeticOverflow)` - The balance would overflow; nothing was committed
    pub async fn deposit(
        &self,
        amount: u32,
        actor: ActorId,
        cancel: &CancellationToken,
    ) -> Result<Transaction, SimulationError> {
        let mut slot = self.acquire(actor, cancel).await?;

        let current = slot.state.balance;
        let result = current
            .checked_add(i64::from(amount))
            .ok_or_else(|| SimulationError::arithmetic_overflow("deposit", actor))?;

        self.simulate_latency(actor, cancel).await?;

        let tx = self.commit(&mut slot, i64::from(amount), result, actor);
        tracing::debug!(actor, amount, balance = result, seq = tx.seq, "deposit committed");
        Ok(tx)
    }

    /// Withdraw `amount` on behalf of `actor`
    ///
    /// The withdrawal only commits when the balance is positive and stays
    /// strictly positive afterwards.
    ///
    /// # Returns
    ///
    /// * `Ok(WithdrawOutcome::Committed)` - The committed log entry
    /// * `Ok(WithdrawOutcome::InsufficientFunds)` - The slot was released with no side effect
    /// * `Err(SimulationError::Cancelled)` - `cancel` fired while waiting; nothing was committed
    pub async fn withdraw(
        &self,
        amount: u32,
        actor: ActorId,
        cancel: &CancellationToken,
    ) -> Result<WithdrawOutcome, SimulationError> {
        let mut slot = self.acquire(actor, cancel).await?;

        let current = slot.state.balance;
        // current > 0 is checked first, so the subtraction cannot overflow
        if current <= 0 || current - i64::from(amount) <= 0 {
            tracing::trace!(actor, amount, balance = current, "insufficient funds");
            return Ok(WithdrawOutcome::InsufficientFunds { balance: current });
        }
        let result = current - i64::from(amount);

        self.simulate_latency(actor, cancel).await?;

        let tx = self.commit(&mut slot, -i64::from(amount), result, actor);
        tracing::debug!(actor, amount, balance = result, seq = tx.seq, "withdrawal committed");
        Ok(WithdrawOutcome::Committed(tx))
    }

    /// First `upto` committed transactions, in commit order
    ///
    /// `upto` is clamped to the current log length.
    pub fn snapshot(&self, upto: usize) -> Vec<Transaction> {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        log.iter().take(upto).copied().collect()
    }

    /// Number of committed transactions
    pub fn size(&self) -> usize {
        self.log.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    async fn acquire(
        &self,
        actor: ActorId,
        cancel: &CancellationToken,
    ) -> Result<CommitSlot<'_>, SimulationError> {
        let state = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SimulationError::cancelled(actor)),
            state = self.state.lock() => state,
        };
        self.busy.store(true, Ordering::Release);

        Ok(CommitSlot {
            state,
            busy: &self.busy,
        })
    }

    async fn simulate_latency(
        &self,
        actor: ActorId,
        cancel: &CancellationToken,
    ) -> Result<(), SimulationError> {
        if self.commit_latency.is_zero() {
            return Ok(());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SimulationError::cancelled(actor)),
            _ = tokio::time::sleep(self.commit_latency) => Ok(()),
        }
    }

    fn commit(
        &self,
        slot: &mut CommitSlot<'_>,
        amount: i64,
        result_balance: i64,
        actor: ActorId,
    ) -> Transaction {
        let seq = slot.state.next_seq;
        slot.state.next_seq += 1;
        slot.state.balance = result_balance;

        let tx = Transaction {
            seq,
            amount,
            result_balance,
            actor_id: actor,
        };
        self.log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        tx
    }
}
