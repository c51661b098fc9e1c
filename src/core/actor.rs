//! A single card issuing operations against the shared ledger
//!
//! # Lifecycle
//!
//! ```text
//! register ── start barrier ──┬─> deposit ───────────────────────┬─> pacing ─> ... ─> unregister (Completed)
//!                             └─> withdraw ─┬─ committed ────────┘
//!                                           └─ insufficient funds
//!                                                ├─ all stalled: signal coordinator, wait for cancel
//!                                                └─ otherwise: random backoff, retry same amount
//! ```
//!
//! Every suspension point (start barrier, ledger slot, commit latency, pacing,
//! backoff) is raced against the cancellation token. A cancelled actor
//! unregisters and reports what it committed so far.

use super::deadlock_tracker::DeadlockTracker;
use super::ledger::Ledger;
use super::traits::OperationSource;
use crate::types::{
    ActorExit, ActorId, ActorReport, DeadlockReport, Operation, SimulationError, Transaction,
    WithdrawOutcome,
};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Barrier};
use tokio_util::sync::CancellationToken;

/// Delays an actor observes between and within operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorTiming {
    /// Pause between two consecutive operations
    pub pacing: Duration,

    /// Upper bound of the random backoff after a stalled withdrawal
    ///
    /// Backoff is uniform over 1 ms ..= `max_backoff` (at least 1 ms).
    pub max_backoff: Duration,
}

impl Default for ActorTiming {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(200),
            max_backoff: Duration::from_millis(200),
        }
    }
}

/// Everything an actor shares with the coordinator and the other actors
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub ledger: Arc<Ledger>,
    pub tracker: Arc<DeadlockTracker>,
    pub cancel: CancellationToken,
    pub deadlock_tx: mpsc::UnboundedSender<DeadlockReport>,
    /// Released once every actor has registered; `None` starts immediately
    pub start: Option<Arc<Barrier>>,
    pub timing: ActorTiming,
}

impl ActorContext {
    /// Sleep for `delay` unless cancellation fires first
    async fn pause(&self, actor: ActorId, delay: Duration) -> Result<(), SimulationError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SimulationError::cancelled(actor)),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

/// A card: drains its operation source against the ledger
pub struct Actor {
    id: ActorId,
    net_delta: i64,
    completed_operations: usize,
    source: Box<dyn OperationSource>,
    /// Backoff randomness
    rng: StdRng,
    ctx: ActorContext,
}

impl Actor {
    /// Create an actor that will perform the operations of `source`
    pub fn new(
        id: ActorId,
        source: Box<dyn OperationSource>,
        rng: StdRng,
        ctx: ActorContext,
    ) -> Self {
        Self {
            id,
            net_delta: 0,
            completed_operations: 0,
            source,
            rng,
            ctx,
        }
    }

    /// Run until the source is exhausted or the actor is cancelled
    ///
    /// The actor is registered with the tracker for exactly the duration of
    /// this call.
    pub async fn run(mut self) -> ActorReport {
        self.ctx.tracker.register(self.id);
        tracing::info!(actor = self.id, "actor started");

        let result = self.run_operations().await;
        self.ctx.tracker.unregister(self.id);

        let exit = match result {
            Ok(()) => ActorExit::Completed,
            Err(e) if e.is_cancelled() => ActorExit::Cancelled,
            Err(e) => {
                tracing::error!(actor = self.id, error = %e, "actor stopped");
                ActorExit::Failed
            }
        };
        tracing::info!(
            actor = self.id,
            net_delta = self.net_delta,
            operations = self.completed_operations,
            ?exit,
            "actor finished"
        );

        ActorReport {
            id: self.id,
            net_delta: self.net_delta,
            completed_operations: self.completed_operations,
            exit,
        }
    }

    async fn run_operations(&mut self) -> Result<(), SimulationError> {
        if let Some(start) = self.ctx.start.clone() {
            tokio::select! {
                biased;
                _ = self.ctx.cancel.cancelled() => return Err(SimulationError::cancelled(self.id)),
                _ = start.wait() => {}
            }
        }

        let mut first = true;
        while let Some(operation) = self.source.next_operation() {
            if self.ctx.cancel.is_cancelled() {
                return Err(SimulationError::cancelled(self.id));
            }
            if !first {
                self.ctx.pause(self.id, self.ctx.timing.pacing).await?;
            }
            first = false;

            tracing::debug!(actor = self.id, %operation, "performing operation");
            let committed = self.perform(operation).await?;
            self.net_delta += committed.amount;
            self.completed_operations += 1;
        }

        Ok(())
    }

    async fn perform(&mut self, operation: Operation) -> Result<Transaction, SimulationError> {
        match operation {
            Operation::Deposit(amount) => {
                self.ctx
                    .ledger
                    .deposit(amount, self.id, &self.ctx.cancel)
                    .await
            }
            Operation::Withdraw(amount) => self.withdraw_until_committed(amount).await,
        }
    }

    /// Retry a withdrawal of the same amount until it commits
    ///
    /// The actor stays marked as stalled from the first failed attempt until a
    /// retry commits.
    async fn withdraw_until_committed(
        &mut self,
        amount: u32,
    ) -> Result<Transaction, SimulationError> {
        loop {
            let outcome = self
                .ctx
                .ledger
                .withdraw(amount, self.id, &self.ctx.cancel)
                .await?;

            match outcome {
                WithdrawOutcome::Committed(tx) => {
                    self.ctx.tracker.clear_stalled(self.id);
                    return Ok(tx);
                }
                WithdrawOutcome::InsufficientFunds { balance } => {
                    tracing::debug!(actor = self.id, amount, balance, "withdrawal stalled");

                    if self.ctx.tracker.stall_and_check(self.id) && self.signal_deadlock() {
                        // The coordinator will cancel everyone; nothing left to do until then
                        self.ctx.cancel.cancelled().await;
                        return Err(SimulationError::cancelled(self.id));
                    }

                    let delay = self.backoff_delay();
                    self.ctx.pause(self.id, delay).await?;
                }
            }
        }
    }

    /// Tell the coordinator every active actor is stalled
    ///
    /// Returns `false` if nobody is listening for the signal.
    fn signal_deadlock(&self) -> bool {
        let report = DeadlockReport {
            detected_by: self.id,
            active_actors: self.ctx.tracker.active_count(),
            log_len: self.ctx.ledger.size(),
        };
        tracing::warn!(
            actor = self.id,
            active = report.active_actors,
            log_len = report.log_len,
            "all active actors stalled"
        );

        if self.ctx.deadlock_tx.send(report).is_err() {
            tracing::warn!(actor = self.id, "no coordinator listening for deadlock");
            return false;
        }
        true
    }

    fn backoff_delay(&mut self) -> Duration {
        let max_ms = u64::try_from(self.ctx.timing.max_backoff.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);
        Duration::from_millis(self.rng.gen_range(1..=max_ms))
    }
}
