//! Spawning the cards and handling the global abort
//!
//! This module provides the `Coordinator` struct, which owns the ledger and the
//! deadlock tracker for one run, spawns one tokio task per card and waits for
//! either outcome:
//!
//! - every card finishes: the whole log is reported;
//! - a card reports that all active cards are stalled: every card is cancelled,
//!   the coordinator waits for all of them to stop, and the log is reported
//!   without its unverified tail.
//!
//! Only the first deadlock report is acted upon; later ones are ignored.

use super::actor::{Actor, ActorContext};
use super::deadlock_tracker::DeadlockTracker;
use super::ledger::Ledger;
use super::traits::{OperationSource, RandomOperations};
use crate::simulation::SimulationConfig;
use crate::types::{ActorId, ActorReport, DeadlockReport, Transaction};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::{mpsc, Barrier};
use tokio_util::sync::CancellationToken;

/// Result of a simulation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// Balance the ledger started with
    pub initial_balance: i64,

    /// Reported log, in commit order
    ///
    /// On deadlock this may be shorter than `total_committed`.
    pub log: Vec<Transaction>,

    /// Number of transactions the ledger committed
    pub total_committed: usize,

    /// One report per card, sorted by id
    pub reports: Vec<ActorReport>,

    /// Set when the run ended in a global deadlock
    pub deadlock: Option<DeadlockReport>,
}

impl SimulationOutcome {
    /// Whether the run was aborted by deadlock detection
    pub fn is_deadlocked(&self) -> bool {
        self.deadlock.is_some()
    }
}

/// Runs one simulation from a configuration
#[derive(Debug, Clone)]
pub struct Coordinator {
    config: SimulationConfig,
}

impl Coordinator {
    /// Create a coordinator for `config`
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Run `card_count` cards with the randomized workload
    pub async fn run(&self) -> SimulationOutcome {
        let sources = (1..=self.card_ids_end())
            .map(|id| {
                let rng = self.rng_for(id, 0);
                Box::new(RandomOperations::new(rng, self.config.iterations))
                    as Box<dyn OperationSource>
            })
            .collect();

        self.run_with_sources(sources).await
    }

    /// Run one card per source; card ids are assigned 1, 2, ... in order
    ///
    /// `card_count` in the configuration is ignored in favour of `sources.len()`.
    pub async fn run_with_sources(
        &self,
        sources: Vec<Box<dyn OperationSource>>,
    ) -> SimulationOutcome {
        let actor_count = sources.len();
        let ledger = Arc::new(Ledger::with_commit_latency(
            self.config.starting_balance,
            self.config.commit_latency,
        ));

        if actor_count == 0 {
            return SimulationOutcome {
                initial_balance: ledger.initial_balance(),
                log: Vec::new(),
                total_committed: 0,
                reports: Vec::new(),
                deadlock: None,
            };
        }

        let tracker = Arc::new(DeadlockTracker::new(actor_count));
        let cancel = CancellationToken::new();
        let (deadlock_tx, mut deadlock_rx) = mpsc::unbounded_channel();

        let ctx = ActorContext {
            ledger: Arc::clone(&ledger),
            tracker: Arc::clone(&tracker),
            cancel: cancel.clone(),
            deadlock_tx,
            start: Some(Arc::new(Barrier::new(actor_count))),
            timing: self.config.actor_timing(),
        };

        tracing::info!(
            cards = actor_count,
            starting_balance = self.config.starting_balance,
            "starting simulation"
        );

        let handles: Vec<_> = sources
            .into_iter()
            .zip(1..)
            .map(|(source, id): (_, ActorId)| {
                let actor = Actor::new(id, source, self.rng_for(id, 1), ctx.clone());
                tokio::spawn(actor.run())
            })
            .collect();

        // The channel closes once every card has dropped its sender
        drop(ctx);

        let mut joined = Box::pin(futures::future::join_all(handles));
        let (results, deadlock) = tokio::select! {
            results = &mut joined => (results, None),
            Some(report) = deadlock_rx.recv() => {
                tracing::warn!(
                    detected_by = report.detected_by,
                    active = report.active_actors,
                    "deadlock detected, cancelling all cards"
                );
                cancel.cancel();
                (joined.await, Some(report))
            }
        };

        let mut reports = Vec::with_capacity(actor_count);
        for result in results {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!("Card task panicked: {:?}", e),
            }
        }
        reports.sort_by_key(|report| report.id);

        if ledger.is_busy() {
            tracing::warn!("ledger still busy after all cards stopped");
        }

        let total_committed = ledger.size();
        let upto = match deadlock {
            Some(_) if self.config.trim_unverified_tail => {
                total_committed.saturating_sub(actor_count - 1)
            }
            _ => total_committed,
        };

        SimulationOutcome {
            initial_balance: ledger.initial_balance(),
            log: ledger.snapshot(upto),
            total_committed,
            reports,
            deadlock,
        }
    }

    fn card_ids_end(&self) -> ActorId {
        ActorId::try_from(self.config.card_count).unwrap_or(ActorId::MAX)
    }

    /// Per-card generator; `stream` separates operation and backoff randomness
    fn rng_for(&self, id: ActorId, stream: u64) -> StdRng {
        match self.config.seed {
            Some(seed) => {
                StdRng::seed_from_u64(seed.wrapping_add(u64::from(id) * 2 + stream))
            }
            None => StdRng::from_entropy(),
        }
    }
}
