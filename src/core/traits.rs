//! Core traits and their implementations for producing card operations
//!
//! An actor does not decide what to do on its own; it drains an
//! `OperationSource`. This lets the coordinator run the randomized workload
//! while tests and benchmarks drive exact scenarios through the same actor code.

use crate::types::Operation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Trait for producing the operations a single actor performs
///
/// Each call yields the next operation, or `None` once the actor has nothing
/// left to do.
pub trait OperationSource: Send {
    /// Next operation to perform
    fn next_operation(&mut self) -> Option<Operation>;
}

/// Randomized workload of a card
///
/// Each operation is a deposit or a withdrawal with equal probability, with an
/// amount drawn uniformly from `0..MAX_AMOUNT`.
#[derive(Debug)]
pub struct RandomOperations {
    rng: StdRng,
    remaining: usize,
}

impl RandomOperations {
    /// Amount bound used by the card workload (amounts fall in 0..10)
    pub const MAX_AMOUNT: u32 = 10;

    /// Create a source yielding `count` operations from `rng`
    pub fn new(rng: StdRng, count: usize) -> Self {
        Self {
            rng,
            remaining: count,
        }
    }

    /// Create a reproducible source
    pub fn seeded(seed: u64, count: usize) -> Self {
        Self::new(StdRng::seed_from_u64(seed), count)
    }
}

impl OperationSource for RandomOperations {
    fn next_operation(&mut self) -> Option<Operation> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let amount = self.rng.gen_range(0..Self::MAX_AMOUNT);
        if self.rng.gen_bool(0.5) {
            Some(Operation::Withdraw(amount))
        } else {
            Some(Operation::Deposit(amount))
        }
    }
}

/// Fixed sequence of operations, replayed in order
#[derive(Debug, Clone, Default)]
pub struct ScriptedOperations {
    operations: VecDeque<Operation>,
}

impl ScriptedOperations {
    /// Create a source that yields `operations` in order
    pub fn new(operations: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            operations: operations.into_iter().collect(),
        }
    }
}

impl OperationSource for ScriptedOperations {
    fn next_operation(&mut self) -> Option<Operation> {
        self.operations.pop_front()
    }
}
