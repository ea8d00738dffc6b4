//! Epsilon-greedy action selection over a [`ValueTable`].
//!
//! - With probability `epsilon`: pick a candidate uniformly at random (explore).
//! - Otherwise: [`ValueTable::best_action`] (exploit), which falls back to the first
//!   candidate when nothing is recorded yet.
//!
//! The explore/exploit coin and the explore index are two independent draws from
//! one seeded `StdRng` owned by the selector. Either way the returned action is a
//! member of the supplied candidates.
//!
//! An optional multiplicative schedule (`decay`, floored at `floor`) shrinks
//! epsilon after every decision; the default `decay = 1.0` keeps it constant.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Action, StateKey, ValueTable};

/// Which branch produced a [`Choice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChoiceMode {
    /// Uniform random candidate.
    Explore,
    /// Highest-valued candidate (first on ties).
    Exploit,
}

/// Output of [`EpsilonGreedy::choose`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Choice {
    pub action: Action,
    pub mode: ChoiceMode,
    /// Value of `action` in the table at decision time.
    pub value: f64,
}

/// Seedable epsilon-greedy selector.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    epsilon: f64,
    decay: f64,
    floor: f64,
    rng: StdRng,
}

impl EpsilonGreedy {
    /// Constant-epsilon selector with a fixed seed.
    pub fn new(epsilon: f64, seed: u64) -> Self {
        Self::with_schedule(epsilon, 1.0, 0.0, seed)
    }

    /// Selector whose epsilon is multiplied by `decay` after every decision,
    /// never dropping below `floor`.
    pub fn with_schedule(epsilon: f64, decay: f64, floor: f64, seed: u64) -> Self {
        Self {
            epsilon,
            decay,
            floor,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Current exploration probability.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Pick one of `candidates` for `state`.
    ///
    /// Returns `None` only if `candidates` is empty.
    pub fn choose(
        &mut self,
        table: &ValueTable,
        state: &StateKey,
        candidates: &[Action],
    ) -> Option<Choice> {
        if candidates.is_empty() {
            return None;
        }
        let coin: f64 = self.rng.random();
        let choice = if coin < self.epsilon {
            let idx = self.rng.random_range(0..candidates.len());
            let action = candidates[idx];
            Choice {
                action,
                mode: ChoiceMode::Explore,
                value: table.get(state, action),
            }
        } else {
            let (action, value) = table.best_action(state, candidates)?;
            Choice {
                action,
                mode: ChoiceMode::Exploit,
                value,
            }
        };
        self.step_schedule();
        Some(choice)
    }

    fn step_schedule(&mut self) {
        if self.decay < 1.0 {
            self.epsilon = (self.epsilon * self.decay).max(self.floor);
        }
    }
}
