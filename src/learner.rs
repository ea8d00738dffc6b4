//! One-step temporal-difference (Q-learning) update.
//!
//! ```text
//! target = r + gamma * max_a' Q(s', a')
//! Q(s, a) <- Q(s, a) + alpha * (target - Q(s, a))
//! ```
//!
//! `max_a' Q(s', a')` is [`ValueTable::max_value`]: only actions already recorded
//! for `s'` bootstrap, and an unseen `s'` bootstraps `0.0`.

use tracing::{debug, warn};

use crate::{Action, StateKey, ValueTable};

/// What a single update did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TdUpdate {
    /// `Q(s, a)` before the update.
    pub old: f64,
    /// `r + gamma * max Q(s', .)`.
    pub target: f64,
    /// `Q(s, a)` after the update.
    pub new: f64,
}

impl TdUpdate {
    /// `target - old`.
    pub fn td_error(&self) -> f64 {
        self.target - self.old
    }
}

/// TD(0) learner with fixed learning rate and discount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TdLearner {
    alpha: f64,
    gamma: f64,
}

impl TdLearner {
    /// `alpha` in `(0, 1]`, `gamma` in `[0, 1]`. Range checks live in
    /// [`Config::validate`](crate::Config::validate).
    pub fn new(alpha: f64, gamma: f64) -> Self {
        Self { alpha, gamma }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Apply one update to `table`.
    ///
    /// Returns `None` (and writes nothing) if `reward` is not finite.
    pub fn update(
        &self,
        table: &mut ValueTable,
        state: &StateKey,
        action: Action,
        reward: f64,
        next_state: &StateKey,
    ) -> Option<TdUpdate> {
        if !reward.is_finite() {
            warn!(%action, reward, "ignoring non-finite reward");
            return None;
        }
        let old = table.get(state, action);
        let target = reward + self.gamma * table.max_value(next_state);
        let new = old + self.alpha * (target - old);
        table.set(state, action, new);

        debug!(
            prefix = %state.prefix(),
            ingress = %state.ingress(),
            %action,
            reward,
            old,
            target,
            new,
            "td update"
        );
        Some(TdUpdate { old, target, new })
    }
}
