//! Strategy configuration.
//!
//! Start from [`Config::default()`] and adjust with the `with_*` builders or by
//! setting fields directly. [`Strategy::new`](crate::Strategy::new) validates the
//! result, so an out-of-range value is caught once at construction rather than
//! on the forwarding path.

use crate::{Error, RewardConfig, Result, StateDetail};

/// Full configuration for a [`Strategy`](crate::Strategy).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    // --- Learning ---
    /// Learning rate, in `(0, 1]`.
    pub alpha: f64,
    /// Discount factor, in `[0, 1]`.
    pub gamma: f64,

    // --- Exploration ---
    /// Probability of a uniformly random pick, in `[0, 1]`.
    pub epsilon: f64,
    /// Multiplier applied to epsilon after each decision, in `(0, 1]`. `1.0` = constant.
    pub epsilon_decay: f64,
    /// Lower bound for the decayed epsilon, in `[0, epsilon]`.
    pub epsilon_floor: f64,
    /// Seed for the selector's RNG. Same seed + same event sequence = same choices.
    pub seed: u64,

    // --- State ---
    /// Number of leading name components kept in a state key (>= 1).
    pub prefix_depth: usize,
    /// Optional fields folded into state keys.
    pub state_detail: StateDetail,

    // --- Reward ---
    pub rewards: RewardConfig,

    // --- Ledger ---
    /// Age after which a pending decision is treated as dropped by
    /// [`Strategy::expire_stale`](crate::Strategy::expire_stale). `None` leaves
    /// expiry entirely to the forwarder.
    pub pending_timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.1,
            epsilon_decay: 1.0,
            epsilon_floor: 0.0,
            seed: 0,
            prefix_depth: 2,
            state_detail: StateDetail::Basic,
            rewards: RewardConfig::default(),
            pending_timeout_ms: None,
        }
    }
}

impl Config {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Decay epsilon by `decay` per decision down to `floor`.
    pub fn with_epsilon_schedule(mut self, decay: f64, floor: f64) -> Self {
        self.epsilon_decay = decay;
        self.epsilon_floor = floor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_prefix_depth(mut self, depth: usize) -> Self {
        self.prefix_depth = depth;
        self
    }

    pub fn with_state_detail(mut self, detail: StateDetail) -> Self {
        self.state_detail = detail;
        self
    }

    pub fn with_rewards(mut self, rewards: RewardConfig) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_pending_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.pending_timeout_ms = Some(timeout_ms);
        self
    }

    /// Check every range constraint.
    pub fn validate(&self) -> Result<()> {
        check("alpha", self.alpha, self.alpha > 0.0 && self.alpha <= 1.0, "a value in (0, 1]")?;
        check("gamma", self.gamma, (0.0..=1.0).contains(&self.gamma), "a value in [0, 1]")?;
        check(
            "epsilon",
            self.epsilon,
            (0.0..=1.0).contains(&self.epsilon),
            "a value in [0, 1]",
        )?;
        check(
            "epsilon_decay",
            self.epsilon_decay,
            self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0,
            "a value in (0, 1]",
        )?;
        check(
            "epsilon_floor",
            self.epsilon_floor,
            self.epsilon_floor >= 0.0 && self.epsilon_floor <= self.epsilon,
            "a value in [0, epsilon]",
        )?;
        check(
            "prefix_depth",
            self.prefix_depth as f64,
            self.prefix_depth >= 1,
            "at least 1",
        )?;
        if let StateDetail::WithActionsAndDelay { bucket_ms } = self.state_detail {
            check(
                "state_detail.bucket_ms",
                bucket_ms,
                bucket_ms.is_finite() && bucket_ms > 0.0,
                "a positive finite value",
            )?;
        }

        let r = &self.rewards;
        check(
            "rewards.success",
            r.success,
            r.success.is_finite() && r.success > 0.0,
            "a positive finite value",
        )?;
        check(
            "rewards.failure",
            r.failure,
            r.failure.is_finite() && r.failure < 0.0,
            "a negative finite value",
        )?;
        check("rewards.drop", r.drop, r.drop.is_finite(), "a finite value")?;
        if r.drop >= r.failure {
            return Err(Error::InconsistentRewards {
                failure: r.failure,
                drop: r.drop,
            });
        }
        check(
            "rewards.delay_normalizer_ms",
            r.delay_normalizer_ms,
            r.delay_normalizer_ms.is_finite() && r.delay_normalizer_ms >= 0.0,
            "a non-negative finite value",
        )?;
        Ok(())
    }
}

// NaN fails every comparison above, so it is rejected without a separate check.
fn check(name: &'static str, value: f64, ok: bool, expected: &'static str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value,
            expected,
        })
    }
}
