//! Reward shaping: raw outcome kind (+ observed delay) to a scalar.

/// The three outcome classes the learner distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutcomeKind {
    /// Data satisfied the request.
    Success,
    /// An explicit negative acknowledgment came back.
    Failure,
    /// The request was given up on without any response.
    Drop,
}

/// Reward magnitudes.
///
/// `drop` is meant to be below `failure`: a path that silently loses traffic is
/// worse than one that says so. [`Config::validate`](crate::Config::validate)
/// enforces `drop < failure < 0 < success`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RewardConfig {
    /// Reward for a satisfied request before the delay penalty.
    pub success: f64,
    /// Reward for a negative acknowledgment.
    pub failure: f64,
    /// Reward for a drop / expiry.
    pub drop: f64,
    /// Delay that costs one reward unit on success. `0.0` disables delay shaping.
    pub delay_normalizer_ms: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            success: 10.0,
            failure: -5.0,
            drop: -10.0,
            delay_normalizer_ms: 100.0,
        }
    }
}

/// Pure reward function over [`RewardConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RewardShaper {
    cfg: RewardConfig,
}

impl RewardShaper {
    pub fn new(cfg: RewardConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.cfg
    }

    /// Shaped reward for one outcome.
    ///
    /// On success the delay penalty is `delay / delay_normalizer_ms`, clamped to
    /// `[0, success]`, so a satisfied request never scores below zero. The delay is
    /// ignored for failures and drops.
    pub fn reward(&self, kind: OutcomeKind, observed_delay_ms: Option<f64>) -> f64 {
        match kind {
            OutcomeKind::Success => {
                let base = self.cfg.success;
                let penalty = match observed_delay_ms {
                    Some(d) if d.is_finite() && self.cfg.delay_normalizer_ms > 0.0 => {
                        (d / self.cfg.delay_normalizer_ms).clamp(0.0, base.max(0.0))
                    }
                    _ => 0.0,
                };
                base - penalty
            }
            OutcomeKind::Failure => self.cfg.failure,
            OutcomeKind::Drop => self.cfg.drop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_without_delay_is_full_reward() {
        let r = RewardShaper::default();
        assert_eq!(r.reward(OutcomeKind::Success, None), 10.0);
        assert_eq!(r.reward(OutcomeKind::Success, Some(0.0)), 10.0);
    }

    #[test]
    fn faster_success_scores_higher() {
        let r = RewardShaper::default();
        let fast = r.reward(OutcomeKind::Success, Some(20.0));
        let slow = r.reward(OutcomeKind::Success, Some(300.0));
        assert!((fast - 9.8).abs() < 1e-12);
        assert!((slow - 7.0).abs() < 1e-12);
        assert!(fast > slow);
    }

    #[test]
    fn delay_penalty_is_clamped() {
        let r = RewardShaper::default();
        assert_eq!(r.reward(OutcomeKind::Success, Some(1e9)), 0.0);
        // Negative delays (clock skew) never add reward.
        assert_eq!(r.reward(OutcomeKind::Success, Some(-50.0)), 10.0);
        assert_eq!(r.reward(OutcomeKind::Success, Some(f64::NAN)), 10.0);
    }

    #[test]
    fn zero_normalizer_disables_delay_shaping() {
        let r = RewardShaper::new(RewardConfig {
            delay_normalizer_ms: 0.0,
            ..RewardConfig::default()
        });
        assert_eq!(r.reward(OutcomeKind::Success, Some(500.0)), 10.0);
    }

    #[test]
    fn drop_is_worse_than_failure() {
        let r = RewardShaper::default();
        let fail = r.reward(OutcomeKind::Failure, Some(5.0));
        let drop = r.reward(OutcomeKind::Drop, None);
        assert_eq!(fail, -5.0);
        assert!(drop < fail);
    }
}
