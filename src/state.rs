//! State keys: the canonical decision context that indexes learned values.
//!
//! A [`StateKey`] is built fresh for every decision and every outcome. It must be
//! deterministic in its inputs so that repeated decisions for the same logical
//! context land on the same value-table rows.
//!
//! How much context goes into the key is controlled by [`StateDetail`]:
//! - [`StateDetail::Basic`]: truncated name prefix + ingress face.
//! - [`StateDetail::WithActions`]: plus the (sorted) candidate set, so the same
//!   prefix reached through a different set of live links is a different state.
//! - [`StateDetail::WithActionsAndDelay`]: plus a quantized mean delay across the
//!   candidates. Delay is bucketed so the key keeps a total order.
//!
//! Truncation drops version/segment suffixes: `/prefix/video/v=2/seg=17` and
//! `/prefix/video/v=2/seg=18` share a state at depth 2.

use std::fmt;

use crate::{Action, FaceId, Name};

/// Which optional fields are folded into a [`StateKey`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateDetail {
    /// Prefix and ingress face only.
    #[default]
    Basic,
    /// Prefix, ingress face, and the candidate action set.
    WithActions,
    /// Prefix, ingress face, candidate set, and mean candidate delay in buckets of `bucket_ms`.
    WithActionsAndDelay { bucket_ms: f64 },
}

/// Canonical, totally ordered decision context.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateKey {
    prefix: Name,
    ingress: FaceId,
    actions: Option<Vec<Action>>,
    delay_bucket: Option<u32>,
}

impl StateKey {
    /// A basic key with no action summary or delay bucket.
    pub fn new(prefix: Name, ingress: FaceId) -> Self {
        Self {
            prefix,
            ingress,
            actions: None,
            delay_bucket: None,
        }
    }

    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    pub fn ingress(&self) -> FaceId {
        self.ingress
    }

    /// Sorted, de-duplicated candidate set (when the builder folds it in).
    pub fn actions(&self) -> Option<&[Action]> {
        self.actions.as_deref()
    }

    pub fn delay_bucket(&self) -> Option<u32> {
        self.delay_bucket
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.prefix, self.ingress)?;
        if let Some(actions) = &self.actions {
            let joined: Vec<String> = actions.iter().map(|a| a.0.to_string()).collect();
            write!(f, "[{}]", joined.join(","))?;
        }
        if let Some(bucket) = self.delay_bucket {
            write!(f, "~{bucket}")?;
        }
        Ok(())
    }
}

/// Builds [`StateKey`]s from request context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateKeyBuilder {
    prefix_depth: usize,
    detail: StateDetail,
}

impl Default for StateKeyBuilder {
    fn default() -> Self {
        Self {
            prefix_depth: 2,
            detail: StateDetail::Basic,
        }
    }
}

impl StateKeyBuilder {
    pub fn new(prefix_depth: usize, detail: StateDetail) -> Self {
        Self {
            prefix_depth,
            detail,
        }
    }

    pub fn prefix_depth(&self) -> usize {
        self.prefix_depth
    }

    pub fn detail(&self) -> StateDetail {
        self.detail
    }

    /// Whether [`build`](Self::build) looks at `mean_delay_ms` at all.
    ///
    /// Callers can skip computing the delay summary when this is false.
    pub fn wants_delay(&self) -> bool {
        matches!(self.detail, StateDetail::WithActionsAndDelay { .. })
    }

    /// Build a key. Never fails.
    ///
    /// `candidates` and `mean_delay_ms` are ignored unless the configured detail
    /// level uses them.
    pub fn build(
        &self,
        name: &Name,
        ingress: FaceId,
        candidates: &[Action],
        mean_delay_ms: Option<f64>,
    ) -> StateKey {
        let prefix = name.prefix(self.prefix_depth);
        match self.detail {
            StateDetail::Basic => StateKey::new(prefix, ingress),
            StateDetail::WithActions => StateKey {
                prefix,
                ingress,
                actions: Some(action_summary(candidates)),
                delay_bucket: None,
            },
            StateDetail::WithActionsAndDelay { bucket_ms } => StateKey {
                prefix,
                ingress,
                actions: Some(action_summary(candidates)),
                delay_bucket: mean_delay_ms.and_then(|d| delay_bucket(d, bucket_ms)),
            },
        }
    }
}

fn action_summary(candidates: &[Action]) -> Vec<Action> {
    let mut v = candidates.to_vec();
    v.sort_unstable();
    v.dedup();
    v
}

fn delay_bucket(delay_ms: f64, bucket_ms: f64) -> Option<u32> {
    if !delay_ms.is_finite() || delay_ms < 0.0 || !bucket_ms.is_finite() || bucket_ms <= 0.0 {
        return None;
    }
    // Saturating float->int cast caps absurd delays at u32::MAX.
    Some((delay_ms / bucket_ms).floor() as u32)
}

/// Mean of the known per-link delays, or `None` if no link reported one.
pub fn mean_delay_ms<I>(delays: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, n) = delays
        .into_iter()
        .flatten()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .fold((0.0, 0u32), |(s, n), d| (s + d, n + 1));
    (n > 0).then(|| sum / f64::from(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faces(ids: &[u64]) -> Vec<FaceId> {
        ids.iter().copied().map(FaceId).collect()
    }

    #[test]
    fn truncation_merges_segments_of_one_object() {
        let b = StateKeyBuilder::default();
        let s1 = b.build(&Name::parse("/prefix/video/seg=1"), FaceId(1), &[], None);
        let s2 = b.build(&Name::parse("/prefix/video/seg=2"), FaceId(1), &[], None);
        assert_eq!(s1, s2);
        assert_eq!(s1.prefix(), &Name::parse("/prefix/video"));
    }

    #[test]
    fn short_names_are_kept_whole() {
        let b = StateKeyBuilder::new(3, StateDetail::Basic);
        let s = b.build(&Name::parse("/p"), FaceId(7), &[], None);
        assert_eq!(s.prefix(), &Name::parse("/p"));
        assert_eq!(s.ingress(), FaceId(7));
    }

    #[test]
    fn ingress_distinguishes_states() {
        let b = StateKeyBuilder::default();
        let n = Name::parse("/a/b");
        assert_ne!(b.build(&n, FaceId(1), &[], None), b.build(&n, FaceId(2), &[], None));
    }

    #[test]
    fn basic_detail_ignores_candidates_and_delay() {
        let b = StateKeyBuilder::default();
        let n = Name::parse("/a/b");
        let s1 = b.build(&n, FaceId(1), &faces(&[1, 2]), Some(10.0));
        let s2 = b.build(&n, FaceId(1), &faces(&[3]), None);
        assert_eq!(s1, s2);
        assert!(s1.actions().is_none());
        assert!(!b.wants_delay());
    }

    #[test]
    fn action_summary_is_order_insensitive() {
        let b = StateKeyBuilder::new(2, StateDetail::WithActions);
        let n = Name::parse("/a/b");
        let s1 = b.build(&n, FaceId(1), &faces(&[3, 1, 2, 1]), None);
        let s2 = b.build(&n, FaceId(1), &faces(&[1, 2, 3]), None);
        assert_eq!(s1, s2);
        assert_eq!(s1.actions(), Some(&faces(&[1, 2, 3])[..]));
        let s3 = b.build(&n, FaceId(1), &faces(&[1, 2]), None);
        assert_ne!(s1, s3);
    }

    #[test]
    fn delay_is_bucketed() {
        let b = StateKeyBuilder::new(2, StateDetail::WithActionsAndDelay { bucket_ms: 10.0 });
        assert!(b.wants_delay());
        let n = Name::parse("/a/b");
        let c = faces(&[1, 2]);
        let fast = b.build(&n, FaceId(1), &c, Some(12.0));
        let also_fast = b.build(&n, FaceId(1), &c, Some(19.9));
        let slow = b.build(&n, FaceId(1), &c, Some(55.0));
        assert_eq!(fast, also_fast);
        assert_eq!(fast.delay_bucket(), Some(1));
        assert_eq!(slow.delay_bucket(), Some(5));
        assert_eq!(b.build(&n, FaceId(1), &c, Some(f64::NAN)).delay_bucket(), None);
        assert_eq!(b.build(&n, FaceId(1), &c, None).delay_bucket(), None);
    }

    #[test]
    fn mean_delay_skips_unknown_links() {
        assert_eq!(mean_delay_ms([Some(10.0), None, Some(30.0)]), Some(20.0));
        assert_eq!(mean_delay_ms([None, None]), None);
        assert_eq!(mean_delay_ms([Some(f64::INFINITY), Some(4.0)]), Some(4.0));
    }

    #[test]
    fn display_shows_every_folded_field() {
        let n = Name::parse("/a/b/c");
        let basic = StateKeyBuilder::default().build(&n, FaceId(4), &[], None);
        assert_eq!(basic.to_string(), "/a/b@face4");
        let rich = StateKeyBuilder::new(2, StateDetail::WithActionsAndDelay { bucket_ms: 10.0 })
            .build(&n, FaceId(4), &faces(&[2, 1]), Some(25.0));
        assert_eq!(rich.to_string(), "/a/b@face4[1,2]~2");
    }
}
