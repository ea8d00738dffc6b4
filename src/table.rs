//! The value table: `(StateKey, Action) -> f64`.
//!
//! Absent entries read as `0.0`; nothing is ever deleted. Rows are kept in
//! `BTreeMap`s so iteration order (and therefore any diagnostics built on it) is
//! deterministic.

use std::collections::BTreeMap;

use crate::{Action, StateKey};

/// Learned action values per state.
#[derive(Debug, Clone, Default)]
pub struct ValueTable {
    rows: BTreeMap<StateKey, BTreeMap<Action, f64>>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value, or `0.0` if `(state, action)` was never written.
    pub fn get(&self, state: &StateKey, action: Action) -> f64 {
        self.rows
            .get(state)
            .and_then(|row| row.get(&action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Insert or overwrite a value.
    pub fn set(&mut self, state: &StateKey, action: Action, value: f64) {
        match self.rows.get_mut(state) {
            Some(row) => {
                row.insert(action, value);
            }
            None => {
                self.rows
                    .insert(state.clone(), BTreeMap::from([(action, value)]));
            }
        }
    }

    /// Highest-valued candidate for `state`.
    ///
    /// Unrecorded candidates count as `0.0`. Ties go to the candidate that comes
    /// first in `candidates`, so with an empty table this returns the first
    /// candidate. Returns `None` only when `candidates` is empty.
    pub fn best_action(&self, state: &StateKey, candidates: &[Action]) -> Option<(Action, f64)> {
        let row = self.rows.get(state);
        let mut best: Option<(Action, f64)> = None;
        for &a in candidates {
            let v = row.and_then(|r| r.get(&a)).copied().unwrap_or(0.0);
            // Strict `>` keeps the earliest candidate on ties.
            if best.map_or(true, |(_, bv)| v > bv) {
                best = Some((a, v));
            }
        }
        best
    }

    /// Bootstrap value for `state`: the max over actions already recorded for it.
    ///
    /// Candidates that were never recorded do not participate, so a state whose
    /// recorded values are all negative returns the largest of them. An unseen
    /// state returns `0.0`.
    pub fn max_value(&self, state: &StateKey) -> f64 {
        match self.rows.get(state) {
            Some(row) if !row.is_empty() => {
                row.values().copied().fold(f64::NEG_INFINITY, f64::max)
            }
            _ => 0.0,
        }
    }

    /// Recorded `(action, value)` pairs for `state`, in action order.
    pub fn actions<'a>(&'a self, state: &StateKey) -> impl Iterator<Item = (Action, f64)> + 'a {
        self.rows
            .get(state)
            .into_iter()
            .flat_map(|row| row.iter().map(|(a, v)| (*a, *v)))
    }

    /// Number of distinct states with at least one recorded action.
    pub fn state_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of recorded `(state, action)` entries.
    pub fn entry_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
