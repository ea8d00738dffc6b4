//! Pending-decision ledger.
//!
//! Correlates a decision taken now with an outcome that arrives later, possibly
//! from a different code path, or never. Keyed by [`RequestId`] rather than by
//! name and face, so unrelated concurrent requests for the same prefix cannot
//! collide.
//!
//! Lifecycle of an entry: [`record`](PendingLedger::record) exactly once, then
//! exactly one of [`resolve`](PendingLedger::resolve) /
//! [`expire`](PendingLedger::expire) / [`drain_older_than`](PendingLedger::drain_older_than).
//! Resolving an unknown or already-resolved id is a no-op returning `None`, so
//! duplicate outcome delivery is harmless.

use std::collections::BTreeMap;

use tracing::error;

use crate::{Action, RequestId, StateKey};

/// The decision recorded for one outstanding request.
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub state: StateKey,
    pub action: Action,
    /// Caller clock reading when the request was sent.
    pub sent_at_ms: u64,
}

impl Pending {
    /// Time since the request was sent, saturating at zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.sent_at_ms)
    }
}

/// In-flight decisions awaiting an outcome.
#[derive(Debug, Clone, Default)]
pub struct PendingLedger {
    entries: BTreeMap<RequestId, Pending>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the decision made for `id`.
    ///
    /// Precondition: `id` has no live entry. Recording twice without an
    /// intervening resolve/expire is a caller bug; it trips a debug assertion, and
    /// in release builds the newer decision replaces the older one.
    pub fn record(&mut self, id: RequestId, state: StateKey, action: Action, sent_at_ms: u64) {
        let prev = self.entries.insert(
            id,
            Pending {
                state,
                action,
                sent_at_ms,
            },
        );
        if let Some(prev) = &prev {
            error!(request = %id, previous = %prev.action, "decision recorded twice for one request");
        }
        debug_assert!(prev.is_none(), "PendingLedger::record called twice for {id}");
    }

    /// Remove and return the entry for `id`, if any.
    pub fn resolve(&mut self, id: RequestId) -> Option<Pending> {
        self.entries.remove(&id)
    }

    /// Same removal as [`resolve`](Self::resolve); used when the collaborator says
    /// no outcome will ever arrive for `id`.
    pub fn expire(&mut self, id: RequestId) -> Option<Pending> {
        self.entries.remove(&id)
    }

    /// Remove every entry whose age at `now_ms` is at least `max_age_ms`.
    ///
    /// Returned in request-id order.
    pub fn drain_older_than(&mut self, now_ms: u64, max_age_ms: u64) -> Vec<(RequestId, Pending)> {
        let stale: Vec<RequestId> = self
            .entries
            .iter()
            .filter(|(_, p)| p.age_ms(now_ms) >= max_age_ms)
            .map(|(id, _)| *id)
            .collect();
        stale
            .into_iter()
            .filter_map(|id| self.entries.remove(&id).map(|p| (id, p)))
            .collect()
    }

    pub fn get(&self, id: RequestId) -> Option<&Pending> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
