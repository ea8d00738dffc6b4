//! A [`Strategy`] behind one lock, for multi-threaded forwarders.
//!
//! Value table, ledger and RNG are all guarded by the same mutex: each call is a
//! single short decision or update, so there is nothing to gain from finer
//! locks.
//!
//! A poisoned lock is recovered rather than propagated. The forwarder callbacks
//! run while the lock is held, so a panicking [`Forwarder`] can leave the
//! strategy mid-call: a request sent from `after_receive_request` but never
//! filed in the ledger (its outcome is then counted as stale), or an outcome
//! that was learned from but whose baseline forwarding never ran. Value-table and ledger
//! writes are each applied whole.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{Config, Forwarder, Outcome, Request, Result, Strategy, StrategyStats, TdUpdate, Verdict};

/// Cloneable handle to a shared [`Strategy`].
#[derive(Debug, Clone)]
pub struct SharedStrategy {
    inner: Arc<Mutex<Strategy>>,
}

impl SharedStrategy {
    pub fn new(cfg: Config) -> Result<Self> {
        Ok(Self::from_strategy(Strategy::new(cfg)?))
    }

    pub fn from_strategy(strategy: Strategy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(strategy)),
        }
    }

    /// See [`Strategy::after_receive_request`].
    pub fn after_receive_request<F>(&self, host: &mut F, request: &Request, now_ms: u64) -> Verdict
    where
        F: Forwarder + ?Sized,
    {
        self.lock().after_receive_request(host, request, now_ms)
    }

    /// See [`Strategy::on_outcome`].
    pub fn on_outcome<F>(&self, host: &mut F, outcome: &Outcome, now_ms: u64) -> Option<TdUpdate>
    where
        F: Forwarder + ?Sized,
    {
        self.lock().on_outcome(host, outcome, now_ms)
    }

    /// See [`Strategy::expire_stale`].
    pub fn expire_stale(&self, now_ms: u64) -> usize {
        self.lock().expire_stale(now_ms)
    }

    pub fn stats(&self) -> StrategyStats {
        self.lock().stats()
    }

    /// Run `f` with exclusive access to the strategy (for inspection).
    pub fn with<R>(&self, f: impl FnOnce(&Strategy) -> R) -> R {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Strategy> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
