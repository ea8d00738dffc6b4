//! `qfwd`: online Q-learning next-hop selection for packet-forwarding nodes.
//!
//! Designed for the "which outgoing link" problem inside a forwarder: every
//! inbound request has a handful of usable next hops, the forwarder must pick one
//! immediately, and whether that was a good pick only becomes known later (data
//! comes back, a negative acknowledgment comes back, or nothing ever does). `qfwd`
//! makes the pick, remembers it, and learns from whatever happens.
//!
//! The pieces, leaves first:
//!
//! - [`StateKeyBuilder`] / [`StateKey`]: canonical decision context. The request
//!   name is truncated to a fixed number of components so that every segment of
//!   one object maps to one state; the ingress face is always part of the key;
//!   [`StateDetail`] optionally adds the live candidate set and a quantized mean
//!   link delay.
//! - [`ValueTable`]: `(state, action) -> f64`, absent entries read as `0.0`.
//! - [`EpsilonGreedy`]: seedable epsilon-greedy selection. Never returns an action
//!   outside the supplied candidates; with an empty table it returns the first
//!   candidate.
//! - [`RewardShaper`]: success (minus a delay penalty), failure, drop.
//! - [`TdLearner`]: one-step TD / Q-learning update.
//! - [`PendingLedger`]: `RequestId -> (state, action, sent_at)` so a late outcome
//!   is credited to the decision that caused it.
//! - [`Strategy`]: the orchestrator the forwarding path calls, talking to the
//!   forwarder through the narrow [`Forwarder`] trait.
//! - [`SharedStrategy`]: the same behind a single mutex.
//!
//! **Goals:**
//! - **Never block the forwarding path**: every call is a bounded in-memory
//!   computation; sends are fire-and-forget.
//! - **Never pick an unusable link**: the candidate set comes from the forwarder
//!   already filtered, and every selection branch returns a member of it.
//! - **Deterministic given a seed**: same config + same event sequence gives the
//!   same choices, which keeps tests and simulations reproducible.
//! - **Tolerant of messy outcome delivery**: duplicate, late, and unknown outcomes
//!   are counted no-ops.
//!
//! **Non-goals:**
//! - Not a general RL framework: no function approximation, no multi-step
//!   returns, no replay.
//! - Not a routing-table computation or a network simulator. Packets, the FIB,
//!   the pending-request table, face liveness, and retransmission suppression all
//!   belong to the forwarder.
//! - Learned values live in memory only.
//!
//! # Lifecycle
//!
//! ```text
//!   request --> has_pending_out? --yes--> Suppressed
//!                   | no
//!                   v
//!              candidates() empty? --yes--> reject(), Rejected
//!                   | no
//!                   v
//!              state, choose, send(), ledger.record  ==> Decided
//!
//!   Data(resp)  --> ledger.resolve --> Success reward, TD update --> forward_data()
//!   Nack(resp)  --> ledger.resolve --> Failure reward, TD update --> forward_nack()
//!   Expired(id) --> ledger.expire  --> Drop reward, TD update (next state = state)
//! ```
//!
//! The baseline `forward_data` / `forward_nack` calls happen whether or not the
//! ledger knew the request: learning never replaces normal response handling.
//!
//! # Choosing the TD target on drops
//!
//! A drop has no follow-up observation, so the update bootstraps from the same
//! state it credits (`next_state = state`). With `gamma` close to 1 a drop is
//! softened when the state has positive values elsewhere, and compounds when
//! every recorded value is negative (repeated drops head toward
//! `drop / (1 - gamma)`).
//!
//! # Logging
//!
//! Decisions, updates, stale outcomes, and sweeps are emitted as `tracing`
//! events at `debug` level with structured fields. The crate never installs a
//! subscriber.

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod name;
pub use name::*;

mod state;
pub use state::*;

mod table;
pub use table::*;

mod policy;
pub use policy::*;

mod reward;
pub use reward::*;

mod learner;
pub use learner::*;

mod ledger;
pub use ledger::*;

mod decision;
pub use decision::*;

mod host;
pub use host::*;

mod config;
pub use config::*;

mod strategy;
pub use strategy::*;

mod shared;
pub use shared::*;
