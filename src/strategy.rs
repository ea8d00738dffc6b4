//! The decision orchestrator: the entry point the forwarding path calls.
//!
//! [`Strategy`] owns all learned state (value table, pending ledger, RNG) and
//! exposes three calls:
//!
//! ```text
//! let v = strategy.after_receive_request(&mut host, &request, now_ms); // decide + send
//! strategy.on_outcome(&mut host, &outcome, now_ms);                    // learn + baseline forward
//! strategy.expire_stale(now_ms);                                       // optional sweep
//! ```
//!
//! Per request the lifecycle is `Unseen -> Decided -> Resolved | Expired`. A
//! request with no usable link is rejected straight from `Unseen` and never gets
//! a ledger entry. Outcomes for requests the ledger does not know about (already
//! resolved, expired, or never decided here) are counted and otherwise ignored;
//! the baseline data/nack forwarding still happens for them.

use tracing::debug;

use crate::{
    mean_delay_ms, ChoiceMode, Config, Decision, EpsilonGreedy, FaceId, Forwarder, Outcome,
    OutcomeKind, Pending, PendingLedger, Request, RequestId, Response, Result, RewardShaper,
    StateKey, StateKeyBuilder, TdLearner, TdUpdate, ValueTable, Verdict,
};

// ============================================================================
// Stats
// ============================================================================

/// Lifetime counters for one [`Strategy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrategyStats {
    /// Requests forwarded (each created one ledger entry).
    pub decisions: u64,
    /// Of `decisions`, how many took the exploration branch.
    pub explored: u64,
    /// Retransmissions ignored because a decision was already pending.
    pub suppressed: u64,
    /// Requests rejected for lack of a usable link.
    pub rejected: u64,
    /// Decisions closed by data or a nack.
    pub resolved: u64,
    /// Decisions closed by a drop/expiry (signaled or swept).
    pub expired: u64,
    /// Outcomes that matched no pending decision.
    pub stale_outcomes: u64,
}

// ============================================================================
// Strategy
// ============================================================================

/// Learning forwarding strategy for one node.
///
/// ```rust
/// use qfwd::{Config, FaceId, Forwarder, NackReason, Outcome, Request, Response, Strategy};
///
/// struct Host;
/// impl Forwarder for Host {
///     fn candidates(&self, _r: &Request) -> Vec<FaceId> { vec![FaceId(1), FaceId(2)] }
///     fn has_pending_out(&self, _r: &Request) -> bool { false }
///     fn send(&mut self, _r: &Request, _f: FaceId) {}
///     fn reject(&mut self, _r: &Request) {}
///     fn forward_data(&mut self, _r: &Response) {}
///     fn forward_nack(&mut self, _r: &Response, _why: NackReason) {}
/// }
///
/// let mut s = Strategy::new(Config::default().with_epsilon(0.0)).unwrap();
/// let mut host = Host;
/// let v = s.after_receive_request(&mut host, &Request::new(1, "/prefix/a/0", 9), 0);
/// let face = v.action().unwrap();
///
/// let data = Response::new(1, "/prefix/a/0", face.0);
/// let u = s.on_outcome(&mut host, &Outcome::Data(data), 20).unwrap();
/// assert!(u.new > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Strategy {
    cfg: Config,
    builder: StateKeyBuilder,
    table: ValueTable,
    ledger: PendingLedger,
    policy: EpsilonGreedy,
    learner: TdLearner,
    shaper: RewardShaper,
    stats: StrategyStats,
}

impl Strategy {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Create a strategy with an empty value table and ledger.
    ///
    /// Fails if `cfg` does not pass [`Config::validate`].
    pub fn new(cfg: Config) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            builder: StateKeyBuilder::new(cfg.prefix_depth, cfg.state_detail),
            table: ValueTable::new(),
            ledger: PendingLedger::new(),
            policy: EpsilonGreedy::with_schedule(
                cfg.epsilon,
                cfg.epsilon_decay,
                cfg.epsilon_floor,
                cfg.seed,
            ),
            learner: TdLearner::new(cfg.alpha, cfg.gamma),
            shaper: RewardShaper::new(cfg.rewards),
            stats: StrategyStats::default(),
            cfg,
        })
    }

    // -----------------------------------------------------------------------
    // Core interface
    // -----------------------------------------------------------------------

    /// Decide where to send a new request, send it, and file the decision.
    pub fn after_receive_request<F>(&mut self, host: &mut F, request: &Request, now_ms: u64) -> Verdict
    where
        F: Forwarder + ?Sized,
    {
        if host.has_pending_out(request) {
            self.stats.suppressed += 1;
            debug!(request = %request.id, name = %request.name, "retransmission suppressed");
            return Verdict::Suppressed;
        }

        let candidates = host.candidates(request);
        let state = self.build_state(&*host, request, &candidates);
        let Some(choice) = self.policy.choose(&self.table, &state, &candidates) else {
            self.stats.rejected += 1;
            debug!(request = %request.id, name = %request.name, "no usable next hop; rejecting");
            host.reject(request);
            return Verdict::Rejected;
        };

        host.send(request, choice.action);
        self.ledger
            .record(request.id, state.clone(), choice.action, now_ms);

        self.stats.decisions += 1;
        if choice.mode == ChoiceMode::Explore {
            self.stats.explored += 1;
        }
        debug!(
            request = %request.id,
            name = %request.name,
            ingress = %request.ingress,
            action = %choice.action,
            mode = ?choice.mode,
            value = choice.value,
            candidates = candidates.len(),
            "forwarded"
        );

        Verdict::Forwarded(Decision {
            request: request.id,
            state,
            action: choice.action,
            mode: choice.mode,
            value: choice.value,
            candidates: candidates.len(),
        })
    }

    /// Learn from an outcome, then run the baseline response handling.
    ///
    /// Returns the value update applied, or `None` when the outcome matched no
    /// pending decision (a duplicate or unknown outcome is not an error).
    pub fn on_outcome<F>(&mut self, host: &mut F, outcome: &Outcome, now_ms: u64) -> Option<TdUpdate>
    where
        F: Forwarder + ?Sized,
    {
        match outcome {
            Outcome::Data(response) => {
                let update = self.resolve_response(&*host, response, OutcomeKind::Success, now_ms);
                host.forward_data(response);
                update
            }
            Outcome::Nack(response, reason) => {
                debug!(request = %response.id, ?reason, "nack received");
                let update = self.resolve_response(&*host, response, OutcomeKind::Failure, now_ms);
                host.forward_nack(response, *reason);
                update
            }
            Outcome::Expired(id) => match self.ledger.expire(*id) {
                Some(pending) => {
                    self.stats.expired += 1;
                    let next = pending.state.clone();
                    self.learn(&pending, OutcomeKind::Drop, now_ms, &next)
                }
                None => {
                    self.note_stale(*id);
                    None
                }
            },
        }
    }

    /// Treat every pending decision older than
    /// [`Config::pending_timeout_ms`] as dropped.
    ///
    /// Returns how many decisions were expired. A no-op when no timeout is
    /// configured.
    pub fn expire_stale(&mut self, now_ms: u64) -> usize {
        let Some(timeout) = self.cfg.pending_timeout_ms else {
            return 0;
        };
        let drained = self.ledger.drain_older_than(now_ms, timeout);
        for (id, pending) in &drained {
            self.stats.expired += 1;
            debug!(request = %id, age_ms = pending.age_ms(now_ms), "pending decision timed out");
            let next = pending.state.clone();
            self.learn(pending, OutcomeKind::Drop, now_ms, &next);
        }
        drained.len()
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn ledger(&self) -> &PendingLedger {
        &self.ledger
    }

    pub fn stats(&self) -> StrategyStats {
        self.stats
    }

    /// Current exploration probability (changes only with a decay schedule).
    pub fn epsilon(&self) -> f64 {
        self.policy.epsilon()
    }

    /// The state key this strategy would file `request` under, given `candidates`.
    pub fn state_for<F>(&self, host: &F, request: &Request, candidates: &[FaceId]) -> StateKey
    where
        F: Forwarder + ?Sized,
    {
        self.build_state(host, request, candidates)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn build_state<F>(&self, host: &F, request: &Request, candidates: &[FaceId]) -> StateKey
    where
        F: Forwarder + ?Sized,
    {
        let delay = if self.builder.wants_delay() {
            mean_delay_ms(candidates.iter().map(|f| host.link_delay_ms(*f)))
        } else {
            None
        };
        self.builder
            .build(&request.name, request.ingress, candidates, delay)
    }

    fn response_state<F>(&self, host: &F, response: &Response) -> StateKey
    where
        F: Forwarder + ?Sized,
    {
        let ctx = response.as_request();
        let candidates = host.candidates(&ctx);
        self.build_state(host, &ctx, &candidates)
    }

    fn resolve_response<F>(
        &mut self,
        host: &F,
        response: &Response,
        kind: OutcomeKind,
        now_ms: u64,
    ) -> Option<TdUpdate>
    where
        F: Forwarder + ?Sized,
    {
        let Some(pending) = self.ledger.resolve(response.id) else {
            self.note_stale(response.id);
            return None;
        };
        self.stats.resolved += 1;
        if pending.action != response.ingress {
            debug!(
                request = %response.id,
                sent_on = %pending.action,
                returned_on = %response.ingress,
                "response arrived on a different face; crediting the face it was sent on"
            );
        }
        let next = self.response_state(host, response);
        self.learn(&pending, kind, now_ms, &next)
    }

    fn learn(
        &mut self,
        pending: &Pending,
        kind: OutcomeKind,
        now_ms: u64,
        next: &StateKey,
    ) -> Option<TdUpdate> {
        let delay = match kind {
            OutcomeKind::Success => Some(pending.age_ms(now_ms) as f64),
            OutcomeKind::Failure | OutcomeKind::Drop => None,
        };
        let reward = self.shaper.reward(kind, delay);
        self.learner
            .update(&mut self.table, &pending.state, pending.action, reward, next)
    }

    fn note_stale(&mut self, id: RequestId) {
        self.stats.stale_outcomes += 1;
        debug!(request = %id, "outcome for unknown or already-closed request");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NackReason, StateDetail};
    use std::collections::BTreeMap;

    /// Scripted forwarder: fixed candidates per name, records every call.
    #[derive(Default)]
    struct Fake {
        routes: BTreeMap<String, Vec<FaceId>>,
        delays: BTreeMap<FaceId, f64>,
        pending_out: Vec<RequestId>,
        sent: Vec<(RequestId, FaceId)>,
        rejected: Vec<RequestId>,
        data_forwarded: Vec<RequestId>,
        nacks_forwarded: Vec<(RequestId, NackReason)>,
    }

    impl Fake {
        fn with_route(mut self, name: &str, faces: &[u64]) -> Self {
            self.routes
                .insert(name.to_string(), faces.iter().copied().map(FaceId).collect());
            self
        }
    }

    impl Forwarder for Fake {
        fn candidates(&self, request: &Request) -> Vec<FaceId> {
            self.routes
                .iter()
                .filter(|(p, _)| crate::Name::parse(p).is_prefix_of(&request.name))
                .max_by_key(|(p, _)| crate::Name::parse(p).len())
                .map(|(_, f)| f.clone())
                .unwrap_or_default()
        }
        fn link_delay_ms(&self, face: FaceId) -> Option<f64> {
            self.delays.get(&face).copied()
        }
        fn has_pending_out(&self, request: &Request) -> bool {
            self.pending_out.contains(&request.id)
        }
        fn send(&mut self, request: &Request, face: FaceId) {
            self.sent.push((request.id, face));
        }
        fn reject(&mut self, request: &Request) {
            self.rejected.push(request.id);
        }
        fn forward_data(&mut self, response: &Response) {
            self.data_forwarded.push(response.id);
        }
        fn forward_nack(&mut self, response: &Response, reason: NackReason) {
            self.nacks_forwarded.push((response.id, reason));
        }
    }

    fn greedy() -> Strategy {
        Strategy::new(Config::default().with_epsilon(0.0)).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        assert!(Strategy::new(Config::default().with_alpha(2.0)).is_err());
    }

    #[test]
    fn forwards_and_records() {
        let mut s = greedy();
        let mut h = Fake::default().with_route("/p", &[3, 4]);
        let v = s.after_receive_request(&mut h, &Request::new(1, "/p/x/0", 9), 5);
        let d = v.decision().unwrap();
        assert_eq!(d.action, FaceId(3));
        assert_eq!(d.candidates, 2);
        assert_eq!(h.sent, vec![(RequestId(1), FaceId(3))]);
        let p = s.ledger().get(RequestId(1)).unwrap();
        assert_eq!(p.action, FaceId(3));
        assert_eq!(p.sent_at_ms, 5);
        assert_eq!(s.stats().decisions, 1);
    }

    #[test]
    fn no_candidates_rejects_without_ledger_entry() {
        let mut s = greedy();
        let mut h = Fake::default();
        let v = s.after_receive_request(&mut h, &Request::new(1, "/nowhere", 9), 0);
        assert_eq!(v, Verdict::Rejected);
        assert_eq!(h.rejected, vec![RequestId(1)]);
        assert!(h.sent.is_empty());
        assert!(s.ledger().is_empty());
        assert_eq!(s.stats().rejected, 1);
    }

    #[test]
    fn retransmission_is_suppressed() {
        let mut s = greedy();
        let mut h = Fake::default().with_route("/p", &[3]);
        h.pending_out.push(RequestId(1));
        let v = s.after_receive_request(&mut h, &Request::new(1, "/p/x", 9), 0);
        assert_eq!(v, Verdict::Suppressed);
        assert!(h.sent.is_empty());
        assert!(s.ledger().is_empty());
        assert_eq!(s.stats().suppressed, 1);
    }

    #[test]
    fn data_credits_recorded_action_and_forwards() {
        let mut s = greedy();
        let mut h = Fake::default().with_route("/p", &[3, 4]);
        s.after_receive_request(&mut h, &Request::new(1, "/p/x/0", 9), 0);
        let u = s
            .on_outcome(&mut h, &Outcome::Data(Response::new(1, "/p/x/0", 3)), 0)
            .unwrap();
        // alpha=0.1, full success reward, unseen next state.
        assert!((u.new - 1.0).abs() < 1e-12);
        let st = s.state_for(&h, &Request::new(1, "/p/x/0", 9), &[]);
        assert_eq!(s.table().get(&st, FaceId(3)), u.new);
        assert_eq!(h.data_forwarded, vec![RequestId(1)]);
        assert!(s.ledger().is_empty());
        assert_eq!(s.stats().resolved, 1);
    }

    #[test]
    fn data_reward_reflects_delay() {
        let mut fast = greedy();
        let mut slow = greedy();
        let mut h = Fake::default().with_route("/p", &[3]);
        fast.after_receive_request(&mut h, &Request::new(1, "/p/x", 9), 0);
        slow.after_receive_request(&mut h, &Request::new(1, "/p/x", 9), 0);
        let uf = fast
            .on_outcome(&mut h, &Outcome::Data(Response::new(1, "/p/x", 3)), 10)
            .unwrap();
        let us = slow
            .on_outcome(&mut h, &Outcome::Data(Response::new(1, "/p/x", 3)), 400)
            .unwrap();
        assert!(uf.new > us.new);
    }

    #[test]
    fn nack_lowers_value_and_still_forwards_nack() {
        let mut s = greedy();
        let mut h = Fake::default().with_route("/p", &[3]);
        s.after_receive_request(&mut h, &Request::new(1, "/p/x", 9), 0);
        let u = s
            .on_outcome(
                &mut h,
                &Outcome::Nack(Response::new(1, "/p/x", 3), NackReason::Congestion),
                5,
            )
            .unwrap();
        assert!(u.new < 0.0);
        assert_eq!(h.nacks_forwarded, vec![(RequestId(1), NackReason::Congestion)]);
    }

    #[test]
    fn expiry_applies_drop_with_self_bootstrap() {
        let mut s = Strategy::new(Config::default().with_epsilon(0.0).with_alpha(1.0)).unwrap();
        let mut h = Fake::default().with_route("/p", &[3]);
        s.after_receive_request(&mut h, &Request::new(1, "/p/x", 9), 0);
        let u = s.on_outcome(&mut h, &Outcome::Expired(RequestId(1)), 4000).unwrap();
        // next state == current state, which has no recorded values at bootstrap time.
        assert_eq!(u.new, -10.0);
        assert_eq!(s.stats().expired, 1);
        assert!(h.data_forwarded.is_empty() && h.nacks_forwarded.is_empty());
    }

    #[test]
    fn duplicate_and_unknown_outcomes_are_noops() {
        let mut s = greedy();
        let mut h = Fake::default().with_route("/p", &[3]);
        s.after_receive_request(&mut h, &Request::new(1, "/p/x", 9), 0);
        let data = Outcome::Data(Response::new(1, "/p/x", 3));
        assert!(s.on_outcome(&mut h, &data, 1).is_some());
        let entries = s.table().entry_count();
        let value = s.table().actions(&s.state_for(&h, &Request::new(1, "/p/x", 9), &[])).next();

        assert!(s.on_outcome(&mut h, &data, 2).is_none());
        assert!(s.on_outcome(&mut h, &Outcome::Expired(RequestId(1)), 3).is_none());
        assert!(s
            .on_outcome(&mut h, &Outcome::Nack(Response::new(77, "/p/y", 3), NackReason::None), 3)
            .is_none());

        assert_eq!(s.table().entry_count(), entries);
        assert_eq!(
            s.table().actions(&s.state_for(&h, &Request::new(1, "/p/x", 9), &[])).next(),
            value
        );
        assert_eq!(s.stats().stale_outcomes, 3);
        // Baseline forwarding happens regardless of the ledger.
        assert_eq!(h.data_forwarded, vec![RequestId(1), RequestId(1)]);
        assert_eq!(h.nacks_forwarded.len(), 1);
    }

    #[test]
    fn expire_stale_sweeps_old_decisions() {
        let cfg = Config::default().with_epsilon(0.0).with_pending_timeout_ms(1000);
        let mut s = Strategy::new(cfg).unwrap();
        let mut h = Fake::default().with_route("/p", &[3]);
        s.after_receive_request(&mut h, &Request::new(1, "/p/x", 9), 0);
        s.after_receive_request(&mut h, &Request::new(2, "/p/x", 9), 800);
        assert_eq!(s.expire_stale(1200), 1);
        assert!(!s.ledger().contains(RequestId(1)));
        assert!(s.ledger().contains(RequestId(2)));
        let st = s.state_for(&h, &Request::new(1, "/p/x", 9), &[]);
        assert!(s.table().get(&st, FaceId(3)) < 0.0);
        assert_eq!(s.stats().expired, 1);
    }

    #[test]
    fn expire_stale_without_timeout_is_noop() {
        let mut s = greedy();
        let mut h = Fake::default().with_route("/p", &[3]);
        s.after_receive_request(&mut h, &Request::new(1, "/p/x", 9), 0);
        assert_eq!(s.expire_stale(u64::MAX), 0);
        assert_eq!(s.ledger().len(), 1);
    }

    #[test]
    fn richer_state_uses_candidates_and_delay() {
        let cfg = Config::default()
            .with_epsilon(0.0)
            .with_state_detail(StateDetail::WithActionsAndDelay { bucket_ms: 10.0 });
        let mut s = Strategy::new(cfg).unwrap();
        let mut h = Fake::default().with_route("/p", &[4, 3]);
        h.delays.insert(FaceId(3), 10.0);
        h.delays.insert(FaceId(4), 30.0);
        let v = s.after_receive_request(&mut h, &Request::new(1, "/p/x", 9), 0);
        let st = &v.decision().unwrap().state;
        assert_eq!(st.actions(), Some(&[FaceId(3), FaceId(4)][..]));
        assert_eq!(st.delay_bucket(), Some(2));
    }
}
