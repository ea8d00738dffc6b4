#![allow(dead_code)]

use qfwd::{FaceId, Forwarder, NackReason, Name, Outcome, Request, Response};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// What a link does with a request sent over it.
#[derive(Debug, Clone, Copy)]
pub struct LinkProfile {
    /// One-way-and-back delay before data (or a nack) returns.
    pub rtt_ms: u64,
    /// Probability the request silently disappears.
    pub loss: f64,
    /// Probability the upstream answers with a congestion nack.
    pub nack: f64,
}

impl LinkProfile {
    pub fn new(rtt_ms: u64, loss: f64, nack: f64) -> Self {
        Self { rtt_ms, loss, nack }
    }
}

/// A router's view of its upstream links, with scripted link behavior.
///
/// `send` samples the link's fate immediately and schedules the outcome;
/// `due` hands back everything that has arrived by a given time.
pub struct SimRouter {
    routes: BTreeMap<Name, Vec<FaceId>>,
    links: BTreeMap<FaceId, LinkProfile>,
    in_flight: BTreeMap<u64, Vec<Outcome>>,
    rng: StdRng,
    now_ms: u64,
    pub sends: BTreeMap<FaceId, u64>,
    pub delivered: u64,
    pub nacked: u64,
    pub rejected: u64,
}

impl SimRouter {
    pub fn new(seed: u64) -> Self {
        Self {
            routes: BTreeMap::new(),
            links: BTreeMap::new(),
            in_flight: BTreeMap::new(),
            rng: StdRng::seed_from_u64(seed),
            now_ms: 0,
            sends: BTreeMap::new(),
            delivered: 0,
            nacked: 0,
            rejected: 0,
        }
    }

    pub fn route(&mut self, prefix: &str, faces: &[u64]) {
        self.routes
            .insert(Name::parse(prefix), faces.iter().copied().map(FaceId).collect());
    }

    pub fn link(&mut self, face: u64, profile: LinkProfile) {
        self.links.insert(FaceId(face), profile);
    }

    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    /// Outcomes that have arrived by `now_ms`, earliest first.
    pub fn due(&mut self, now_ms: u64) -> Vec<(u64, Outcome)> {
        let later = self.in_flight.split_off(&(now_ms + 1));
        let ready = std::mem::replace(&mut self.in_flight, later);
        ready
            .into_iter()
            .flat_map(|(t, outs)| outs.into_iter().map(move |o| (t, o)))
            .collect()
    }

    /// Every outcome still scheduled, regardless of time.
    pub fn drain(&mut self) -> Vec<(u64, Outcome)> {
        self.due(u64::MAX - 1)
    }
}

impl Forwarder for SimRouter {
    fn candidates(&self, request: &Request) -> Vec<FaceId> {
        self.routes
            .iter()
            .filter(|(p, _)| p.is_prefix_of(&request.name))
            .max_by_key(|(p, _)| p.len())
            .map(|(_, faces)| faces.clone())
            .unwrap_or_default()
    }

    fn link_delay_ms(&self, face: FaceId) -> Option<f64> {
        self.links.get(&face).map(|l| l.rtt_ms as f64)
    }

    fn has_pending_out(&self, _request: &Request) -> bool {
        false
    }

    fn send(&mut self, request: &Request, face: FaceId) {
        *self.sends.entry(face).or_default() += 1;
        let Some(link) = self.links.get(&face).copied() else {
            return;
        };
        let roll: f64 = self.rng.random();
        if roll < link.loss {
            return;
        }
        let response = Response::new(request.id.0, request.name.clone(), face.0);
        let outcome = if roll < link.loss + link.nack {
            Outcome::Nack(response, NackReason::Congestion)
        } else {
            Outcome::Data(response)
        };
        self.in_flight
            .entry(self.now_ms + link.rtt_ms)
            .or_default()
            .push(outcome);
    }

    fn reject(&mut self, _request: &Request) {
        self.rejected += 1;
    }

    fn forward_data(&mut self, _response: &Response) {
        self.delivered += 1;
    }

    fn forward_nack(&mut self, _response: &Response, _reason: NackReason) {
        self.nacked += 1;
    }
}

pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
