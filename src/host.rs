//! The forwarder-facing boundary.
//!
//! The engine never touches packets, the routing table, or link objects directly;
//! it asks a [`Forwarder`] implementation for what it needs and tells it what to
//! do. Everything here is narrow: a routing lookup already filtered
//! to usable links, a duplicate check, fire-and-forget send/reject, and the
//! baseline (non-learning) response handling.

use crate::{FaceId, Name, RequestId};

/// An inbound forwarding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: RequestId,
    pub name: Name,
    /// Face the request arrived on.
    pub ingress: FaceId,
}

impl Request {
    pub fn new(id: u64, name: impl Into<Name>, ingress: u64) -> Self {
        Self {
            id: RequestId(id),
            name: name.into(),
            ingress: FaceId(ingress),
        }
    }
}

/// A response (data or negative acknowledgment) to an earlier request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Same handle as the request being answered.
    pub id: RequestId,
    pub name: Name,
    /// Face the response arrived on (the upstream link).
    pub ingress: FaceId,
}

impl Response {
    pub fn new(id: u64, name: impl Into<Name>, ingress: u64) -> Self {
        Self {
            id: RequestId(id),
            name: name.into(),
            ingress: FaceId(ingress),
        }
    }

    /// The response viewed as a routing context (for next-state candidate lookup).
    pub fn as_request(&self) -> Request {
        Request {
            id: self.id,
            name: self.name.clone(),
            ingress: self.ingress,
        }
    }
}

/// Why a negative acknowledgment was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NackReason {
    #[default]
    None,
    Congestion,
    Duplicate,
    NoRoute,
}

/// Outcome events delivered by the forwarder.
///
/// One tagged type, consumed by [`Strategy::on_outcome`](crate::Strategy::on_outcome).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Data satisfied the request.
    Data(Response),
    /// A negative acknowledgment came back.
    Nack(Response, NackReason),
    /// The forwarder gave up on the request (timeout / drop); no response exists.
    Expired(RequestId),
}

impl Outcome {
    pub fn request_id(&self) -> RequestId {
        match self {
            Outcome::Data(r) | Outcome::Nack(r, _) => r.id,
            Outcome::Expired(id) => *id,
        }
    }
}

/// Capabilities the surrounding forwarder provides.
pub trait Forwarder {
    /// Usable next hops for `request`, in preference order.
    ///
    /// Liveness and scope/loop filtering are the implementor's job; the engine
    /// treats every returned face as sendable.
    fn candidates(&self, request: &Request) -> Vec<FaceId>;

    /// Smoothed delay estimate for `face`, if the forwarder measures one.
    ///
    /// Only consulted when the state builder folds a delay summary into the key.
    fn link_delay_ms(&self, _face: FaceId) -> Option<f64> {
        None
    }

    /// True if `request` is a retransmission of one that was already forwarded
    /// and is still pending.
    fn has_pending_out(&self, request: &Request) -> bool;

    /// Send `request` out on `face`. Fire-and-forget.
    fn send(&mut self, request: &Request, face: FaceId);

    /// Give up on `request`: there is nowhere to send it.
    fn reject(&mut self, request: &Request);

    /// Baseline handling for returning data (satisfy downstream).
    fn forward_data(&mut self, response: &Response);

    /// Baseline handling for a returning negative acknowledgment.
    fn forward_nack(&mut self, response: &Response, reason: NackReason);
}
