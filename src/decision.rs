//! Decision envelope.
//!
//! A [`Decision`] is the audit record of one forwarding choice: which request,
//! which state it was filed under, which face was picked, and whether the pick
//! was exploratory. It is what [`Strategy::after_receive_request`](crate::Strategy::after_receive_request)
//! hands back, so callers can log or replay decisions without reaching into the
//! strategy's internals.

use crate::{Action, ChoiceMode, RequestId, StateKey};

/// One forwarding decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub request: RequestId,
    pub state: StateKey,
    pub action: Action,
    pub mode: ChoiceMode,
    /// Value of `action` at decision time.
    pub value: f64,
    /// Number of usable candidates the choice was made from.
    pub candidates: usize,
}

impl Decision {
    pub fn explored(&self) -> bool {
        self.mode == ChoiceMode::Explore
    }
}

/// Result of offering a new request to the strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Sent on `decision.action` and filed in the pending ledger.
    Forwarded(Decision),
    /// Already forwarded and still pending; nothing was done.
    Suppressed,
    /// No usable link; the request was rejected and nothing was filed.
    Rejected,
}

impl Verdict {
    /// The chosen face, if the request was forwarded.
    pub fn action(&self) -> Option<Action> {
        match self {
            Verdict::Forwarded(d) => Some(d.action),
            Verdict::Suppressed | Verdict::Rejected => None,
        }
    }

    pub fn decision(&self) -> Option<&Decision> {
        match self {
            Verdict::Forwarded(d) => Some(d),
            Verdict::Suppressed | Verdict::Rejected => None,
        }
    }
}
