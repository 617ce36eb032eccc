//! In-process acceptor

use async_trait::async_trait;
use parking_lot::Mutex;
use synod_core::{
    AcceptResponse, AcceptedProposal, Acceptor, AcceptorSnapshot, NodeId, PrepareResponse,
    ProposalNumber, Value,
};
use tracing::trace;

/// Agreement state of one acceptor.
///
/// `Unbound -> Promised(n) -> Accepted(n, v)`, monotonic in `n`. Only the
/// latest accepted proposal is retained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptorState {
    /// Largest number this acceptor has promised not to ignore
    pub highest_promised: Option<ProposalNumber>,
    /// Highest-numbered proposal accepted so far
    pub accepted: Option<AcceptedProposal>,
}

impl AcceptorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Promise `number` if it is strictly above every earlier promise
    pub fn prepare(&mut self, number: ProposalNumber) -> PrepareResponse {
        match self.highest_promised {
            Some(promised) if number <= promised => PrepareResponse::Reject { promised },
            _ => {
                self.highest_promised = Some(number);
                PrepareResponse::Promise {
                    accepted: self.accepted.clone(),
                }
            }
        }
    }

    /// Accept `(number, value)` unless a higher number has been promised
    pub fn accept(&mut self, number: ProposalNumber, value: Value) -> AcceptResponse {
        if let Some(promised) = self.highest_promised {
            if number < promised {
                return AcceptResponse::Reject { promised };
            }
        }

        self.highest_promised = Some(number);
        self.accepted = Some(AcceptedProposal::new(number, value));

        debug_assert!(self.accepted_within_promise());
        AcceptResponse::Accepted
    }

    fn accepted_within_promise(&self) -> bool {
        match (&self.accepted, self.highest_promised) {
            (Some(accepted), Some(promised)) => accepted.number <= promised,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

/// Acceptor living in the service process
pub struct LocalAcceptor {
    id: NodeId,
    state: Mutex<AcceptorState>,
}

impl LocalAcceptor {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            state: Mutex::new(AcceptorState::new()),
        }
    }

    /// Acceptor that has already promised `promised`
    pub fn seeded(id: NodeId, promised: ProposalNumber) -> Self {
        Self {
            id,
            state: Mutex::new(AcceptorState {
                highest_promised: Some(promised),
                accepted: None,
            }),
        }
    }

    /// Acceptor that has already accepted `value` under `number`
    pub fn with_accepted(id: NodeId, number: ProposalNumber, value: Value) -> Self {
        Self {
            id,
            state: Mutex::new(AcceptorState {
                highest_promised: Some(number),
                accepted: Some(AcceptedProposal::new(number, value)),
            }),
        }
    }

    pub fn state(&self) -> AcceptorState {
        self.state.lock().clone()
    }
}

#[async_trait]
impl Acceptor for LocalAcceptor {
    fn id(&self) -> NodeId {
        self.id
    }

    async fn prepare(&self, number: ProposalNumber) -> PrepareResponse {
        let response = self.state.lock().prepare(number);
        trace!(acceptor = %self.id, %number, ?response, "prepare");
        response
    }

    async fn accept(&self, number: ProposalNumber, value: Value) -> AcceptResponse {
        let response = self.state.lock().accept(number, value);
        trace!(acceptor = %self.id, %number, ?response, "accept");
        response
    }

    fn snapshot(&self) -> AcceptorSnapshot {
        let state = self.state.lock();
        AcceptorSnapshot {
            id: self.id,
            highest_promised: state.highest_promised,
            accepted: state.accepted.clone(),
        }
    }
}
