//! One attempt of the two-phase protocol

use crate::quorum::AcceptorSet;
use serde::{Deserialize, Serialize};
use synod_core::{
    AcceptResponse, AcceptedProposal, PrepareResponse, ProposalNumber, SynodError, SynodResult,
    Value,
};
use tracing::{debug, error, info};

/// Protocol phase in which an attempt stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Prepare,
    Accept,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Prepare => f.write_str("prepare"),
            Phase::Accept => f.write_str("accept"),
        }
    }
}

/// Outcome of a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundResult {
    /// A majority accepted `value` under `number`
    Decided { number: ProposalNumber, value: Value },
    /// No majority in `phase`. `highest_seen` is the largest promise
    /// reported by a rejecting acceptor.
    Conflict {
        phase: Phase,
        highest_seen: Option<ProposalNumber>,
    },
}

impl RoundResult {
    pub fn is_decided(&self) -> bool {
        matches!(self, RoundResult::Decided { .. })
    }

    pub fn decided_value(&self) -> Option<&Value> {
        match self {
            RoundResult::Decided { value, .. } => Some(value),
            RoundResult::Conflict { .. } => None,
        }
    }
}

/// Drives one prepare/accept round for a fixed number and candidate value.
///
/// Holds no state across attempts; build a fresh one per attempt.
#[derive(Debug, Clone)]
pub struct Proposer {
    number: ProposalNumber,
    value: Value,
}

impl Proposer {
    pub fn new(number: ProposalNumber, value: Value) -> Self {
        Self { number, value }
    }

    pub fn number(&self) -> ProposalNumber {
        self.number
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Run both phases against every acceptor in `acceptors`.
    ///
    /// Quorum failures are `Ok(RoundResult::Conflict)`. An `Err` means an
    /// acceptor answered against its own ordering rule.
    pub async fn run(&self, acceptors: &AcceptorSet) -> SynodResult<RoundResult> {
        let number = self.number;
        let mut highest_seen: Option<ProposalNumber> = None;

        // Phase 1
        let mut promises = 0usize;
        let mut prior: Option<AcceptedProposal> = None;

        for acceptor in acceptors.iter() {
            match acceptor.prepare(number).await {
                PrepareResponse::Promise { accepted } => {
                    promises += 1;
                    if let Some(accepted) = accepted {
                        if prior.as_ref().map_or(true, |p| accepted.number > p.number) {
                            prior = Some(accepted);
                        }
                    }
                }
                PrepareResponse::Reject { promised } => {
                    if promised < number {
                        return Err(violation(format!(
                            "acceptor {} rejected prepare {} while promised only {}",
                            acceptor.id(),
                            number,
                            promised
                        )));
                    }
                    debug!(acceptor = %acceptor.id(), %number, %promised, "prepare rejected");
                    highest_seen = highest_seen.max(Some(promised));
                }
            }
        }

        if !acceptors.is_quorum(promises) {
            debug!(
                %number,
                promises,
                quorum = acceptors.quorum(),
                "prepare phase failed to reach quorum"
            );
            return Ok(RoundResult::Conflict {
                phase: Phase::Prepare,
                highest_seen,
            });
        }

        // A value some acceptor already holds wins over the candidate
        let value = match prior {
            Some(accepted) => {
                if accepted.value != self.value {
                    debug!(
                        %number,
                        adopted_from = %accepted.number,
                        "adopting previously accepted value"
                    );
                }
                accepted.value
            }
            None => self.value.clone(),
        };

        // Phase 2
        let mut accepts = 0usize;

        for acceptor in acceptors.iter() {
            match acceptor.accept(number, value.clone()).await {
                AcceptResponse::Accepted => accepts += 1,
                AcceptResponse::Reject { promised } => {
                    if promised <= number {
                        return Err(violation(format!(
                            "acceptor {} rejected accept {} while promised only {}",
                            acceptor.id(),
                            number,
                            promised
                        )));
                    }
                    debug!(acceptor = %acceptor.id(), %number, %promised, "accept rejected");
                    highest_seen = highest_seen.max(Some(promised));
                }
            }
        }

        if !acceptors.is_quorum(accepts) {
            debug!(
                %number,
                accepts,
                quorum = acceptors.quorum(),
                "accept phase failed to reach quorum"
            );
            return Ok(RoundResult::Conflict {
                phase: Phase::Accept,
                highest_seen,
            });
        }

        info!(%number, %value, accepts, "value chosen");
        Ok(RoundResult::Decided { number, value })
    }
}

fn violation(message: String) -> SynodError {
    error!("{}", message);
    SynodError::InvariantViolation(message)
}
