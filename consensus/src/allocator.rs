//! Proposal number allocation

use synod_core::{NodeId, ProposalNumber, SynodError, SynodResult};

/// Highest round a client may suggest. Everything above is kept as headroom
/// so the allocator can always move past a client-chosen round.
pub const MAX_HINT_ROUND: u64 = u32::MAX as u64;

/// Hands out strictly increasing proposal numbers for one proposer identity.
///
/// Numbers from different allocators never collide as long as their
/// `NodeId`s differ. A client-supplied round is only a lower bound.
#[derive(Debug, Clone)]
pub struct ProposalAllocator {
    proposer: NodeId,
    last_round: u64,
}

impl ProposalAllocator {
    pub fn new(proposer: NodeId) -> Self {
        Self {
            proposer,
            last_round: 0,
        }
    }

    pub fn proposer(&self) -> NodeId {
        self.proposer
    }

    /// Last round handed out or observed
    pub fn last_round(&self) -> u64 {
        self.last_round
    }

    /// Allocate the next number, at least `hint` if one is given.
    ///
    /// Never hands out the same round twice: once the round space is used up
    /// every call fails with [`SynodError::RoundsExhausted`].
    pub fn next(&mut self, hint: Option<u64>) -> SynodResult<ProposalNumber> {
        check_hint(hint)?;

        let floor = self
            .last_round
            .checked_add(1)
            .ok_or(SynodError::RoundsExhausted)?;
        let round = hint.map_or(floor, |h| h.max(floor));
        self.last_round = round;
        Ok(ProposalNumber::new(round, self.proposer))
    }

    /// Move past a number some acceptor reported as promised
    pub fn observe(&mut self, seen: ProposalNumber) {
        if seen.round > self.last_round {
            self.last_round = seen.round;
        }
    }
}

/// Reject client rounds that would eat into the allocator's headroom
pub fn check_hint(hint: Option<u64>) -> SynodResult<()> {
    match hint {
        Some(round) if round > MAX_HINT_ROUND => Err(SynodError::InvalidRequest(format!(
            "proposal_number {} exceeds maximum {}",
            round, MAX_HINT_ROUND
        ))),
        _ => Ok(()),
    }
}
