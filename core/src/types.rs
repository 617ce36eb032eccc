//! Core types for Synod
//!
//! Defines the proposal numbers, values and acceptor messages shared by every crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Proposer identity, used to break ties between equal rounds
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Totally ordered proposal identifier.
///
/// Compares by `(round, proposer)`, so two proposers that pick the same round
/// still produce distinct, ordered numbers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct ProposalNumber {
    pub round: u64,
    pub proposer: NodeId,
}

impl ProposalNumber {
    /// Lower than any number a proposer can allocate
    pub const ZERO: ProposalNumber = ProposalNumber {
        round: 0,
        proposer: NodeId(0),
    };

    pub fn new(round: u64, proposer: NodeId) -> Self {
        Self { round, proposer }
    }

    /// Next round after this one, owned by `proposer`
    pub fn next_for(&self, proposer: NodeId) -> Self {
        Self {
            round: self.round.saturating_add(1),
            proposer,
        }
    }
}

impl fmt::Display for ProposalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.round, self.proposer.0)
    }
}

impl fmt::Debug for ProposalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProposalNumber({}.{})", self.round, self.proposer.0)
    }
}

/// Opaque client payload. The protocol never inspects it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(pub String);

impl Value {
    pub fn new(value: impl Into<String>) -> Self {
        Value(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({:?})", self.0)
    }
}

/// Timestamp in milliseconds since Unix epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(chrono::Utc::now().timestamp_millis() as u64)
    }

    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// A proposal an acceptor has accepted, together with its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedProposal {
    pub number: ProposalNumber,
    pub value: Value,
}

impl AcceptedProposal {
    pub fn new(number: ProposalNumber, value: Value) -> Self {
        Self { number, value }
    }
}

/// Acceptor reply to a prepare request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepareResponse {
    /// Promise not to accept anything below the prepared number.
    /// Carries the acceptor's latest accepted proposal, if any.
    Promise { accepted: Option<AcceptedProposal> },
    /// Already promised `promised`, which is at least the prepared number
    Reject { promised: ProposalNumber },
}

impl PrepareResponse {
    pub fn is_promise(&self) -> bool {
        matches!(self, PrepareResponse::Promise { .. })
    }
}

/// Acceptor reply to an accept request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcceptResponse {
    Accepted,
    /// Already promised `promised`, which is above the offered number
    Reject { promised: ProposalNumber },
}

impl AcceptResponse {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AcceptResponse::Accepted)
    }
}

/// Point-in-time view of one acceptor's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptorSnapshot {
    pub id: NodeId,
    pub highest_promised: Option<ProposalNumber>,
    pub accepted: Option<AcceptedProposal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_number_ordering() {
        let a = ProposalNumber::new(1, NodeId(9));
        let b = ProposalNumber::new(2, NodeId(0));
        let c = ProposalNumber::new(2, NodeId(1));

        assert!(a < b);
        assert!(b < c);
        assert!(ProposalNumber::ZERO < a);
    }

    #[test]
    fn test_next_for() {
        let n = ProposalNumber::new(4, NodeId(2));
        assert_eq!(n.next_for(NodeId(7)), ProposalNumber::new(5, NodeId(7)));
    }

    #[test]
    fn test_value_is_transparent_json() {
        let value = Value::new("A");
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"A\"");
    }
}
