//! Core traits defining Synod interfaces

use crate::types::*;
use async_trait::async_trait;
use std::time::Duration;

/// Result type for Synod operations
pub type SynodResult<T> = Result<T, crate::error::SynodError>;

/// A voting member of the quorum.
///
/// Implementations answer prepare and accept requests under the ordering rule
/// and never fail outside of it: every call resolves to a promise, an accept,
/// or a rejection.
#[async_trait]
pub trait Acceptor: Send + Sync {
    /// Identifier of this acceptor within its set
    fn id(&self) -> NodeId;

    /// Phase 1: promise not to accept proposals numbered below `number`
    async fn prepare(&self, number: ProposalNumber) -> PrepareResponse;

    /// Phase 2: accept `value` under `number`
    async fn accept(&self, number: ProposalNumber, value: Value) -> AcceptResponse;

    /// Current state, for status reporting
    fn snapshot(&self) -> AcceptorSnapshot;
}

/// Supplies the pause before retry number `attempt` (zero based).
pub trait RetryPolicy: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

impl<F> RetryPolicy for F
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn delay(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}
