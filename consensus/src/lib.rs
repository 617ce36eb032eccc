//! Synod Consensus Engine
//!
//! Implements single-decree Paxos over a fixed, in-process acceptor set:
//! - Acceptors guarding the promise/accept ordering rule
//! - Two-phase proposer with majority quorums
//! - Serialized retry coordinator with deadlines and pluggable backoff

pub mod acceptor;
pub mod allocator;
pub mod coordinator;
pub mod proposer;
pub mod quorum;
pub mod retry;

pub use acceptor::*;
pub use allocator::*;
pub use coordinator::*;
pub use proposer::*;
pub use quorum::*;
pub use retry::*;
