//! Node runtime wiring configuration to the coordinator

use std::sync::Arc;
use std::time::Duration;
use synod_consensus::{
    retry_policy, AcceptorSet, Coordinator, CoordinatorStats, ProposalOutcome, ProposeOptions,
    SharedCoordinator,
};
use synod_core::{AcceptorSnapshot, NodeConfig, NodeId, SynodResult, Value};
use tracing::info;

/// Node runtime managing the coordinator and its acceptors
pub struct NodeRuntime {
    config: NodeConfig,
    coordinator: SharedCoordinator,
}

impl NodeRuntime {
    /// Create a runtime with a fresh in-process acceptor set
    pub fn new(config: NodeConfig) -> SynodResult<Self> {
        config.validate()?;

        let acceptors = AcceptorSet::local(config.consensus.acceptor_count)?;
        let policy = retry_policy(&config.consensus.retry);
        let coordinator = Arc::new(Coordinator::new(
            NodeId(config.node_id),
            acceptors,
            policy,
        ));

        info!(
            acceptors = config.consensus.acceptor_count,
            quorum = coordinator.acceptors().quorum(),
            "runtime initialized"
        );

        Ok(Self {
            config,
            coordinator,
        })
    }

    /// Create a runtime around an existing coordinator
    pub fn with_coordinator(config: NodeConfig, coordinator: SharedCoordinator) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    /// Propose `value` with the configured retry budget and deadline
    pub async fn propose(&self, hint: Option<u64>, value: Value) -> SynodResult<ProposalOutcome> {
        let consensus = &self.config.consensus;
        let options = ProposeOptions::new(
            consensus.max_retries,
            Duration::from_millis(consensus.request_timeout_ms),
        )
        .with_hint(hint);

        self.coordinator.propose(value, options).await
    }

    pub fn node_id(&self) -> NodeId {
        self.coordinator.node_id()
    }

    pub fn acceptor_count(&self) -> usize {
        self.coordinator.acceptors().len()
    }

    pub fn quorum(&self) -> usize {
        self.coordinator.acceptors().quorum()
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.coordinator.stats()
    }

    pub fn acceptor_snapshots(&self) -> Vec<AcceptorSnapshot> {
        self.coordinator.acceptors().snapshots()
    }

    /// Get config reference
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &SharedCoordinator {
        &self.coordinator
    }
}
