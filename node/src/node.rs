//! Full node implementation

use crate::api::{bind_api, serve_api};
use crate::runtime::NodeRuntime;
use std::sync::Arc;
use synod_core::{NodeConfig, SynodResult};
use tokio::signal;
use tracing::{error, info};

/// Full Synod node
pub struct SynodNode {
    runtime: Arc<NodeRuntime>,
}

impl SynodNode {
    /// Create a new node
    pub fn new(config: NodeConfig) -> SynodResult<Self> {
        let runtime = Arc::new(NodeRuntime::new(config)?);
        Ok(Self { runtime })
    }

    /// Start the node and serve until Ctrl-C.
    ///
    /// Fails right away if the API address cannot be bound, and returns the
    /// server's error if it stops on its own.
    pub async fn start(&self) -> anyhow::Result<()> {
        info!("Starting Synod node...");

        let listener = bind_api(&self.runtime.config().api.listen_addr).await?;
        let mut api_handle = tokio::spawn(serve_api(self.runtime.clone(), listener));

        info!("Node started successfully");
        info!("Node ID: {}", self.runtime.node_id());
        info!(
            "Acceptors: {} (quorum {})",
            self.runtime.acceptor_count(),
            self.runtime.quorum()
        );

        tokio::select! {
            result = &mut api_handle => {
                error!("API server stopped unexpectedly");
                result??;
            }
            signal = signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("Shutdown signal received, stopping node..."),
                    Err(e) => error!("Error waiting for shutdown signal: {}", e),
                }
                api_handle.abort();
            }
        }

        info!("Node stopped");

        Ok(())
    }

    /// Get runtime reference
    pub fn runtime(&self) -> &Arc<NodeRuntime> {
        &self.runtime
    }
}

/// Node builder for easier configuration
pub struct NodeBuilder {
    config: NodeConfig,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self {
            config: NodeConfig::default(),
        }
    }

    pub fn config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn node_id(mut self, node_id: u32) -> Self {
        self.config.node_id = node_id;
        self
    }

    pub fn api_addr(mut self, addr: &str) -> Self {
        self.config.api.listen_addr = addr.to_string();
        self
    }

    pub fn acceptors(mut self, count: usize) -> Self {
        self.config.consensus.acceptor_count = count;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.consensus.max_retries = retries;
        self
    }

    pub fn request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.consensus.request_timeout_ms = timeout_ms;
        self
    }

    pub fn build(self) -> SynodResult<SynodNode> {
        SynodNode::new(self.config)
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
