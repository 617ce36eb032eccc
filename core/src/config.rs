//! Configuration types for Synod

use crate::error::SynodError;
use crate::traits::SynodResult;
use serde::{Deserialize, Serialize};

/// Main node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node name for logging
    pub name: String,

    /// Proposer identity, tie breaker for proposal numbers
    pub node_id: u32,

    /// Consensus configuration
    pub consensus: ConsensusConfig,

    /// API configuration
    pub api: ApiConfig,

    /// Logging level or `EnvFilter` directive
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "synod-node".to_string(),
            node_id: 1,
            consensus: ConsensusConfig::default(),
            api: ApiConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Parse from JSON, then validate
    pub fn from_json(json: &str) -> SynodResult<Self> {
        let config: NodeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> SynodResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> SynodResult<()> {
        if self.consensus.acceptor_count == 0 {
            return Err(SynodError::ConfigError(
                "acceptor_count must be at least 1".into(),
            ));
        }

        if self.consensus.request_timeout_ms == 0 {
            return Err(SynodError::ConfigError(
                "request_timeout_ms must be positive".into(),
            ));
        }

        if let RetryConfig::Exponential {
            initial_ms,
            max_ms,
            multiplier,
            ..
        } = self.consensus.retry
        {
            if !(multiplier >= 1.0) {
                return Err(SynodError::ConfigError(format!(
                    "backoff multiplier must be >= 1.0, got {}",
                    multiplier
                )));
            }
            if max_ms < initial_ms {
                return Err(SynodError::ConfigError(format!(
                    "backoff max_ms ({}) is below initial_ms ({})",
                    max_ms, initial_ms
                )));
            }
        }

        if self.api.listen_addr.trim().is_empty() {
            return Err(SynodError::ConfigError("api.listen_addr is empty".into()));
        }

        Ok(())
    }
}

/// Consensus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Size of the in-process acceptor set, fixed at start
    pub acceptor_count: usize,

    /// Retries after the first attempt, per request
    pub max_retries: u32,

    /// Per-request deadline in milliseconds
    pub request_timeout_ms: u64,

    /// Pause between attempts
    pub retry: RetryConfig,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            acceptor_count: 3,
            max_retries: 3,
            request_timeout_ms: 5000,
            retry: RetryConfig::default(),
        }
    }
}

/// Delay strategy between proposal attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RetryConfig {
    /// Constant pause
    Fixed { delay_ms: u64 },
    /// Doubling pause with optional jitter, capped at `max_ms`
    Exponential {
        initial_ms: u64,
        max_ms: u64,
        multiplier: f64,
        jitter: bool,
    },
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig::Fixed { delay_ms: 500 }
    }
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API listen address
    pub listen_addr: String,

    /// Enable permissive CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            enable_cors: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.consensus.acceptor_count, 3);
        assert_eq!(config.consensus.max_retries, 3);
        assert_eq!(config.consensus.request_timeout_ms, 5000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = NodeConfig::from_json(
            r#"{"node_id": 4, "consensus": {"acceptor_count": 5,
                "retry": {"strategy": "exponential", "initial_ms": 10,
                          "max_ms": 1000, "multiplier": 2.0, "jitter": true}}}"#,
        )
        .unwrap();

        assert_eq!(config.node_id, 4);
        assert_eq!(config.consensus.acceptor_count, 5);
        assert_eq!(config.consensus.max_retries, 3);
        assert!(matches!(
            config.consensus.retry,
            RetryConfig::Exponential { initial_ms: 10, .. }
        ));
        assert_eq!(config.api.listen_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_zero_acceptors_rejected() {
        let mut config = NodeConfig::default();
        config.consensus.acceptor_count = 0;
        assert!(matches!(config.validate(), Err(SynodError::ConfigError(_))));
    }

    #[test]
    fn test_bad_backoff_rejected() {
        let mut config = NodeConfig::default();
        config.consensus.retry = RetryConfig::Exponential {
            initial_ms: 100,
            max_ms: 10,
            multiplier: 2.0,
            jitter: false,
        };
        assert!(config.validate().is_err());

        config.consensus.retry = RetryConfig::Exponential {
            initial_ms: 10,
            max_ms: 100,
            multiplier: 0.5,
            jitter: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_strategy_tag() {
        let json = NodeConfig::default().to_json().unwrap();
        assert!(json.contains("\"strategy\": \"fixed\""));
    }
}
