//! CLI Commands

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use synod_core::{AcceptorSnapshot, ProposalNumber};
use thiserror::Error;

/// API Client for interacting with a Synod node
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
        })
    }

    /// Check liveness
    pub async fn health(&self) -> Result<bool, ApiError> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(resp.status().is_success())
    }

    /// Get node status
    pub async fn status(&self) -> Result<NodeStatus, ApiError> {
        let url = format!("{}/status", self.base_url);
        let resp: ApiResponse<NodeStatus> = self.client.get(&url).send().await?.json().await?;
        resp.into_data()
    }

    /// Get per-acceptor state
    pub async fn acceptors(&self) -> Result<Vec<AcceptorSnapshot>, ApiError> {
        let url = format!("{}/acceptors", self.base_url);
        let resp: ApiResponse<Vec<AcceptorSnapshot>> =
            self.client.get(&url).send().await?.json().await?;
        resp.into_data()
    }

    /// Submit a proposal. A conflict comes back as [`ApiError::Conflict`].
    pub async fn propose(&self, req: &ProposeRequest) -> Result<Decided, ApiError> {
        let url = format!("{}/propose", self.base_url);
        let resp: ApiResponse<ProposeResponse> = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await?
            .json()
            .await?;

        match (resp.success, resp.data) {
            (true, Some(data)) => match (data.value, data.proposal_number) {
                (Some(value), Some(proposal_number)) => Ok(Decided {
                    value,
                    proposal_number,
                    attempts: data.attempts,
                }),
                _ => Err(ApiError::EmptyResponse),
            },
            (false, Some(data)) if !data.decided => Err(ApiError::Conflict {
                attempts: data.attempts,
                reason: data.reason.unwrap_or_else(|| "unknown".to_string()),
            }),
            (_, _) => Err(ApiError::Server(resp.error.unwrap_or_default())),
        }
    }
}

/// API response wrapper
#[derive(Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_data(self) -> Result<T, ApiError> {
        if self.success {
            self.data.ok_or(ApiError::EmptyResponse)
        } else {
            Err(ApiError::Server(self.error.unwrap_or_default()))
        }
    }
}

/// Proposal request
#[derive(Debug, Serialize)]
pub struct ProposeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal_number: Option<u64>,
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct ProposeResponse {
    decided: bool,
    value: Option<String>,
    proposal_number: Option<ProposalNumber>,
    attempts: u32,
    reason: Option<String>,
}

/// Successful proposal
#[derive(Debug)]
pub struct Decided {
    pub value: String,
    pub proposal_number: ProposalNumber,
    pub attempts: u32,
}

/// Node status
#[derive(Debug, Deserialize)]
pub struct NodeStatus {
    pub name: String,
    pub node_id: u32,
    pub acceptor_count: usize,
    pub quorum: usize,
    pub stats: NodeStats,
}

/// Coordinator counters
#[derive(Debug, Deserialize)]
pub struct NodeStats {
    pub attempts: u64,
    pub decided: u64,
    pub exhausted: u64,
    pub cancelled: u64,
    pub last_decision: Option<LastDecision>,
}

#[derive(Debug, Deserialize)]
pub struct LastDecision {
    pub number: ProposalNumber,
    pub value: String,
    pub decided_at: u64,
}

/// API Error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Consensus not reached after {attempts} attempts ({reason})")]
    Conflict { attempts: u32, reason: String },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Empty response")]
    EmptyResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_missing_number() {
        let req = ProposeRequest {
            proposal_number: None,
            value: "A".into(),
        };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"value":"A"}"#);
    }

    #[test]
    fn test_parse_conflict_body() {
        let body = r#"{"success":false,"data":{"decided":false,"value":null,
            "proposal_number":null,"attempts":4,"reason":"exhausted"},
            "error":"Consensus not reached"}"#;
        let resp: ApiResponse<ProposeResponse> = serde_json::from_str(body).unwrap();

        assert!(!resp.success);
        let data = resp.data.unwrap();
        assert!(!data.decided);
        assert_eq!(data.attempts, 4);
        assert_eq!(data.reason.as_deref(), Some("exhausted"));
    }

    #[test]
    fn test_parse_status_body() {
        let body = r#"{"success":true,"error":null,"data":{"name":"n","node_id":1,
            "acceptor_count":3,"quorum":2,"stats":{"attempts":2,"decided":1,
            "exhausted":0,"cancelled":0,"last_decision":{"number":{"round":1,"proposer":1},
            "value":"A","decided_at":1700000000000}}}}"#;
        let status = serde_json::from_str::<ApiResponse<NodeStatus>>(body)
            .unwrap()
            .into_data()
            .unwrap();

        assert_eq!(status.quorum, 2);
        assert_eq!(status.stats.last_decision.unwrap().value, "A");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = ApiClient::new("http://127.0.0.1:8080/").unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:8080");
    }
}
