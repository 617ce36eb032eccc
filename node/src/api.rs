//! HTTP API for a Synod node

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use synod_consensus::{ConflictReason, CoordinatorStats, ProposalOutcome};
use synod_core::{AcceptorSnapshot, ProposalNumber, SynodError, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::runtime::NodeRuntime;

/// API state containing node runtime
pub type ApiState = Arc<NodeRuntime>;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }

    /// Failure that still carries a body
    pub fn failed(data: T, error: impl ToString) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error.to_string()),
        }
    }
}

/// Proposal request.
///
/// `proposal_number` is only a lower bound for the round the node allocates.
#[derive(Debug, Deserialize)]
pub struct ProposeRequest {
    #[serde(default, alias = "ProposalNumber")]
    pub proposal_number: Option<u64>,
    #[serde(alias = "Value")]
    pub value: String,
}

/// Proposal response
#[derive(Debug, Serialize)]
pub struct ProposeResponse {
    pub decided: bool,
    pub value: Option<Value>,
    pub proposal_number: Option<ProposalNumber>,
    pub attempts: u32,
    pub reason: Option<ConflictReason>,
}

/// Node status response
#[derive(Serialize)]
pub struct NodeStatusResponse {
    pub name: String,
    pub node_id: u32,
    pub acceptor_count: usize,
    pub quorum: usize,
    pub stats: CoordinatorStats,
}

/// Create API router
pub fn create_router(state: ApiState) -> Router {
    let enable_cors = state.config().api.enable_cors;

    let router = Router::new()
        // Health
        .route("/health", get(health))
        .route("/status", get(status))
        // Consensus
        .route("/propose", post(propose))
        .route("/acceptors", get(acceptors))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// Health check
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Node status
async fn status(State(runtime): State<ApiState>) -> impl IntoResponse {
    let status = NodeStatusResponse {
        name: runtime.config().name.clone(),
        node_id: runtime.node_id().0,
        acceptor_count: runtime.acceptor_count(),
        quorum: runtime.quorum(),
        stats: runtime.stats(),
    };

    Json(ApiResponse::ok(status))
}

/// Acceptor state
async fn acceptors(State(runtime): State<ApiState>) -> impl IntoResponse {
    Json(ApiResponse::<Vec<AcceptorSnapshot>>::ok(
        runtime.acceptor_snapshots(),
    ))
}

/// Submit a proposal
async fn propose(
    State(runtime): State<ApiState>,
    payload: Result<Json<ProposeRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!("Rejected proposal request: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<ProposeResponse>::err(SynodError::InvalidRequest(
                    rejection.body_text(),
                ))),
            );
        }
    };

    match runtime.propose(req.proposal_number, Value::new(req.value)).await {
        Ok(ProposalOutcome::Decided {
            value,
            number,
            attempts,
        }) => {
            debug!(%number, "responding with decided value");
            let response = ProposeResponse {
                decided: true,
                value: Some(value),
                proposal_number: Some(number),
                attempts,
                reason: None,
            };
            (StatusCode::OK, Json(ApiResponse::ok(response)))
        }
        Ok(ProposalOutcome::Conflict { reason, attempts }) => {
            let response = ProposeResponse {
                decided: false,
                value: None,
                proposal_number: None,
                attempts,
                reason: Some(reason),
            };
            (
                StatusCode::CONFLICT,
                Json(ApiResponse::failed(response, SynodError::ConsensusNotReached)),
            )
        }
        Err(e @ SynodError::InvalidRequest(_)) => {
            warn!("Rejected proposal request: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<ProposeResponse>::err(e)),
            )
        }
        Err(e) => {
            error!("Proposal failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<ProposeResponse>::err(e)),
            )
        }
    }
}

/// Bind the API listener
pub async fn bind_api(listen_addr: &str) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(listen_addr).await?;
    info!("API server listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Serve the API on an already bound listener
pub async fn serve_api(runtime: Arc<NodeRuntime>, listener: TcpListener) -> anyhow::Result<()> {
    let router = create_router(runtime);
    axum::serve(listener, router).await?;
    Ok(())
}
