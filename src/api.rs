use std::net::SocketAddr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;

use crate::errors::{ChainError, ChainResult};
use crate::node::{NodeHandle, NodeStatus};
use crate::types::{
    Audit, Block, BlockCommitResponse, BlockVoteResponse, GetBlockResponse, HeartbeatRequest,
    HeartbeatResponse, NotifyLeadershipRequest, NotifyLeadershipResponse, SubmitAuditResponse,
    TriggerElectionRequest, TriggerElectionResponse, WhisperResponse,
};

#[derive(Clone)]
struct AppState {
    node: NodeHandle,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    address: String,
}

pub fn router(node: NodeHandle) -> Router {
    let state = AppState { node };
    Router::new()
        .route("/health", get(health))
        .route("/status/node", get(node_status))
        .route("/audits", post(submit_audit))
        .route("/gossip/audits", post(whisper_audit))
        .route("/blocks/propose", post(propose_block))
        .route("/blocks/commit", post(commit_block))
        .route("/blocks/:id", get(get_block))
        .route("/heartbeats", post(send_heartbeat))
        .route("/elections/trigger", post(trigger_election))
        .route("/elections/leader", post(notify_leadership))
        .with_state(state)
}

pub async fn serve(node: NodeHandle, addr: SocketAddr) -> ChainResult<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(?addr, "RPC server listening");
    axum::serve(listener, router(node))
        .await
        .map_err(|err| ChainError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        address: state.node.address().to_string(),
    })
}

async fn node_status(State(state): State<AppState>) -> Json<NodeStatus> {
    Json(state.node.node_status())
}

async fn submit_audit(
    State(state): State<AppState>,
    Json(audit): Json<Audit>,
) -> Result<Json<SubmitAuditResponse>, (StatusCode, Json<ErrorResponse>)> {
    state
        .node
        .submit_audit(audit)
        .await
        .map(Json)
        .map_err(to_http_error)
}

async fn whisper_audit(
    State(state): State<AppState>,
    Json(audit): Json<Audit>,
) -> Result<Json<WhisperResponse>, (StatusCode, Json<ErrorResponse>)> {
    state.node.whisper_audit(audit).map(Json).map_err(to_http_error)
}

async fn propose_block(
    State(state): State<AppState>,
    Json(block): Json<Block>,
) -> Json<BlockVoteResponse> {
    Json(state.node.propose_block(&block))
}

async fn commit_block(
    State(state): State<AppState>,
    Json(block): Json<Block>,
) -> Json<BlockCommitResponse> {
    Json(state.node.commit_block(&block))
}

async fn get_block(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Json<GetBlockResponse> {
    Json(state.node.get_block(id))
}

async fn send_heartbeat(
    State(state): State<AppState>,
    Json(request): Json<HeartbeatRequest>,
) -> Json<HeartbeatResponse> {
    Json(state.node.record_heartbeat(request))
}

async fn trigger_election(
    State(state): State<AppState>,
    Json(request): Json<TriggerElectionRequest>,
) -> Json<TriggerElectionResponse> {
    Json(state.node.trigger_election(request))
}

async fn notify_leadership(
    State(state): State<AppState>,
    Json(request): Json<NotifyLeadershipRequest>,
) -> Json<NotifyLeadershipResponse> {
    Json(state.node.notify_leadership(request))
}

fn to_http_error(err: ChainError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        ChainError::Validation(_) => StatusCode::BAD_REQUEST,
        ChainError::Config(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
