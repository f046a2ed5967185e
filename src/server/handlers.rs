use super::protocol::*;
use super::state::NodeServer;

use axum::{
    Extension, Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

/// All node endpoints, sharing one `NodeServer`.
pub fn router(server: Arc<NodeServer>) -> Router {
    Router::new()
        .route(AGENTS_ENDPOINT, get(handle_agents))
        .route(PEERS_ENDPOINT, get(handle_peers))
        .route(PAUSE_ENDPOINT, post(handle_pause))
        .route(UNPAUSE_ENDPOINT, post(handle_unpause))
        .route(SHUTDOWN_ENDPOINT, post(handle_shutdown))
        .route(SUBMIT_ENDPOINT, post(handle_submit))
        .layer(Extension(server))
}

pub async fn handle_agents(
    Extension(server): Extension<Arc<NodeServer>>,
) -> (StatusCode, Json<AgentsResponse>) {
    (StatusCode::OK, Json(server.agents_response()))
}

pub async fn handle_peers(
    Extension(server): Extension<Arc<NodeServer>>,
) -> (StatusCode, Json<PeersResponse>) {
    (StatusCode::OK, Json(server.peers_response()))
}

pub async fn handle_pause(Extension(server): Extension<Arc<NodeServer>>) -> (StatusCode, String) {
    match server.pause() {
        Ok(message) => (StatusCode::OK, message.to_string()),
        Err(e) => {
            tracing::warn!("Failed to pause: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, PAUSE_ERROR.to_string())
        }
    }
}

pub async fn handle_unpause(Extension(server): Extension<Arc<NodeServer>>) -> (StatusCode, String) {
    match server.unpause() {
        Ok(message) => (StatusCode::OK, message.to_string()),
        Err(e) => {
            tracing::warn!("Failed to unpause: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, UNPAUSE_ERROR.to_string())
        }
    }
}

pub async fn handle_shutdown(
    Extension(server): Extension<Arc<NodeServer>>,
) -> (StatusCode, String) {
    match server.begin_shutdown() {
        Ok(message) => (StatusCode::OK, message.to_string()),
        Err(e) => {
            tracing::warn!("Failed to initiate shutdown: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, SHUTDOWN_ERROR.to_string())
        }
    }
}

pub async fn handle_submit(
    Extension(server): Extension<Arc<NodeServer>>,
    Json(req): Json<SubmitRequest>,
) -> (StatusCode, Json<Option<SubmitResponse>>) {
    let filename = req.filename.clone();

    match server.submit(req).await {
        Ok(internal_id) => {
            tracing::info!("Submitted {} as {}", filename, internal_id);
            (
                StatusCode::OK,
                Json(Some(SubmitResponse {
                    internal_id: internal_id.to_string(),
                })),
            )
        }
        Err(e) => {
            tracing::error!("Failed to submit {}: {}", filename, e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(None))
        }
    }
}
