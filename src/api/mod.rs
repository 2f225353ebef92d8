use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::events::{constants, log_views};
use crate::node::VerifierNode;
use crate::push::PushMessage;
use crate::sms::SendResult;

#[derive(Clone)]
pub struct ApiState {
    pub node: Arc<VerifierNode>,
}

#[derive(Serialize)]
struct PushResponse {
    outcome: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResultRequest {
    message_id: String,
    result_code: i32,
}

#[derive(Serialize)]
struct SendResultResponse {
    delivered: bool,
}

#[derive(Deserialize)]
struct ToggleServiceRequest {
    enabled: bool,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

/// Routes of the control surface.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/push", post(push_handler))
        .route("/api/sms/result", post(send_result_handler))
        .route("/api/service", get(service_status_handler).post(toggle_service_handler))
        .route("/api/logs", get(logs_handler))
        .route("/api/token", get(token_handler))
        .route("/api/constants", get(constants_handler))
        .with_state(state)
}

pub async fn run_api(addr: SocketAddr, state: ApiState, shutdown: CancellationToken) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors).layer(TraceLayer::new_for_http());

    tracing::info!(addr = %addr, "Starting control API");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

async fn push_handler(
    State(state): State<ApiState>,
    Json(push): Json<PushMessage>,
) -> impl IntoResponse {
    let outcome = state.node.handle_push(&push).await;
    (
        StatusCode::ACCEPTED,
        Json(PushResponse {
            outcome: outcome.as_str(),
        }),
    )
}

async fn send_result_handler(
    State(state): State<ApiState>,
    Json(payload): Json<SendResultRequest>,
) -> impl IntoResponse {
    let result = SendResult::from_code(payload.result_code);
    let delivered = state
        .node
        .deliver_send_result(&payload.message_id, result)
        .await;
    let status = if delivered {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    (status, Json(SendResultResponse { delivered }))
}

async fn service_status_handler(State(state): State<ApiState>) -> axum::response::Response {
    match state.node.get_verifier_service_status().await {
        Ok(status) => Json(StatusResponse { status }).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn toggle_service_handler(
    State(state): State<ApiState>,
    Json(payload): Json<ToggleServiceRequest>,
) -> axum::response::Response {
    if let Err(e) = state.node.toggle_verifier_service(payload.enabled).await {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e);
    }
    service_status_handler(State(state)).await
}

async fn logs_handler(State(state): State<ApiState>) -> axum::response::Response {
    match state.node.get_sms_send_logs().await {
        Ok(logs) => Json(log_views(&logs)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn token_handler(State(state): State<ApiState>) -> axum::response::Response {
    match state.node.get_device_token() {
        Some(token) => Json(TokenResponse {
            token: token.to_string(),
        })
        .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "no device token registered"),
    }
}

async fn constants_handler() -> impl IntoResponse {
    Json(constants())
}
