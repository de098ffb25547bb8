//! HTTP trigger surface.
//!
//! All scheduling is driven from outside: an external cron (or anything able
//! to POST) hits these endpoints and the engine does the rest. Every endpoint
//! is idempotent, so early, late, or duplicate invocations are harmless.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use minder_core::config::ApiConfig;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::engine::Engine;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    engine: Arc<Engine>,
    shared_secret: Option<String>,
    uptime: Instant,
}

/// Inbound message request body.
#[derive(Debug, Deserialize)]
struct InboundRequest {
    chat_id: String,
    text: String,
}

/// Constant-time string comparison to prevent timing attacks on the shared
/// secret check.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check bearer auth. Returns `None` if authorized, `Some(response)` if rejected.
fn check_auth(
    headers: &HeaderMap,
    shared_secret: &Option<String>,
) -> Option<(StatusCode, Json<Value>)> {
    let secret = match shared_secret {
        Some(s) => s,
        None => return None, // No auth configured — allow all.
    };

    let header = match headers.get("authorization") {
        Some(h) => h,
        None => {
            return Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "missing Authorization header"})),
            ));
        }
    };

    let value = match header.to_str() {
        Ok(v) => v,
        Err(_) => {
            return Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid Authorization header"})),
            ));
        }
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if constant_time_eq(token, secret) => None,
        _ => Some((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid token"})),
        )),
    }
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    error!("trigger failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": e.to_string()})),
    )
}

/// `GET /api/health` — uptime and user count.
async fn health(
    headers: HeaderMap,
    State(state): State<ApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(err) = check_auth(&headers, &state.shared_secret) {
        return Err(err);
    }
    let users = state.engine.store().user_count().await.map_err(internal)?;
    Ok(Json(json!({
        "status": "ok",
        "uptime_secs": state.uptime.elapsed().as_secs(),
        "users": users,
    })))
}

fn rollup<T: serde::Serialize>(report: T) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    Ok(Json(serde_json::to_value(report).map_err(internal)?))
}

/// `POST /api/sweep/reminders` — reminder sweep over all users.
async fn sweep_reminders(
    headers: HeaderMap,
    State(state): State<ApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(err) = check_auth(&headers, &state.shared_secret) {
        return Err(err);
    }
    rollup(state.engine.sweep_reminders(Utc::now()).await.map_err(internal)?)
}

/// `POST /api/sweep/feedback` — feedback sweep over all users.
async fn sweep_feedback(
    headers: HeaderMap,
    State(state): State<ApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(err) = check_auth(&headers, &state.shared_secret) {
        return Err(err);
    }
    rollup(state.engine.sweep_feedback(Utc::now()).await.map_err(internal)?)
}

/// `POST /api/cron/summary` — daily aggregator over all users.
async fn cron_summary(
    headers: HeaderMap,
    State(state): State<ApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(err) = check_auth(&headers, &state.shared_secret) {
        return Err(err);
    }
    rollup(state.engine.run_summaries(Utc::now()).await.map_err(internal)?)
}

/// `POST /api/cron/rollover` — archive-in-place rollover over all users.
async fn cron_rollover(
    headers: HeaderMap,
    State(state): State<ApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(err) = check_auth(&headers, &state.shared_secret) {
        return Err(err);
    }
    rollup(state.engine.run_rollover(Utc::now()).await.map_err(internal)?)
}

/// `POST /api/cron/morning` — once-daily morning greeting.
async fn cron_morning(
    headers: HeaderMap,
    State(state): State<ApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(err) = check_auth(&headers, &state.shared_secret) {
        return Err(err);
    }
    rollup(state.engine.run_morning(Utc::now()).await.map_err(internal)?)
}

/// `POST /api/cron/evening` — once-daily evening planning prompt.
async fn cron_evening(
    headers: HeaderMap,
    State(state): State<ApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(err) = check_auth(&headers, &state.shared_secret) {
        return Err(err);
    }
    rollup(state.engine.run_evening(Utc::now()).await.map_err(internal)?)
}

/// `POST /api/inbound` — one user text message.
async fn inbound(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Result<Json<InboundRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(err) = check_auth(&headers, &state.shared_secret) {
        return Err(err);
    }
    let Json(request) = body.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("invalid request: {e}")})),
        )
    })?;
    if request.chat_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "chat_id must not be empty"})),
        ));
    }
    if request.text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "text must not be empty"})),
        ));
    }

    let reply = state
        .engine
        .handle_inbound(&request.chat_id, &request.text, Utc::now())
        .await
        .map_err(internal)?;
    Ok(Json(json!({"status": "ok", "reply": reply})))
}

/// Build the axum router with shared state.
fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sweep/reminders", post(sweep_reminders))
        .route("/api/sweep/feedback", post(sweep_feedback))
        .route("/api/cron/summary", post(cron_summary))
        .route("/api/cron/rollover", post(cron_rollover))
        .route("/api/cron/morning", post(cron_morning))
        .route("/api/cron/evening", post(cron_evening))
        .route("/api/inbound", post(inbound))
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

/// Bind and serve the trigger API. This is the process's main loop.
pub async fn serve(config: &ApiConfig, engine: Arc<Engine>) -> anyhow::Result<()> {
    let shared_secret = if config.shared_secret.is_empty() {
        None
    } else {
        Some(config.shared_secret.clone())
    };

    let state = ApiState {
        engine,
        shared_secret,
        uptime: Instant::now(),
    };

    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("trigger API listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
