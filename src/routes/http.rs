// JSON handlers. Successful payloads are wrapped as {"data": ...}; errors
// as {"error": ...} with the status the taxonomy maps to.

use axum::{
    Json,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::docker_repo;
use crate::error::GatewayError;
use crate::version::{NAME, VERSION};

fn data<T: serde::Serialize>(value: T) -> Response {
    Json(serde_json::json!({ "data": value })).into_response()
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.to_string() })),
    )
        .into_response()
}

fn gateway_error(e: GatewayError) -> Response {
    let status = match &e {
        GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e)
}

fn store_error(e: anyhow::Error) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
}

/// GET /health: unauthenticated liveness probe.
pub(super) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy", "version": VERSION }))
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "name": NAME, "version": VERSION }))
}

#[derive(Deserialize)]
pub(super) struct LoginRequest {
    token: String,
}

/// POST /api/auth/login: echoes the token back when it matches.
pub(super) async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Response {
    if body.token == state.config.auth.admin_token {
        Json(serde_json::json!({ "token": body.token })).into_response()
    } else {
        error_response(StatusCode::UNAUTHORIZED, "invalid token")
    }
}

/// Bearer-token check in front of every /api route except login.
pub(super) async fn require_admin_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let expected = format!("Bearer {}", state.config.auth.admin_token);
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized");
    }
    next.run(request).await
}

/// GET /api/containers: all containers minus excluded names.
pub(super) async fn list_containers(State(state): State<AppState>) -> Response {
    match state.gateway.list_containers(true).await {
        Ok(containers) => {
            let exclude = &state.config.autoheal.exclude_containers;
            let visible: Vec<_> = containers
                .into_iter()
                .filter(|c| !exclude.contains(&c.name))
                .collect();
            data(visible)
        }
        Err(e) => gateway_error(e),
    }
}

/// GET /api/metrics: latest metric per container.
pub(super) async fn latest_metrics(State(state): State<AppState>) -> Response {
    match state.repo.latest_metrics().await {
        Ok(metrics) => data(metrics),
        Err(e) => store_error(e),
    }
}

#[derive(Deserialize)]
pub(super) struct HistoryQuery {
    #[serde(default = "default_hours")]
    hours: u32,
}

fn default_hours() -> u32 {
    24
}

/// GET /api/metrics/{id}/history?hours=24
pub(super) async fn metrics_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    match state.repo.metrics_since(&id, query.hours).await {
        Ok(metrics) => data(metrics),
        Err(e) => store_error(e),
    }
}

#[derive(Deserialize)]
pub(super) struct LogsQuery {
    container: String,
    #[serde(default = "default_lines")]
    lines: usize,
}

fn default_lines() -> usize {
    100
}

/// GET /api/logs?container=<name>&lines=100
pub(super) async fn container_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Response {
    let container = match docker_repo::find_by_name(state.gateway.as_ref(), &query.container).await
    {
        Ok(c) => c,
        Err(e) => return gateway_error(e),
    };
    match state.gateway.logs(&container.id, query.lines).await {
        Ok(lines) => data(lines),
        Err(e) => gateway_error(e),
    }
}

/// POST /api/containers/{name}/restart
pub(super) async fn restart_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    let container = match docker_repo::find_by_name(state.gateway.as_ref(), &name).await {
        Ok(c) => c,
        Err(e) => return gateway_error(e),
    };
    match state.gateway.restart(&container.id).await {
        Ok(()) => Json(serde_json::json!({ "message": "Container restarted successfully" }))
            .into_response(),
        Err(e) => gateway_error(e),
    }
}

#[derive(Deserialize)]
pub(super) struct HealHistoryQuery {
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    50
}

/// GET /api/autoheal/history?limit=50
pub(super) async fn autoheal_history(
    State(state): State<AppState>,
    Query(query): Query<HealHistoryQuery>,
) -> Response {
    match state.repo.recent_heal_events(query.limit).await {
        Ok(events) => data(events),
        Err(e) => store_error(e),
    }
}

/// POST /api/autoheal/trigger: runs one healing pass inline and returns the
/// events it produced.
pub(super) async fn trigger_autoheal(State(state): State<AppState>) -> Response {
    let events = state.heal.run_healing_pass().await;
    data(events)
}

/// GET /api/alerts: active alerts, newest first.
pub(super) async fn active_alerts(State(state): State<AppState>) -> Response {
    match state.repo.active_alerts().await {
        Ok(alerts) => data(alerts),
        Err(e) => store_error(e),
    }
}
