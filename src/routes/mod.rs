// HTTP API routes

mod http;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::autoheal::HealService;
use crate::config::AppConfig;
use crate::docker_repo::ContainerGateway;
use crate::metrics_repo::MetricsRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) gateway: Arc<dyn ContainerGateway>,
    pub(crate) repo: Arc<MetricsRepo>,
    pub(crate) heal: Arc<HealService>,
    pub(crate) config: AppConfig,
}

pub fn app(
    gateway: Arc<dyn ContainerGateway>,
    repo: Arc<MetricsRepo>,
    heal: Arc<HealService>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        gateway,
        repo,
        heal,
        config,
    };

    let api = Router::new()
        .route("/containers", get(http::list_containers)) // GET /api/containers
        .route("/metrics", get(http::latest_metrics)) // GET /api/metrics
        .route("/metrics/{id}/history", get(http::metrics_history)) // GET /api/metrics/{id}/history
        .route("/logs", get(http::container_logs)) // GET /api/logs?container=<name>
        .route("/containers/{name}/restart", post(http::restart_container)) // POST /api/containers/{name}/restart
        .route("/autoheal/history", get(http::autoheal_history)) // GET /api/autoheal/history
        .route("/autoheal/trigger", post(http::trigger_autoheal)) // POST /api/autoheal/trigger
        .route("/alerts", get(http::active_alerts)) // GET /api/alerts
        .layer(middleware::from_fn_with_state(
            state.clone(),
            http::require_admin_token,
        ));

    Router::new()
        .route("/health", get(http::health)) // GET /health (unauthenticated)
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/auth/login", post(http::login)) // POST /api/auth/login
        .nest("/api", api)
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
