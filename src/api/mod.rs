use axum::{Router, http::HeaderValue, middleware};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db;
use crate::services::AnimeService;

mod anime;
mod error;
mod observability;
pub mod routes;
mod system;
mod types;

pub use error::ApiError;
pub use routes::{RouteTable, match_path};
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

pub struct AppState {
    pub config: Config,

    pub anime: AnimeService,

    pub routes: RouteTable,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: Config,
        anime: AnimeService,
        prometheus_handle: Option<PrometheusHandle>,
    ) -> Self {
        let routes = RouteTable::new(config.observability.metrics_enabled);
        Self {
            config,
            anime,
            routes,
            prometheus_handle,
        }
    }
}

/// Opens the configured store and wires up the service.
pub async fn create_app_state(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = db::open_store(&config.storage).await?;
    let anime = AnimeService::new(store, config.storage.serialize_writes);

    Ok(Arc::new(AppState::new(config, anime, prometheus_handle)))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = &state.config.server.cors_allowed_origins;

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .fallback(routes::dispatch)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
