use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use super::{AppState, HealthResponse};

pub fn health() -> Response {
    Json(HealthResponse { status: "ok" }).into_response()
}

pub fn metrics(state: &AppState) -> Response {
    state.prometheus_handle.as_ref().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Metrics not enabled or failed to initialize",
            )
                .into_response()
        },
        |handle| {
            (
                [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                handle.render(),
            )
                .into_response()
        },
    )
}
