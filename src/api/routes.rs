//! Declarative (method, path pattern) table and the dispatcher that serves it.
//!
//! Patterns are `/`-separated segments; a segment starting with `:` binds the
//! request segment at that position under its name. Matching is exact per
//! segment after percent-decoding, and empty segments are ignored on both
//! sides, so `//anime///x` matches `/anime/:id`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, Uri},
    response::{IntoResponse, Response},
};

use super::{AppState, anime, system};
use crate::api::ApiError;

/// Collection paths the anime endpoints are mounted under.
pub const ANIME_COLLECTIONS: [&str; 2] = ["/api/anime", "/anime"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    Metrics,
    ListAnime,
    GetAnime,
    CreateAnime,
    ReplaceAnime,
    PatchAnime,
    DeleteAnime,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: String,
    pub endpoint: Endpoint,
}

impl Route {
    fn new(method: Method, pattern: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            endpoint,
        }
    }
}

pub type PathParams = HashMap<String, String>;

#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: PathParams,
}

impl RouteMatch<'_> {
    pub fn param(&self, name: &str) -> Result<&str, ApiError> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::internal(format!("route {} has no :{name}", self.route.pattern)))
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new(metrics_enabled: bool) -> Self {
        let mut routes = vec![Route::new(Method::GET, "/health", Endpoint::Health)];

        if metrics_enabled {
            routes.push(Route::new(Method::GET, "/metrics", Endpoint::Metrics));
        }

        for collection in ANIME_COLLECTIONS {
            let item = format!("{collection}/:id");
            routes.extend([
                Route::new(Method::GET, collection, Endpoint::ListAnime),
                Route::new(Method::POST, collection, Endpoint::CreateAnime),
                Route::new(Method::GET, item.clone(), Endpoint::GetAnime),
                Route::new(Method::PUT, item.clone(), Endpoint::ReplaceAnime),
                Route::new(Method::PATCH, item.clone(), Endpoint::PatchAnime),
                Route::new(Method::DELETE, item, Endpoint::DeleteAnime),
            ]);
        }

        Self { routes }
    }

    /// First route whose method equals `method` and whose pattern matches `path`.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| match_path(&route.pattern, path).map(|params| RouteMatch { route, params }))
    }
}

/// Matches `path` against `pattern`, returning bound parameters on success.
///
/// Segment counts must be equal. A segment that is not valid percent-encoded
/// UTF-8 never matches.
#[must_use]
pub fn match_path(pattern: &str, path: &str) -> Option<PathParams> {
    let expected: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if expected.len() != actual.len() {
        return None;
    }

    let mut params = PathParams::new();
    for (want, got) in expected.iter().zip(&actual) {
        let decoded = urlencoding::decode(got).ok()?;
        if let Some(name) = want.strip_prefix(':') {
            params.insert(name.to_string(), decoded.into_owned());
        } else if *want != decoded {
            return None;
        }
    }

    Some(params)
}

/// Router fallback: resolves the request against the route table and runs the handler.
pub async fn dispatch(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    let Some(matched) = state.routes.resolve(&parts.method, parts.uri.path()) else {
        record_metrics(&parts.method, "unmatched", 404, start);
        return ApiError::route_not_found().into_response();
    };

    let result = handle(&state, &matched, &parts.uri, body).await;

    let response = result.unwrap_or_else(IntoResponse::into_response);
    record_metrics(
        &parts.method,
        &matched.route.pattern,
        response.status().as_u16(),
        start,
    );
    response
}

async fn handle(
    state: &AppState,
    matched: &RouteMatch<'_>,
    uri: &Uri,
    body: Body,
) -> Result<Response, ApiError> {
    match matched.route.endpoint {
        Endpoint::Health => Ok(system::health()),
        Endpoint::Metrics => Ok(system::metrics(state)),
        Endpoint::ListAnime => anime::list_anime(state, uri).await,
        Endpoint::GetAnime => anime::get_anime(state, matched.param("id")?).await,
        Endpoint::CreateAnime => anime::create_anime(state, &matched.route.pattern, body).await,
        Endpoint::ReplaceAnime => anime::replace_anime(state, matched.param("id")?, body).await,
        Endpoint::PatchAnime => anime::patch_anime(state, matched.param("id")?, body).await,
        Endpoint::DeleteAnime => anime::delete_anime(state, matched.param("id")?).await,
    }
}

fn record_metrics(method: &Method, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", route.to_string()),
        ("status", status.to_string()),
    ];

    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}
