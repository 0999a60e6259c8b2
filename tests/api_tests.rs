use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use anime_api::config::{Config, StorageBackend};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::path::PathBuf;
use tower::ServiceExt;

fn temp_document_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("anime-api-test-{}", uuid::Uuid::new_v4()))
        .join("anime.json")
}

async fn spawn_app_with(config: Config) -> Router {
    let state = anime_api::api::create_app_state(config, None)
        .await
        .expect("Failed to create app state");
    anime_api::api::router(state)
}

async fn spawn_app() -> (Router, PathBuf) {
    let path = temp_document_path();
    let mut config = Config::default();
    config.storage.document_path = path.display().to_string();
    (spawn_app_with(config).await, path)
}

async fn spawn_relational_app() -> Router {
    let mut config = Config::default();
    config.storage.backend = StorageBackend::Relational;
    config.storage.database_url = "sqlite::memory:".to_string();
    spawn_app_with(config).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn send_raw(app: &Router, method: &str, uri: &str, raw: impl Into<Body>) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(raw.into())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn create(app: &Router, body: Value) -> Value {
    let response = send(app, "POST", "/api/anime", Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

#[tokio::test]
async fn test_health() {
    let (app, _) = spawn_app().await;

    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        mime::APPLICATION_JSON.as_ref()
    );
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_create_then_replace_scenario() {
    let (app, path) = spawn_app().await;

    let response = send(
        &app,
        "POST",
        "/anime",
        Some(json!({ "title": "Naruto", "year": 2002, "genres": ["Action", "Adventure"] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();
    let created = json_body(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(location, format!("/anime/{id}"));
    assert_eq!(
        created,
        json!({
            "id": id,
            "title": "Naruto",
            "year": 2002,
            "genres": ["Action", "Adventure"],
            "author": null,
            "studio": null
        })
    );

    let response = send(&app, "GET", &format!("/anime/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, created);

    let response = send(
        &app,
        "PUT",
        &format!("/anime/{id}"),
        Some(json!({ "id": "ignored", "title": "Naruto Shippuden", "year": 2007 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "id": id,
            "title": "Naruto Shippuden",
            "year": 2007,
            "genres": [],
            "author": null,
            "studio": null
        })
    );

    let stored: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(stored[0]["title"], "Naruto Shippuden");
}

#[tokio::test]
async fn test_location_follows_matched_collection() {
    let (app, _) = spawn_app().await;

    let response = send(&app, "POST", "/api/anime", Some(json!({ "title": "Akira" }))).await;
    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();
    let created = json_body(response).await;

    assert_eq!(
        location,
        format!("/api/anime/{}", created["id"].as_str().unwrap())
    );

    let response = send(&app, "GET", &location, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_patch_only_changes_given_fields() {
    let (app, _) = spawn_app().await;
    let created = create(
        &app,
        json!({
            "title": "Mushishi",
            "year": 2005,
            "genres": ["Mystery"],
            "author": "Yuki Urushibara",
            "studio": "Artland"
        }),
    )
    .await;
    let uri = format!("/api/anime/{}", created["id"].as_str().unwrap());

    let response = send(&app, "PATCH", &uri, Some(json!({ "year": 2020 }))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut expected = created.clone();
    expected["year"] = json!(2020);
    assert_eq!(json_body(response).await, expected);

    let response = send(&app, "GET", &uri, None).await;
    assert_eq!(json_body(response).await, expected);
}

#[tokio::test]
async fn test_invalid_patch_is_rejected_and_record_unchanged() {
    let (app, _) = spawn_app().await;
    let created = create(&app, json!({ "title": "Monster", "genres": ["Thriller"] })).await;
    let uri = format!("/api/anime/{}", created["id"].as_str().unwrap());

    let response = send(&app, "PATCH", &uri, Some(json!({ "genres": "not-an-array" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "genres must be an array" })
    );

    let response = send(&app, "PATCH", &uri, Some(json!({ "title": "   " }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", &uri, None).await;
    assert_eq!(json_body(response).await, created);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let (app, _) = spawn_app().await;
    let created = create(&app, json!({ "title": "Trigun" })).await;
    let uri = format!("/api/anime/{}", created["id"].as_str().unwrap());

    let response = send(&app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, created);

    let response = send(&app, "GET", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_ids_are_not_found() {
    let (app, _) = spawn_app().await;
    let body = json!({ "title": "Ghost" });

    for (method, body) in [
        ("GET", None),
        ("PUT", Some(body.clone())),
        ("PATCH", Some(body)),
        ("DELETE", None),
    ] {
        let response = send(&app, method, "/api/anime/does-not-exist", body).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
        assert!(json_body(response).await["error"].is_string());
    }
}

#[tokio::test]
async fn test_replace_reports_unknown_id_before_validating() {
    let (app, _) = spawn_app().await;

    let response = send(&app, "PUT", "/api/anime/nope", Some(json!({ "title": "" }))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Anime nope not found" })
    );

    let created = create(&app, json!({ "title": "Mushishi" })).await;
    let uri = format!("/api/anime/{}", created["id"].as_str().unwrap());
    let response = send(&app, "PUT", &uri, Some(json!({ "title": "" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_filters_case_insensitively() {
    let (app, _) = spawn_app().await;
    for title in ["ABC Story", "The abc Club", "Xyz"] {
        create(&app, json!({ "title": title })).await;
    }

    let response = send(&app, "GET", "/api/anime?q=abc", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let titles: Vec<String> = json_body(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["ABC Story", "The abc Club"]);

    let response = send(&app, "GET", "/api/anime?q=", None).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 3);

    let response = send(&app, "GET", "/anime", None).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 3);

    let response = send(&app, "GET", "/anime?q=%20XYZ%20", None).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_validation_errors() {
    let (app, _) = spawn_app().await;

    let response = send(&app, "POST", "/api/anime", Some(json!({ "title": "  " }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "title is required (string)" })
    );

    let response = send(&app, "POST", "/api/anime", Some(json!({ "year": 2000 }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/api/anime",
        Some(json!({ "title": "Ok", "genres": "Action" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/api/anime",
        Some(json!({ "title": "A", "genres": [1, "x"] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "genres must only contain strings" })
    );

    let response = send_raw(&app, "POST", "/api/anime", "{not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Invalid JSON" }));

    let response = send_raw(&app, "POST", "/api/anime", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/api/anime", None).await;
    assert!(json_body(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let path = temp_document_path();
    let mut config = Config::default();
    config.storage.document_path = path.display().to_string();
    config.server.max_body_bytes = 64;
    let app = spawn_app_with(config).await;

    let body = json!({ "title": "x".repeat(200) }).to_string();
    let response = send_raw(&app, "POST", "/api/anime", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Body too large" }));
}

#[tokio::test]
async fn test_unmatched_routes_fall_through_to_not_found() {
    let (app, _) = spawn_app().await;

    for (method, uri) in [
        ("GET", "/nope"),
        ("POST", "/health"),
        ("POST", "/api/anime/some-id"),
        ("DELETE", "/api/anime"),
        ("GET", "/api/anime/a/b"),
        ("GET", "/metrics"),
    ] {
        let response = send(&app, method, uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(json_body(response).await, json!({ "error": "Not found" }));
    }
}

#[tokio::test]
async fn test_storage_failures_are_opaque() {
    let (app, path) = spawn_app().await;
    std::fs::write(&path, "{ definitely not an array").unwrap();

    let response = send(&app, "GET", "/api/anime", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Internal server error" })
    );
}

#[tokio::test]
async fn test_relational_backend_crud() {
    let app = spawn_relational_app().await;

    let created = create(
        &app,
        json!({ "title": "Cowboy Bebop", "year": "1998", "genres": ["Space", "Western"] }),
    )
    .await;
    let uri = format!("/anime/{}", created["id"].as_str().unwrap());
    assert_eq!(created["year"], 1998);

    let response = send(&app, "GET", &uri, None).await;
    assert_eq!(json_body(response).await, created);

    let response = send(&app, "PATCH", &uri, Some(json!({ "studio": " Sunrise " }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let patched = json_body(response).await;
    assert_eq!(patched["studio"], "Sunrise");
    assert_eq!(patched["genres"], json!(["Space", "Western"]));

    let response = send(&app, "PUT", &uri, Some(json!({ "title": "" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/anime?q=BEBOP", None).await;
    assert_eq!(json_body(response).await, json!([patched]));

    let response = send(&app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unserialized_writes_still_persist() {
    let path = temp_document_path();
    let mut config = Config::default();
    config.storage.document_path = path.display().to_string();
    config.storage.serialize_writes = false;
    let app = spawn_app_with(config).await;

    let created = create(&app, json!({ "title": "Trigun", "year": 1998 })).await;
    let uri = format!("/anime/{}", created["id"].as_str().unwrap());

    let response = send(&app, "PATCH", &uri, Some(json!({ "studio": "Madhouse" }))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = json_body(send(&app, "GET", &uri, None).await).await;
    assert_eq!(fetched["title"], "Trigun");
    assert_eq!(fetched["year"], 1998);
    assert_eq!(fetched["studio"], "Madhouse");
}

#[tokio::test]
async fn test_metrics_endpoint_when_enabled() {
    let path = temp_document_path();
    let mut config = Config::default();
    config.storage.document_path = path.display().to_string();
    config.observability.metrics_enabled = true;

    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle();
    let state = anime_api::api::create_app_state(config, Some(handle))
        .await
        .expect("Failed to create app state");
    let app = anime_api::api::router(state);

    send(&app, "GET", "/health", None).await;

    let response = send(&app, "GET", "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"), "{content_type}");
}
