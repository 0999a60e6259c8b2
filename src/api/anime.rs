use axum::{
    Json,
    body::Body,
    extract::Query,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;

use super::{ApiError, AppState, ListQuery};
use crate::services::validation::Payload;

pub async fn list_anime(state: &AppState, uri: &Uri) -> Result<Response, ApiError> {
    let Query(query) = Query::<ListQuery>::try_from_uri(uri)
        .map_err(|e| ApiError::validation(format!("Invalid query string: {e}")))?;

    let anime = state.anime.list(query.q.as_deref()).await?;
    Ok(Json(anime).into_response())
}

pub async fn get_anime(state: &AppState, id: &str) -> Result<Response, ApiError> {
    let anime = state.anime.get(id).await?;
    Ok(Json(anime).into_response())
}

/// `collection` is the path the request matched; the `Location` header points below it.
pub async fn create_anime(
    state: &AppState,
    collection: &str,
    body: Body,
) -> Result<Response, ApiError> {
    let payload = read_payload(body, state.config.server.max_body_bytes).await?;
    let anime = state.anime.create(&payload).await?;

    let location = format!("{}/{}", collection.trim_end_matches('/'), anime.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(anime),
    )
        .into_response())
}

pub async fn replace_anime(state: &AppState, id: &str, body: Body) -> Result<Response, ApiError> {
    let payload = read_payload(body, state.config.server.max_body_bytes).await?;
    let anime = state.anime.replace(id, &payload).await?;
    Ok(Json(anime).into_response())
}

pub async fn patch_anime(state: &AppState, id: &str, body: Body) -> Result<Response, ApiError> {
    let payload = read_payload(body, state.config.server.max_body_bytes).await?;
    let anime = state.anime.patch(id, &payload).await?;
    Ok(Json(anime).into_response())
}

pub async fn delete_anime(state: &AppState, id: &str) -> Result<Response, ApiError> {
    let removed = state.anime.delete(id).await?;
    Ok(Json(removed).into_response())
}

/// Reads at most `limit` bytes and decodes them as a JSON object.
async fn read_payload(body: Body, limit: usize) -> Result<Payload, ApiError> {
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(ApiError::validation("Body too large"));
        }
        Err(e) => {
            return Err(ApiError::validation(format!(
                "Failed to read request body: {e}"
            )));
        }
    };

    if bytes.is_empty() {
        return Err(ApiError::validation("Request body is required"));
    }

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::validation("Request body must be a JSON object")),
        Err(_) => Err(ApiError::validation("Invalid JSON")),
    }
}
