//! Payload validation and normalization for anime records.
//!
//! Create and replace share [`validate_fields`]; partial updates go through
//! [`apply_patch`], which only looks at keys present in the payload.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::anime::{Anime, AnimeFields};

/// A decoded JSON request body.
pub type Payload = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is required (string)")]
    TitleRequired,

    #[error("title (if provided) must be a non-empty string")]
    TitleEmpty,

    #[error("genres must be an array")]
    GenresNotArray,

    #[error("genres must only contain strings")]
    GenreNotString,
}

/// Validates a full create/replace payload.
///
/// `title` must be a non-empty string after trimming. `year` falls back to
/// `None` when missing or not numeric. `genres` defaults to empty when missing
/// or null but is rejected when present with any other non-array value.
pub fn validate_fields(payload: &Payload) -> Result<AnimeFields, ValidationError> {
    let title = non_empty_title(payload.get("title")).ok_or(ValidationError::TitleRequired)?;

    let genres = match payload.get("genres") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => parse_genres(value)?,
    };

    Ok(AnimeFields {
        title,
        year: coerce_year(payload.get("year")),
        genres,
        author: coerce_text(payload.get("author")),
        studio: coerce_text(payload.get("studio")),
    })
}

/// Merges a partial payload onto `existing`, validating each present field on its own.
///
/// Fields absent from the payload keep their current values. The id is never touched.
pub fn apply_patch(existing: &Anime, payload: &Payload) -> Result<Anime, ValidationError> {
    let mut merged = existing.clone();

    if payload.contains_key("title") {
        merged.title = non_empty_title(payload.get("title")).ok_or(ValidationError::TitleEmpty)?;
    }

    if payload.contains_key("year") {
        merged.year = coerce_year(payload.get("year"));
    }

    if let Some(value) = payload.get("genres") {
        merged.genres = parse_genres(value)?;
    }

    if payload.contains_key("author") {
        merged.author = coerce_text(payload.get("author"));
    }

    if payload.contains_key("studio") {
        merged.studio = coerce_text(payload.get("studio"));
    }

    Ok(merged)
}

fn non_empty_title(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
}

fn parse_genres(value: &Value) -> Result<Vec<String>, ValidationError> {
    let Value::Array(items) = value else {
        return Err(ValidationError::GenresNotArray);
    };

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or(ValidationError::GenreNotString)
        })
        .collect()
}

/// Numeric coercion for `year`: numbers and numeric strings are accepted,
/// zero and anything non-integral become `None`.
fn coerce_year(value: Option<&Value>) -> Option<i64> {
    let year = match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral))?,
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))?
        }
        _ => return None,
    };

    (year != 0).then_some(year)
}

#[allow(clippy::cast_possible_truncation)]
fn integral(value: f64) -> Option<i64> {
    // i64 range check keeps the cast lossless
    (value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15).then(|| value as i64)
}

/// Trimmed text for `author`/`studio`. Empty, zero, false and null values
/// become `None`; numbers and `true` are stringified.
fn coerce_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}
