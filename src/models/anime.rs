use serde::{Deserialize, Serialize};

/// A single anime record as stored and returned by the API.
///
/// Optional fields serialize as `null` rather than being omitted, so every
/// response carries the full record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anime {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub studio: Option<String>,
}

/// Normalized mutable fields of a record, produced by create/replace validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnimeFields {
    pub title: String,
    pub year: Option<i64>,
    pub genres: Vec<String>,
    pub author: Option<String>,
    pub studio: Option<String>,
}

impl Anime {
    #[must_use]
    pub fn from_fields(id: impl Into<String>, fields: AnimeFields) -> Self {
        Self {
            id: id.into(),
            title: fields.title,
            year: fields.year,
            genres: fields.genres,
            author: fields.author,
            studio: fields.studio,
        }
    }

    #[must_use]
    pub fn with_new_id(fields: AnimeFields) -> Self {
        Self::from_fields(uuid::Uuid::new_v4().to_string(), fields)
    }

    /// Case-insensitive substring match on the title. `needle` must already be lowercase.
    #[must_use]
    pub fn title_matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_missing_fields_as_null() {
        let anime = Anime::from_fields(
            "abc",
            AnimeFields {
                title: "Naruto".to_string(),
                ..Default::default()
            },
        );

        let json = serde_json::to_value(&anime).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "abc",
                "title": "Naruto",
                "year": null,
                "genres": [],
                "author": null,
                "studio": null
            })
        );
    }

    #[test]
    fn test_title_matches_ignores_case() {
        let anime = Anime::from_fields(
            "1",
            AnimeFields {
                title: "Fullmetal Alchemist".to_string(),
                ..Default::default()
            },
        );

        assert!(anime.title_matches("metal"));
        assert!(anime.title_matches("fullmetal alchemist"));
        assert!(!anime.title_matches("naruto"));
    }

    #[test]
    fn test_with_new_id_generates_unique_ids() {
        let a = Anime::with_new_id(AnimeFields::default());
        let b = Anime::with_new_id(AnimeFields::default());
        assert_ne!(a.id, b.id);
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
    }
}
