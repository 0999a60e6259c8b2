//! Record operations behind the HTTP handlers.
//!
//! Validation happens here before storage is touched, and every mutation runs
//! its read-modify-write under the optional write lock.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::db::{AnimeStore, StoreError};
use crate::models::anime::Anime;
use crate::services::validation::{self, Payload, ValidationError};

#[derive(Debug, Error)]
pub enum AnimeError {
    #[error("Anime not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

pub struct AnimeService {
    store: Arc<dyn AnimeStore>,
    write_lock: Option<Mutex<()>>,
}

impl AnimeService {
    #[must_use]
    pub fn new(store: Arc<dyn AnimeStore>, serialize_writes: bool) -> Self {
        Self {
            store,
            write_lock: serialize_writes.then(|| Mutex::new(())),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn AnimeStore> {
        &self.store
    }

    async fn lock_writes(&self) -> Option<MutexGuard<'_, ()>> {
        match &self.write_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }

    /// All records, optionally filtered by a case-insensitive title substring.
    /// A blank query returns everything.
    pub async fn list(&self, query: Option<&str>) -> Result<Vec<Anime>, AnimeError> {
        let records = self.store.load_all().await?;

        let needle = query.map(|q| q.trim().to_lowercase()).unwrap_or_default();
        if needle.is_empty() {
            return Ok(records);
        }

        Ok(records
            .into_iter()
            .filter(|anime| anime.title_matches(&needle))
            .collect())
    }

    pub async fn get(&self, id: &str) -> Result<Anime, AnimeError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AnimeError::NotFound(id.to_string()))
    }

    pub async fn create(&self, payload: &Payload) -> Result<Anime, AnimeError> {
        let fields = validation::validate_fields(payload)?;
        let anime = Anime::with_new_id(fields);

        let _guard = self.lock_writes().await;
        self.store.insert(&anime).await?;

        info!(id = %anime.id, title = %anime.title, "Created anime");
        Ok(anime)
    }

    /// Replaces every mutable field. Fields missing from the payload fall back
    /// to their defaults; the id always comes from the caller.
    ///
    /// An unknown id is reported before the payload is validated.
    pub async fn replace(&self, id: &str, payload: &Payload) -> Result<Anime, AnimeError> {
        let _guard = self.lock_writes().await;

        if self.store.get(id).await?.is_none() {
            return Err(AnimeError::NotFound(id.to_string()));
        }

        let fields = validation::validate_fields(payload)?;
        let anime = Anime::from_fields(id, fields);

        if !self.store.update(&anime).await? {
            return Err(AnimeError::NotFound(id.to_string()));
        }

        info!(id = %anime.id, title = %anime.title, "Replaced anime");
        Ok(anime)
    }

    pub async fn patch(&self, id: &str, payload: &Payload) -> Result<Anime, AnimeError> {
        let _guard = self.lock_writes().await;

        let existing = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AnimeError::NotFound(id.to_string()))?;

        let merged = validation::apply_patch(&existing, payload)?;

        if !self.store.update(&merged).await? {
            return Err(AnimeError::NotFound(id.to_string()));
        }

        info!(id = %merged.id, fields = ?payload.keys().collect::<Vec<_>>(), "Patched anime");
        Ok(merged)
    }

    pub async fn delete(&self, id: &str) -> Result<Anime, AnimeError> {
        let _guard = self.lock_writes().await;

        let removed = self
            .store
            .delete(id)
            .await?
            .ok_or_else(|| AnimeError::NotFound(id.to_string()))?;

        info!(id = %removed.id, title = %removed.title, "Deleted anime");
        Ok(removed)
    }
}
