//! Record persistence.
//!
//! [`AnimeStore`] is the single storage seam; the HTTP layer and the service
//! never know which backend they are talking to.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::models::anime::Anime;

pub mod document;
pub mod migrator;
pub mod relational;

pub use document::DocumentStore;
pub use relational::RelationalStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed stored JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Backend-agnostic access to the anime collection.
///
/// Implementations perform no locking of their own; callers that need a
/// consistent read-modify-write must serialize around these calls.
#[async_trait]
pub trait AnimeStore: Send + Sync {
    /// Human-readable location of the backing storage, for logs.
    fn describe(&self) -> String;

    /// Every record, in storage order.
    async fn load_all(&self) -> Result<Vec<Anime>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Anime>, StoreError>;

    async fn insert(&self, anime: &Anime) -> Result<(), StoreError>;

    /// Overwrites the record with the same id. Returns `false` if it no longer exists.
    async fn update(&self, anime: &Anime) -> Result<bool, StoreError>;

    /// Removes a record, returning it if it existed.
    async fn delete(&self, id: &str) -> Result<Option<Anime>, StoreError>;
}

/// Opens the backend selected in config.
pub async fn open_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn AnimeStore>> {
    let store: Arc<dyn AnimeStore> = match config.backend {
        StorageBackend::Document => {
            let store = DocumentStore::new(PathBuf::from(&config.document_path));
            store.read_all().await?;
            Arc::new(store)
        }
        StorageBackend::Relational => Arc::new(
            RelationalStore::with_pool_options(
                &config.database_url,
                config.max_connections,
                config.min_connections,
            )
            .await?,
        ),
    };

    info!("Using {} record store", store.describe());
    Ok(store)
}
