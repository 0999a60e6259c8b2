use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{AnimeStore, StoreError};
use crate::models::anime::Anime;

/// Keeps the whole collection as one pretty-printed JSON array on disk.
///
/// Every mutation reads the full file and rewrites it. Nothing here guards
/// against concurrent writers or interrupted writes.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses the whole document. A missing file is created as an empty array.
    pub async fn read_all(&self) -> Result<Vec<Anime>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Creating empty anime document at {}", self.path.display());
                self.save_all(&[]).await?;
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Serializes `records` and overwrites the document.
    pub async fn save_all(&self, records: &[Anime]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let text = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.path, text).await?;
        debug!(count = records.len(), "Wrote anime document");
        Ok(())
    }
}

#[async_trait]
impl AnimeStore for DocumentStore {
    fn describe(&self) -> String {
        format!("document ({})", self.path.display())
    }

    async fn load_all(&self) -> Result<Vec<Anime>, StoreError> {
        self.read_all().await
    }

    async fn get(&self, id: &str) -> Result<Option<Anime>, StoreError> {
        let records = self.read_all().await?;
        Ok(records.into_iter().find(|a| a.id == id))
    }

    async fn insert(&self, anime: &Anime) -> Result<(), StoreError> {
        let mut records = self.read_all().await?;
        records.push(anime.clone());
        self.save_all(&records).await
    }

    async fn update(&self, anime: &Anime) -> Result<bool, StoreError> {
        let mut records = self.read_all().await?;
        let Some(slot) = records.iter_mut().find(|a| a.id == anime.id) else {
            return Ok(false);
        };
        *slot = anime.clone();
        self.save_all(&records).await?;
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<Option<Anime>, StoreError> {
        let mut records = self.read_all().await?;
        let Some(index) = records.iter().position(|a| a.id == id) else {
            return Ok(None);
        };
        let removed = records.remove(index);
        self.save_all(&records).await?;
        Ok(Some(removed))
    }
}
