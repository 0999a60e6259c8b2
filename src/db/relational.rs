use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::Set, ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait, Order,
    QueryOrder,
};
use tracing::info;

use super::{AnimeStore, StoreError};
use crate::entities::anime;
use crate::models::anime::Anime;

/// One row per record in the `anime` table, with `genres` stored as JSON text.
///
/// Connections come from the pool per statement and are returned right after.
#[derive(Clone)]
pub struct RelationalStore {
    pub conn: DatabaseConnection,
    url: String,
}

impl RelationalStore {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> anyhow::Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !is_in_memory(db_url) {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        super::migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self {
            conn,
            url: db_url.to_string(),
        })
    }

    fn to_active_model(record: &Anime) -> Result<anime::ActiveModel, StoreError> {
        Ok(anime::ActiveModel {
            id: Set(record.id.clone()),
            title: Set(record.title.clone()),
            year: Set(record.year),
            genres: Set(serde_json::to_string(&record.genres)?),
            author: Set(record.author.clone()),
            studio: Set(record.studio.clone()),
        })
    }

    fn from_model(model: anime::Model) -> Result<Anime, StoreError> {
        Ok(Anime {
            id: model.id,
            title: model.title,
            year: model.year,
            genres: serde_json::from_str(&model.genres)?,
            author: model.author,
            studio: model.studio,
        })
    }
}

fn is_in_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

#[async_trait]
impl AnimeStore for RelationalStore {
    fn describe(&self) -> String {
        format!("relational ({})", self.url)
    }

    async fn load_all(&self) -> Result<Vec<Anime>, StoreError> {
        let rows = anime::Entity::find()
            .order_by(Expr::cust("rowid"), Order::Asc)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::from_model).collect()
    }

    async fn get(&self, id: &str) -> Result<Option<Anime>, StoreError> {
        anime::Entity::find_by_id(id.to_string())
            .one(&self.conn)
            .await?
            .map(Self::from_model)
            .transpose()
    }

    async fn insert(&self, record: &Anime) -> Result<(), StoreError> {
        anime::Entity::insert(Self::to_active_model(record)?)
            .exec_without_returning(&self.conn)
            .await?;
        Ok(())
    }

    async fn update(&self, record: &Anime) -> Result<bool, StoreError> {
        match anime::Entity::update(Self::to_active_model(record)?)
            .exec(&self.conn)
            .await
        {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotUpdated) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &str) -> Result<Option<Anime>, StoreError> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let result = anime::Entity::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await?;

        Ok((result.rows_affected > 0).then_some(existing))
    }
}
