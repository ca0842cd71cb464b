// crates/venuesync-core/src/db.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool, Row};
use tracing::info;

use crate::config::TableNames;
use crate::error::Result;
use crate::store::{MetaId, PostId, VenueStore};

pub type DbPool = Pool<MySql>;

/// Opens the single connection the importer uses for the whole run.
pub async fn connect(database_url: &str) -> Result<DbPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;

    info!("Database connection established");
    Ok(pool)
}

/// CMS tables backed by MySQL.
#[derive(Clone)]
pub struct MySqlStore {
    pool: DbPool,
    tables: TableNames,
    post_type: Option<String>,
}

impl MySqlStore {
    pub fn new(pool: DbPool, tables: TableNames, post_type: Option<String>) -> Self {
        Self {
            pool,
            tables,
            post_type,
        }
    }

    pub async fn connect(
        database_url: &str,
        tables: TableNames,
        post_type: Option<String>,
    ) -> Result<Self> {
        let pool = connect(database_url).await?;
        Ok(Self::new(pool, tables, post_type))
    }
}

#[async_trait]
impl VenueStore for MySqlStore {
    async fn find_post_id(&self, title: &str) -> Result<Option<PostId>> {
        let row = match &self.post_type {
            Some(post_type) => {
                sqlx::query(&format!(
                    "SELECT ID FROM {} WHERE post_title = ? AND post_type = ? LIMIT 1",
                    self.tables.posts
                ))
                .bind(title)
                .bind(post_type)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT ID FROM {} WHERE post_title = ? LIMIT 1",
                    self.tables.posts
                ))
                .bind(title)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(match row {
            Some(row) => Some(row.try_get("ID")?),
            None => None,
        })
    }

    async fn find_meta(&self, post_id: PostId, key: &str) -> Result<Option<MetaId>> {
        let row = sqlx::query(&format!(
            "SELECT meta_id FROM {} WHERE post_id = ? AND meta_key = ? LIMIT 1",
            self.tables.postmeta
        ))
        .bind(post_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(row.try_get("meta_id")?),
            None => None,
        })
    }

    async fn update_meta(&self, meta_id: MetaId, value: &str) -> Result<()> {
        sqlx::query(&format!(
            "UPDATE {} SET meta_value = ? WHERE meta_id = ?",
            self.tables.postmeta
        ))
        .bind(value)
        .bind(meta_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_meta(&self, post_id: PostId, key: &str, value: &str) -> Result<MetaId> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (post_id, meta_key, meta_value) VALUES (?, ?, ?)",
            self.tables.postmeta
        ))
        .bind(post_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn fetch_post_content(&self, post_id: PostId) -> Result<Option<String>> {
        let row = sqlx::query(&format!(
            "SELECT post_content FROM {} WHERE ID = ?",
            self.tables.posts
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(row.try_get("post_content")?),
            None => None,
        })
    }

    async fn update_post_content(&self, post_id: PostId, content: &str) -> Result<()> {
        sqlx::query(&format!(
            "UPDATE {} SET post_content = ? WHERE ID = ?",
            self.tables.posts
        ))
        .bind(content)
        .bind(post_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Database connection closed");
    }
}
