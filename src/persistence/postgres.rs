//! PostgreSQL implementation of the feed repository.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::FeedRepository;
use crate::config::PusherConfig;
use crate::domain::Feed;
use crate::error::PusherError;

/// PostgreSQL-backed feed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresFeedRepository {
    pool: PgPool,
}

impl PostgresFeedRepository {
    /// Creates a repository over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects using the database settings in `config` and makes sure
    /// the `feeds` table exists.
    ///
    /// # Errors
    ///
    /// Returns a [`PusherError::PersistenceError`] if the database is
    /// unreachable or the schema cannot be created.
    pub async fn connect(config: &PusherConfig) -> Result<Self, PusherError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        let repo = Self::new(pool);
        repo.ensure_schema().await?;
        Ok(repo)
    }

    /// Creates the `feeds` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`PusherError::PersistenceError`] on database failure.
    pub async fn ensure_schema(&self) -> Result<(), PusherError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS feeds (\
                id VARCHAR(64) PRIMARY KEY, \
                title TEXT NOT NULL, \
                description TEXT NOT NULL, \
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()\
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl FeedRepository for PostgresFeedRepository {
    async fn insert_feed(&self, feed: &Feed) -> Result<(), PusherError> {
        sqlx::query(
            "INSERT INTO feeds (id, title, description, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&feed.id)
        .bind(&feed.title)
        .bind(&feed.description)
        .bind(feed.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_feed(&self, id: &str) -> Result<Option<Feed>, PusherError> {
        let row = sqlx::query_as::<_, (String, String, String, DateTime<Utc>)>(
            "SELECT id, title, description, created_at FROM feeds WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, title, description, created_at)| Feed {
            id,
            title,
            description,
            created_at,
        }))
    }

    async fn list_feeds(&self) -> Result<Vec<Feed>, PusherError> {
        let rows = sqlx::query_as::<_, (String, String, String, DateTime<Utc>)>(
            "SELECT id, title, description, created_at FROM feeds ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, description, created_at)| Feed {
                id,
                title,
                description,
                created_at,
            })
            .collect())
    }
}
