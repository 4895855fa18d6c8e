use std::{path::Path, str::FromStr};

use async_trait::async_trait;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{ObjectStore, Record, StoreError};

/// SQLite-backed store. One row per key.
#[derive(Clone)]
pub struct SqliteStore {
    pub pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file at `path`
    pub async fn connect(path: &Path) -> Result<Self, StoreError> {
        let database_url = format!("sqlite://{}", path.to_string_lossy());
        let options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("object store opened at {}", path.display());
        Ok(Self { pool })
    }

    /// A private in-memory database, mostly for tests
    pub async fn in_memory() -> Result<Self, StoreError> {
        // every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ObjectStore for SqliteStore {
    async fn read(&self, key: &str) -> Result<Option<Record>, StoreError> {
        let row = sqlx::query("SELECT key, value, version FROM objects WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Record {
            key: r.get("key"),
            value: r.get("value"),
            version: r.get("version"),
        }))
    }

    async fn write(
        &self,
        key: &str,
        value: &str,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i64> = sqlx::query_scalar("SELECT version FROM objects WHERE key = $1")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;

        let found = current.unwrap_or(0);
        if found != expected_version {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected: expected_version,
                found,
            });
        }

        let next = found + 1;
        sqlx::query(
            r#"
            INSERT INTO objects (key, value, version)
            VALUES ($1, $2, $3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, version = excluded.version
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(next)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(next)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM objects WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT key FROM objects WHERE substr(key, 1, length($1)) = $1 ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }
}
