use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool};

use crate::core::ToDo;
use crate::storage::ToDoStore;

#[cfg(feature = "tracing")]
use tracing::{info, instrument};

/// SQLite-backed store. Expiry dates are kept as RFC 3339 UTC text, so the
/// range filter can compare them as strings.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating when missing) the database at `url` and brings the
    /// schema up to date.
    #[cfg_attr(feature = "tracing", instrument)]
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = if is_in_memory(url) {
            // Every connection to `:memory:` sees its own database.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            if !Sqlite::database_exists(url).await.unwrap_or(false) {
                #[cfg(feature = "tracing")]
                info!(url, "Creating database");
                Sqlite::create_database(url)
                    .await
                    .with_context(|| format!("failed to create database {url}"))?;
            }
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = options
            .connect(url)
            .await
            .with_context(|| format!("failed to connect to {url}"))?;
        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT,
                description TEXT,
                expiry_date TEXT NOT NULL,
                completion_percentage INTEGER NOT NULL DEFAULT 0
                    CHECK (completion_percentage BETWEEN 0 AND 100)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_todos_expiry_date ON todos (expiry_date)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ToDoStore for SqliteStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<ToDo>> {
        let todo = sqlx::query_as::<_, ToDo>(
            "SELECT id, title, description, expiry_date, completion_percentage
             FROM todos WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn find_all(&self) -> Result<Vec<ToDo>> {
        let todos = sqlx::query_as::<_, ToDo>(
            "SELECT id, title, description, expiry_date, completion_percentage
             FROM todos ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn find_by_expiry_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ToDo>> {
        let todos = sqlx::query_as::<_, ToDo>(
            "SELECT id, title, description, expiry_date, completion_percentage
             FROM todos
             WHERE expiry_date >= ? AND expiry_date <= ?
             ORDER BY id",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn insert(&self, todo: &ToDo) -> Result<ToDo> {
        let result = sqlx::query(
            "INSERT INTO todos (title, description, expiry_date, completion_percentage)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.expiry_date)
        .bind(todo.completion_percentage)
        .execute(&self.pool)
        .await?;

        let id = i32::try_from(result.last_insert_rowid()).context("row id out of range")?;
        Ok(ToDo { id, ..todo.clone() })
    }

    async fn update(&self, todo: &ToDo) -> Result<()> {
        sqlx::query(
            "UPDATE todos
             SET title = ?, description = ?, expiry_date = ?, completion_percentage = ?
             WHERE id = ?",
        )
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.expiry_date)
        .bind(todo.completion_percentage)
        .bind(todo.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
