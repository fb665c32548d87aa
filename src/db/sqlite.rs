// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite user store.

use crate::db::{tables, UserStore};
use crate::error::AppError;
use crate::models::User;
use crate::time_utils::now_rfc3339;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Row};
use std::str::FromStr;

const MAX_CONNECTIONS: u32 = 5;

/// User store backed by a sqlx SQLite pool.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Connect and create the schema if needed.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Database(format!("Invalid DATABASE_URL: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open SQLite database: {}", e)))?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::info!(url = database_url, "Connected to SQLite user store");
        Ok(store)
    }

    /// Private in-memory database, for tests.
    ///
    /// A single connection that never idles out, since every connection to
    /// `:memory:` is a separate database.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Database(e.to_string()))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), AppError> {
        self.pool
            .execute(
                format!(
                    r#"
                    CREATE TABLE IF NOT EXISTS {users} (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        email TEXT NOT NULL UNIQUE,
                        name TEXT,
                        profile_picture TEXT,
                        created_at TEXT NOT NULL,
                        last_login_at TEXT NOT NULL
                    );
                    "#,
                    users = tables::USERS
                )
                .as_str(),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT id, email, name, profile_picture, created_at, last_login_at \
             FROM {} WHERE id = ?",
            tables::USERS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT id, email, name, profile_picture, created_at, last_login_at \
             FROM {} WHERE email = ?",
            tables::USERS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn upsert_by_email(
        &self,
        email: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> Result<User, AppError> {
        let now = now_rfc3339();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO {} (email, name, profile_picture, created_at, last_login_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                name = excluded.name,
                profile_picture = excluded.profile_picture,
                last_login_at = excluded.last_login_at
            RETURNING id, email, name, profile_picture, created_at, last_login_at
            "#,
            tables::USERS
        ))
        .bind(email)
        .bind(name)
        .bind(picture)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn count(&self) -> Result<u64, AppError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", tables::USERS))
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n as u64)
    }
}
