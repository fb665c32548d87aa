//! Storage layer: users (SQLite or in-memory) and server-side sessions.

pub mod memory;
pub mod sessions;
pub mod sqlite;

pub use memory::MemoryUserStore;
pub use sessions::{MemorySessionStore, SessionStore};
pub use sqlite::SqliteUserStore;

use crate::error::AppError;
use crate::models::User;
use async_trait::async_trait;
use std::sync::Arc;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
}

/// Persistent user records, keyed by email.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Create the user for `email`, or overwrite name and picture of the
    /// existing one. Exactly one write; two concurrent calls for a new email
    /// end up with a single record.
    async fn upsert_by_email(
        &self,
        email: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> Result<User, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

/// Open the user store selected by `database_url`.
///
/// `memory` keeps users in process (lost on restart); anything else is handed
/// to sqlx as a SQLite connection string.
pub async fn connect_user_store(database_url: &str) -> Result<Arc<dyn UserStore>, AppError> {
    if database_url == "memory" {
        tracing::warn!("Using in-memory user store, users will not survive a restart");
        return Ok(Arc::new(MemoryUserStore::new()));
    }

    Ok(Arc::new(SqliteUserStore::connect(database_url).await?))
}
