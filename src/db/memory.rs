// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store for tests and throwaway deployments.

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::User;
use crate::time_utils::now_rfc3339;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<i64, User>,
}

/// User store that keeps everything in a map behind a lock.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a user; only tests need this since the service never deletes.
    pub async fn remove(&self, id: i64) -> Option<User> {
        self.inner.write().await.users.remove(&id)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn upsert_by_email(
        &self,
        email: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> Result<User, AppError> {
        let now = now_rfc3339();
        let mut inner = self.inner.write().await;

        if let Some(user) = inner.users.values_mut().find(|u| u.email == email) {
            user.name = name.map(str::to_string);
            user.profile_picture = picture.map(str::to_string);
            user.last_login_at = now;
            return Ok(user.clone());
        }

        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            email: email.to_string(),
            name: name.map(str::to_string),
            profile_picture: picture.map(str::to_string),
            created_at: now.clone(),
            last_login_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.inner.read().await.users.len() as u64)
    }
}
