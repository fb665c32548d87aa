// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side session storage keyed by opaque session id.

use crate::error::AppError;
use crate::models::SessionData;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Backend for session state. Handlers never hold session data across
/// requests; they load, modify and store through this interface.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<SessionData>, AppError>;

    async fn store(&self, id: &str, data: &SessionData) -> Result<(), AppError>;

    async fn remove(&self, id: &str) -> Result<(), AppError>;
}

struct Entry {
    data: SessionData,
    expires_at: Instant,
}

/// Longest idle lifetime any entry gets, whatever the configuration says.
const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Sessions kept in a concurrent map with idle expiry.
///
/// Signed-in sessions live for `ttl`. Anonymous ones (a pending login nonce
/// at most) get the shorter `anonymous_ttl`, so unauthenticated traffic
/// cannot pin memory for the full session lifetime.
pub struct MemorySessionStore {
    entries: DashMap<String, Entry>,
    ttl: Duration,
    anonymous_ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration, anonymous_ttl: Duration) -> Self {
        let ttl = ttl.min(MAX_TTL);
        Self {
            entries: DashMap::new(),
            ttl,
            anonymous_ttl: anonymous_ttl.min(ttl),
        }
    }

    fn ttl_for(&self, data: &SessionData) -> Duration {
        if data.is_authenticated() {
            self.ttl
        } else {
            self.anonymous_ttl
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionData>, AppError> {
        let now = Instant::now();

        // Sliding expiry: a hit pushes the deadline out again.
        if let Some(mut entry) = self.entries.get_mut(id) {
            if entry.expires_at > now {
                let ttl = self.ttl_for(&entry.data);
                entry.expires_at = now + ttl;
                return Ok(Some(entry.data.clone()));
            }
        } else {
            return Ok(None);
        }

        self.entries.remove(id);
        Ok(None)
    }

    async fn store(&self, id: &str, data: &SessionData) -> Result<(), AppError> {
        self.entries.insert(
            id.to_string(),
            Entry {
                data: data.clone(),
                expires_at: Instant::now() + self.ttl_for(data),
            },
        );
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), AppError> {
        self.entries.remove(id);
        Ok(())
    }
}
