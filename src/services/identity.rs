// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Turns a provider profile into a local user record.

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{Profile, User};
use std::sync::Arc;

/// Message returned when the provider could not produce a profile.
pub const PROFILE_FETCH_FAILED: &str = "Failed to fetch user info from Google";
/// Message returned when the profile carries no email to key the user on.
pub const PROFILE_MISSING_EMAIL: &str = "Google profile did not include an email address";

/// Get-or-create of users keyed by email.
#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserStore>,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Resolve `profile` to a user: create it on first login, otherwise
    /// overwrite name and picture. At most one store write.
    pub async fn resolve(&self, profile: Profile) -> Result<User, AppError> {
        let email = profile
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::BadRequest(PROFILE_MISSING_EMAIL.to_string()))?;

        let existing = self.users.find_by_email(email).await?;

        let user = self
            .users
            .upsert_by_email(email, profile.name.as_deref(), profile.picture.as_deref())
            .await?;

        if existing.is_some() {
            tracing::info!(user_id = user.id, "Updated existing user on login");
        } else {
            tracing::info!(user_id = user.id, "Created user on first login");
        }

        Ok(user)
    }
}
