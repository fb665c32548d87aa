// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side session payload.

use serde::{Deserialize, Serialize};

use super::User;

/// State kept server-side for one session cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    /// Nonce of an in-flight consent flow, checked on the provider callback.
    pub oauth_state: Option<String>,
}

impl SessionData {
    /// Session for a freshly resolved user.
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: Some(user.id),
            user_email: Some(user.email.clone()),
            user_name: user.name.clone(),
            oauth_state: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}
