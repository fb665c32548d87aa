//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Local user record, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Store-assigned id
    pub id: i64,
    /// Email address (unique lookup key)
    pub email: String,
    /// Display name from the provider
    pub name: Option<String>,
    /// Profile picture URL
    pub profile_picture: Option<String>,
    /// When the user first logged in
    pub created_at: String,
    /// Most recent successful login
    pub last_login_at: String,
}

/// Identity returned by the OAuth provider's userinfo endpoint.
///
/// Every field is optional on the wire; the resolver decides what a missing
/// email means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Public view of a user in `/user` responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub profile_picture: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            profile_picture: user.profile_picture,
        }
    }
}
