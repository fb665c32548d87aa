// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No logged-in user in the session.
    #[error("Authentication required")]
    Unauthorized,

    /// Client input problem (missing url, bad OAuth callback).
    #[error("{0}")]
    BadRequest(String),

    /// An upstream host, the identity provider or the video extractor refused.
    #[error("{0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message used for every download endpoint when the body has no `url`.
    pub const NO_URL: &'static str = "No URL provided";

    pub fn no_url() -> Self {
        AppError::BadRequest(Self::NO_URL.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct UnauthenticatedResponse {
    authenticated: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized => {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(UnauthenticatedResponse {
                        authenticated: false,
                    }),
                )
                    .into_response();
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream failure");
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database error".to_string(),
                )
            }
            AppError::Internal(err) => {
                // Only the outermost context goes back to the caller.
                tracing::error!(error = ?err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
