// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login gate for routes that need a signed-in user.

use crate::error::AppError;
use crate::middleware::session::Session;
use axum::{extract::Request, middleware::Next, response::Response};

/// Reject anonymous callers with 401 `{authenticated:false}`.
pub async fn require_login(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(user_id) = session.data.user_id else {
        return Err(AppError::Unauthorized);
    };

    tracing::debug!(user_id, path = %request.uri().path(), "Authenticated request");
    Ok(next.run(request).await)
}
