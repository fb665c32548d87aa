// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth login and session inspection routes.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::session::{random_token, Session};
use crate::models::user::UserResponse;
use crate::models::SessionData;
use crate::services::identity::PROFILE_FETCH_FAILED;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login))
        .route("/login/google/authorized", get(login_callback))
        .route("/logout", get(logout))
        .route("/user", get(get_current_user))
        .route("/check", get(check_auth))
}

/// 302 to `location`.
fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Start the consent flow: remember a state nonce in the session and send
/// the caller to Google.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut session: Session,
) -> Result<(CookieJar, Response)> {
    let nonce = random_token()?;
    session.data.oauth_state = Some(nonce.clone());
    let jar = session.save(&state, jar).await?;

    let auth_url = state
        .identity_provider
        .authorize_url(&nonce, &state.config.oauth_redirect_uri());

    tracing::info!("Starting OAuth flow, redirecting to Google");
    Ok((jar, redirect_found(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for profile, resolve user, create session.
async fn login_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Response)> {
    // The nonce is single use, whatever happens next.
    let expected_state = session.data.oauth_state.take();
    if expected_state.is_some() {
        session.persist(&state).await?;
    }

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return Err(AppError::BadRequest(format!(
            "Google sign-in was not completed: {}",
            error
        )));
    }

    let (Some(code), Some(returned_state)) = (params.code, params.state) else {
        return Err(AppError::BadRequest(
            "Missing authorization code or state".to_string(),
        ));
    };

    let Some(expected_state) = expected_state else {
        tracing::warn!("OAuth callback without a login in progress");
        return Err(AppError::BadRequest(
            "No login in progress for this session".to_string(),
        ));
    };

    if !bool::from(returned_state.as_bytes().ct_eq(expected_state.as_bytes())) {
        tracing::error!("OAuth state mismatch! Potential tampering.");
        return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
    }

    let profile = state
        .identity_provider
        .exchange_code_for_profile(&code, &state.config.oauth_redirect_uri())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Failed to fetch Google profile");
            AppError::Upstream(PROFILE_FETCH_FAILED.to_string())
        })?;

    let user = state.identity.resolve(profile).await?;

    session.data = SessionData::for_user(&user);
    let jar = session.rotate(&state, jar).await?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok((jar, redirect_found("/")))
}

/// Logout - drop all session state and go home.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    session: Session,
) -> (CookieJar, Response) {
    let jar = session.clear(&state, jar).await;
    (jar, redirect_found("/"))
}

#[derive(Serialize)]
pub struct CurrentUserResponse {
    pub authenticated: bool,
    pub user: UserResponse,
}

/// Current user, validated against the store.
async fn get_current_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    session: Session,
) -> Result<Response> {
    let Some(user_id) = session.data.user_id else {
        return Err(AppError::Unauthorized);
    };

    match state.users.find_by_id(user_id).await? {
        Some(user) => Ok(Json(CurrentUserResponse {
            authenticated: true,
            user: user.into(),
        })
        .into_response()),
        None => {
            tracing::warn!(user_id, "Session references a missing user, clearing it");
            let jar = session.clear(&state, jar).await;
            Ok((jar, AppError::Unauthorized).into_response())
        }
    }
}

#[derive(Serialize)]
pub struct CheckAuthResponse {
    pub authenticated: bool,
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
}

/// Session contents as-is; does not check that the user still exists.
async fn check_auth(session: Session) -> Json<CheckAuthResponse> {
    let authenticated = session.data.is_authenticated();
    let SessionData {
        user_id,
        user_email,
        user_name,
        ..
    } = session.data;

    Json(CheckAuthResponse {
        authenticated,
        user_id,
        user_email,
        user_name,
    })
}
