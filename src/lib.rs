// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! drive-fetch: Google sign-in and remote file retrieval
//!
//! This crate provides an HTTP API that logs users in with Google OAuth and
//! fetches shared files, videos and folder links on their behalf, streaming
//! the result back as a download.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{SessionStore, UserStore};
use services::{FetchService, IdentityProvider, IdentityResolver};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub identity: IdentityResolver,
    pub fetcher: FetchService,
}

impl AppState {
    /// Wire the services together around the given backends.
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> anyhow::Result<Self> {
        let fetcher = FetchService::new(&config)?;
        let identity = IdentityResolver::new(users.clone());

        Ok(Self {
            config,
            users,
            sessions,
            identity_provider,
            identity,
            fetcher,
        })
    }
}
