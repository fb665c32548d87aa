// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod download;
pub mod session;
pub mod user;

pub use download::DownloadRequest;
pub use session::SessionData;
pub use user::{Profile, User};
