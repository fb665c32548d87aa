// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod fetcher;
pub mod google_oauth;
pub mod identity;
pub mod links;
pub mod ytdlp;

pub use fetcher::{FetchService, FetchedFile, UrlKind};
pub use google_oauth::{GoogleOAuthClient, IdentityError, IdentityProvider};
pub use identity::IdentityResolver;
pub use links::{normalize_share_link, LinkNormalizer};
pub use ytdlp::VideoExtractor;
