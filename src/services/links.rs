// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Share-link rewriting.
//!
//! Google Drive hands out "view" links that return an HTML page; the same file
//! id plugged into the `uc?export=download` endpoint returns the bytes.

/// Direct-download endpoint, without the `id` parameter.
pub const DEFAULT_DIRECT_DOWNLOAD_BASE: &str = "https://drive.google.com/uc?export=download";

const FILE_VIEW_MARKER: &str = "/file/d/";
const OPEN_MARKER: &str = "/open?id=";

/// Rewrites known share URL shapes into direct-download URLs.
#[derive(Debug, Clone)]
pub struct LinkNormalizer {
    download_base: String,
}

impl Default for LinkNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECT_DOWNLOAD_BASE)
    }
}

impl LinkNormalizer {
    pub fn new(download_base: impl Into<String>) -> Self {
        Self {
            download_base: download_base.into(),
        }
    }

    /// Rewrite `url` if it matches a share shape; otherwise return it as is.
    ///
    /// Extracted ids are not validated.
    pub fn normalize(&self, url: &str) -> String {
        match extract_file_id(url) {
            Some(id) => format!("{}&id={}", self.download_base, id),
            None => url.to_string(),
        }
    }
}

/// [`LinkNormalizer::normalize`] with the default Drive endpoint.
pub fn normalize_share_link(url: &str) -> String {
    LinkNormalizer::default().normalize(url)
}

/// File id from `/file/d/<id>/...` or `/open?id=<id>`, first match wins.
fn extract_file_id(url: &str) -> Option<&str> {
    if let Some((_, rest)) = url.split_once(FILE_VIEW_MARKER) {
        let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        return Some(&rest[..end]);
    }

    if url.contains(OPEN_MARKER) {
        return url.split_once("id=").map(|(_, id)| id);
    }

    None
}
