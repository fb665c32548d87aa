// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Download request body.

use serde::Deserialize;

use crate::error::AppError;

/// `{url}` body accepted by every download endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    url: Option<serde_json::Value>,
}

impl DownloadRequest {
    /// Parse a raw request body, mapping every shape without a usable `url`
    /// to the same 400.
    pub fn url_from_body(body: &[u8]) -> Result<String, AppError> {
        let request: DownloadRequest =
            serde_json::from_slice(body).map_err(|_| AppError::no_url())?;

        match request.url {
            Some(serde_json::Value::String(url)) if !url.trim().is_empty() => {
                Ok(url.trim().to_string())
            }
            _ => Err(AppError::no_url()),
        }
    }
}
