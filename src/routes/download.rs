// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Download routes: fetch remotely, stream back as an attachment.

use crate::error::Result;
use crate::models::DownloadRequest;
use crate::services::fetcher::FetchedFile;
use crate::AppState;
use anyhow::Context;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

const READ_CHUNK_SIZE: usize = 8192;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/file", post(download_file))
        .route("/video", post(download_video))
        .route("/folder", post(download_folder))
        .route("/start", post(download_start))
}

async fn download_file(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response> {
    let url = DownloadRequest::url_from_body(&body)?;
    let fetched = state.fetcher.fetch_file(&url).await?;
    attachment_response(fetched).await
}

async fn download_video(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response> {
    let url = DownloadRequest::url_from_body(&body)?;
    let fetched = state.fetcher.fetch_video(&url).await?;
    attachment_response(fetched).await
}

async fn download_folder(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response> {
    let url = DownloadRequest::url_from_body(&body)?;
    let fetched = state.fetcher.fetch_folder(&url).await?;
    attachment_response(fetched).await
}

/// Auto-detect folder, video or plain file from the URL.
async fn download_start(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response> {
    let url = DownloadRequest::url_from_body(&body)?;
    let fetched = state.fetcher.dispatch(&url).await?;
    attachment_response(fetched).await
}

/// Stream a fetched file back as an attachment. Its temporary storage is
/// released when the body is dropped.
pub async fn attachment_response(fetched: FetchedFile) -> Result<Response> {
    let (filename, path, guard) = fetched.into_parts();

    let file = tokio::fs::File::open(&path)
        .await
        .with_context(|| format!("failed opening {}", path.display()))?;
    let length = file.metadata().await.ok().map(|m| m.len());

    let stream = ReaderStream::with_capacity(file, READ_CHUNK_SIZE).map(move |chunk| {
        let _guard = &guard;
        chunk
    });

    let mut response = Body::from_stream(stream).into_response();
    let headers = response.headers_mut();

    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }

    let disposition = HeaderValue::from_str(&content_disposition(&filename))
        .context("invalid Content-Disposition")?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}

/// `attachment` disposition; non-ASCII names get an RFC 5987 `filename*`
/// next to an ASCII fallback.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    if fallback == filename {
        format!("attachment; filename=\"{}\"", filename)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(filename)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition("my report.pdf"),
            "attachment; filename=\"my report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        assert_eq!(
            content_disposition("café.txt"),
            "attachment; filename=\"caf_.txt\"; filename*=UTF-8''caf%C3%A9.txt"
        );
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        assert_eq!(
            content_disposition("a\"b.txt"),
            "attachment; filename=\"a_b.txt\"; filename*=UTF-8''a%22b.txt"
        );
    }
}
