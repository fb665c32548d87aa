// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote file retrieval into per-request temporary storage.
//!
//! Handles:
//! - Single files over HTTP (share links rewritten to direct downloads)
//! - Videos through the external extractor
//! - Folder links (stub archive, listing is not implemented)
//! - Dispatch by URL shape

use crate::config::Config;
use crate::error::AppError;
use crate::services::links::LinkNormalizer;
use crate::services::ytdlp::VideoExtractor;
use anyhow::{anyhow, Context};
use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};

/// Name used when the upstream does not suggest one.
pub const DEFAULT_FILENAME: &str = "downloaded_file";
pub const VIDEO_FILENAME: &str = "video.mp4";
pub const FOLDER_ARCHIVE_NAME: &str = "folder.zip";
pub const FOLDER_README_NAME: &str = "README.txt";

const WRITE_CHUNK_SIZE: usize = 8192;
const TEMP_PREFIX: &str = "drive-fetch-";

/// How `/start` routes a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    Folder,
    Video,
    File,
}

/// Classify by substring, in order: folder, video, file.
pub fn classify(url: &str) -> UrlKind {
    if url.contains("folders") {
        UrlKind::Folder
    } else if url.contains("file/d/") {
        UrlKind::Video
    } else {
        UrlKind::File
    }
}

/// Keeps the temporary file or directory alive; deletes it on drop.
enum TempGuard {
    File(tempfile::TempPath),
    Dir(tempfile::TempDir),
}

/// A retrieved artifact waiting to be streamed back.
///
/// The backing temporary storage is removed once this value (or the guard
/// taken out of it) is dropped.
pub struct FetchedFile {
    pub filename: String,
    path: PathBuf,
    guard: TempGuard,
}

impl FetchedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Split into the download name, path, and a guard to hold for as long as
    /// the file is being read.
    pub fn into_parts(self) -> (String, PathBuf, impl Send + 'static) {
        (self.filename, self.path, self.guard)
    }
}

/// Download service shared by all download routes.
#[derive(Clone)]
pub struct FetchService {
    http: reqwest::Client,
    links: LinkNormalizer,
    extractor: VideoExtractor,
    temp_dir: Option<PathBuf>,
}

impl FetchService {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        // No overall timeout: large files legitimately take long.
        let http = reqwest::Client::builder()
            .connect_timeout(config.fetch_connect_timeout)
            .build()
            .context("failed building download HTTP client")?;

        Ok(Self {
            http,
            links: LinkNormalizer::new(config.direct_download_base.clone()),
            extractor: VideoExtractor::new(config.yt_dlp_path.clone(), config.video_timeout),
            temp_dir: config.temp_dir.clone(),
        })
    }

    /// Fetch a single file over HTTP.
    pub async fn fetch_file(&self, url: &str) -> Result<FetchedFile, AppError> {
        let url = self.links.normalize(url);
        tracing::info!(url = %url, "Fetching file");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(AppError::Upstream(format!(
                "Failed to fetch file (status {})",
                status.as_u16()
            )));
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

        let temp = self
            .temp_builder()
            .tempfile_in(self.temp_root())
            .context("failed creating temporary file")?;
        let (file, temp_path) = temp.into_parts();

        let mut writer = BufWriter::with_capacity(WRITE_CHUNK_SIZE, tokio::fs::File::from_std(file));
        let mut body = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("download interrupted")?;
            writer
                .write_all(&chunk)
                .await
                .context("failed writing temporary file")?;
            written += chunk.len() as u64;
        }
        writer.flush().await.context("failed writing temporary file")?;

        tracing::info!(filename = %filename, bytes = written, "File fetched");

        Ok(FetchedFile {
            filename,
            path: temp_path.to_path_buf(),
            guard: TempGuard::File(temp_path),
        })
    }

    /// Fetch a video through the extractor. The URL is passed through as is.
    pub async fn fetch_video(&self, url: &str) -> Result<FetchedFile, AppError> {
        let dir = self.temp_dir_for_request()?;
        let output = dir.path().join(VIDEO_FILENAME);

        self.extractor.extract(url, &output).await?;

        Ok(FetchedFile {
            filename: VIDEO_FILENAME.to_string(),
            path: output,
            guard: TempGuard::Dir(dir),
        })
    }

    /// Folder downloads need a listing API; for now this returns an archive
    /// holding a note with the requested URL.
    pub async fn fetch_folder(&self, url: &str) -> Result<FetchedFile, AppError> {
        let dir = self.temp_dir_for_request()?;
        let output = dir.path().join(FOLDER_ARCHIVE_NAME);

        let archive_path = output.clone();
        let folder_url = url.to_string();
        tokio::task::spawn_blocking(move || write_folder_stub(&archive_path, &folder_url))
            .await
            .map_err(|e| anyhow!("archive task failed: {}", e))??;

        tracing::info!(url, "Folder stub archive written");

        Ok(FetchedFile {
            filename: FOLDER_ARCHIVE_NAME.to_string(),
            path: output,
            guard: TempGuard::Dir(dir),
        })
    }

    /// Pick a fetch strategy from the URL shape. Video attempts fall back to
    /// a plain file fetch on any failure.
    pub async fn dispatch(&self, url: &str) -> Result<FetchedFile, AppError> {
        let kind = classify(url);
        tracing::debug!(url, ?kind, "Dispatching download");

        match kind {
            UrlKind::Folder => self.fetch_folder(url).await,
            UrlKind::Video => match self.fetch_video(url).await {
                Ok(fetched) => Ok(fetched),
                Err(e) => {
                    tracing::warn!(error = %e, "Video fetch failed, falling back to file fetch");
                    self.fetch_file(url).await
                }
            },
            UrlKind::File => self.fetch_file(url).await,
        }
    }

    fn temp_builder(&self) -> tempfile::Builder<'static, 'static> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX);
        builder
    }

    fn temp_root(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    fn temp_dir_for_request(&self) -> Result<tempfile::TempDir, AppError> {
        Ok(self
            .temp_builder()
            .tempdir_in(self.temp_root())
            .context("failed creating temporary directory")?)
    }
}

/// Write the placeholder archive for a folder URL.
fn write_folder_stub(path: &Path, folder_url: &str) -> Result<(), AppError> {
    let file = std::fs::File::create(path).context("failed creating archive")?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    zip.start_file(FOLDER_README_NAME, options)
        .context("failed adding archive entry")?;
    write!(
        zip,
        "Folder download not fully implemented.\nURL: {}",
        folder_url
    )
    .context("failed writing archive entry")?;
    zip.finish().context("failed finishing archive")?;
    Ok(())
}

/// Filename suggested by a `Content-Disposition` header.
///
/// Takes the value after the last `filename=`: a quoted string runs to its
/// closing quote, a bare token stops at the next `;`. Quotes and any
/// directory part are dropped.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let (_, raw) = value.rsplit_once("filename=")?;
    let raw = raw.trim_start();
    let raw = match raw.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next().unwrap_or(quoted),
        None => raw.split(';').next().unwrap_or(raw),
    };
    let unquoted: String = raw.chars().filter(|c| *c != '"').collect();
    let name = unquoted
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}
