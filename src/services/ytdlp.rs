// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wrapper around the external `yt-dlp` binary.

use crate::error::AppError;
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs the extractor for one URL into a caller-chosen output path.
#[derive(Debug, Clone)]
pub struct VideoExtractor {
    program: PathBuf,
    timeout: Duration,
}

impl VideoExtractor {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// `yt-dlp -o <output> -- <url>`.
    ///
    /// A non-zero exit is an upstream failure carrying the tool's stderr;
    /// failing to start, timing out or not producing `output` are internal.
    pub async fn extract(&self, url: &str, output: &Path) -> Result<(), AppError> {
        tracing::info!(url, program = %self.program.display(), "Running video extractor");

        let mut command = Command::new(&self.program);
        command
            .arg("-o")
            .arg(output)
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| anyhow!("yt-dlp timed out after {}s", self.timeout.as_secs()))?
            .with_context(|| format!("failed to run {}", self.program.display()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::warn!(
                status = ?result.status.code(),
                stderr = %stderr.trim(),
                "Video extractor failed"
            );
            return Err(AppError::Upstream(format!("yt-dlp failed: {}", stderr)));
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(anyhow!("yt-dlp finished without writing {}", output.display()).into());
        }

        Ok(())
    }
}
