// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Video endpoints with shell scripts standing in for `yt-dlp`.
#![cfg(unix)]

use axum::http::{header, StatusCode};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

mod common;

use common::{
    body_bytes, body_json, config_for_upstream, create_test_app_with_config, spawn_upstream,
};

/// Stub extractors, all written before any of them is executed so no test
/// can exec a script another thread still holds open for writing.
struct Stubs {
    _dir: tempfile::TempDir,
    ok: PathBuf,
    fail: PathBuf,
    silent: PathBuf,
    slow: PathBuf,
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn stubs() -> &'static Stubs {
    static STUBS: OnceLock<Stubs> = OnceLock::new();
    STUBS.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        // Invoked as: <stub> -o <output> -- <url>
        let ok = write_script(dir.path(), "ok", r#"printf 'video from %s' "$4" > "$2""#);
        let fail = write_script(
            dir.path(),
            "fail",
            r#"echo "ERROR: Unsupported URL: $4" >&2
exit 1"#,
        );
        let silent = write_script(dir.path(), "silent", "exit 0");
        let slow = write_script(dir.path(), "slow", "sleep 5");
        Stubs {
            _dir: dir,
            ok,
            fail,
            silent,
            slow,
        }
    })
}

fn app_with_extractor(program: &Path, addr: std::net::SocketAddr) -> common::TestApp {
    // Spawning anything before the stubs exist could leak their write fds.
    stubs();
    let mut config = config_for_upstream(addr);
    config.yt_dlp_path = program.to_path_buf();
    config.video_timeout = Duration::from_secs(2);
    create_test_app_with_config(config)
}

fn url_body(url: &str) -> String {
    serde_json::json!({ "url": url }).to_string()
}

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=abc";
const DRIVE_FILE_URL: &str = "https://drive.google.com/file/d/XYZ/view";

#[tokio::test]
async fn test_video_success() {
    let addr = spawn_upstream().await;
    let app = app_with_extractor(&stubs().ok, addr);

    let response = app.post_json("/video", &url_body(VIDEO_URL), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"video.mp4\""
    );
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(
        body_bytes(response).await,
        format!("video from {VIDEO_URL}").into_bytes()
    );
}

#[tokio::test]
async fn test_video_extractor_failure() {
    let addr = spawn_upstream().await;
    let app = app_with_extractor(&stubs().fail, addr);

    let response = app.post_json("/video", &url_body(VIDEO_URL), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("yt-dlp failed: "));
    assert!(error.contains("Unsupported URL"));
}

#[tokio::test]
async fn test_video_without_output_file() {
    let addr = spawn_upstream().await;
    let app = app_with_extractor(&stubs().silent, addr);

    let response = app.post_json("/video", &url_body(VIDEO_URL), None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_video_timeout() {
    let addr = spawn_upstream().await;
    let app = app_with_extractor(&stubs().slow, addr);

    let response = app.post_json("/video", &url_body(VIDEO_URL), None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_video_missing_program() {
    let addr = spawn_upstream().await;
    let app = app_with_extractor(Path::new("/nonexistent/yt-dlp"), addr);

    let response = app.post_json("/video", &url_body(VIDEO_URL), None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_start_prefers_video_for_drive_files() {
    let addr = spawn_upstream().await;
    let app = app_with_extractor(&stubs().ok, addr);

    let response = app.post_json("/start", &url_body(DRIVE_FILE_URL), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"video.mp4\""
    );
}

#[tokio::test]
async fn test_start_falls_back_to_file_fetch() {
    let addr = spawn_upstream().await;

    for stub in [&stubs().fail, &stubs().silent] {
        let app = app_with_extractor(stub, addr);

        let response = app.post_json("/start", &url_body(DRIVE_FILE_URL), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"XYZ.bin\""
        );
        assert_eq!(body_bytes(response).await, b"drive:XYZ");
    }
}

#[tokio::test]
async fn test_video_url_is_trimmed_before_extraction() {
    let addr = spawn_upstream().await;
    let app = app_with_extractor(&stubs().ok, addr);

    let response = app
        .post_json("/video", &url_body(&format!("  {VIDEO_URL}\n")), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(response).await,
        format!("video from {VIDEO_URL}").into_bytes()
    );
}
