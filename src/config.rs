//! Application configuration loaded from environment variables.
//!
//! OAuth credentials and the session signing secret are mandatory: the server
//! refuses to start without them instead of falling back to placeholders.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::links::DEFAULT_DIRECT_DOWNLOAD_BASE;

/// Minimum length of the session signing secret, in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Upper bound for `SESSION_TTL_HOURS` (ten years).
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Externally visible base URL of this service (OAuth redirect target)
    pub public_url: String,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// sqlx connection string, or `memory` for the in-process store
    pub database_url: String,
    /// Program invoked for video extraction
    pub yt_dlp_path: PathBuf,
    /// Base of rewritten direct-download links
    pub direct_download_base: String,
    /// Where per-request temporary files are created (OS default if unset)
    pub temp_dir: Option<PathBuf>,
    /// Wall-clock limit for one extractor run
    pub video_timeout: Duration,
    /// Connect timeout for outbound fetches
    pub fetch_connect_timeout: Duration,
    /// Idle lifetime of a signed-in session
    pub session_ttl: Duration,
    /// Lifetime of an anonymous session holding only a pending login
    pub login_state_ttl: Duration,
    /// Put the download routes behind a logged-in session
    pub require_login_for_downloads: bool,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// HMAC key for session cookies (raw bytes)
    pub session_secret: Vec<u8>,
}

impl Config {
    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test_client_id".to_string(),
            public_url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            database_url: "memory".to_string(),
            yt_dlp_path: PathBuf::from("yt-dlp"),
            direct_download_base: DEFAULT_DIRECT_DOWNLOAD_BASE.to_string(),
            temp_dir: None,
            video_timeout: Duration::from_secs(30),
            fetch_connect_timeout: Duration::from_secs(5),
            session_ttl: Duration::from_secs(60 * 60),
            login_state_ttl: Duration::from_secs(10 * 60),
            require_login_for_downloads: false,
            google_client_secret: "test_secret".to_string(),
            session_secret: b"test_session_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let session_secret = required("SESSION_SECRET")?.into_bytes();
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Invalid {
                name: "SESSION_SECRET",
                reason: format!("must be at least {MIN_SESSION_SECRET_LEN} bytes"),
            });
        }

        Ok(Self {
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            public_url: env::var("PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parsed("PORT", 8080)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://drive_fetch.db?mode=rwc".to_string()),
            yt_dlp_path: env::var("YT_DLP_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("yt-dlp")),
            direct_download_base: env::var("DIRECT_DOWNLOAD_BASE")
                .unwrap_or_else(|_| DEFAULT_DIRECT_DOWNLOAD_BASE.to_string()),
            temp_dir: env::var("TEMP_DIR").ok().map(PathBuf::from),
            video_timeout: Duration::from_secs(parsed("VIDEO_TIMEOUT_SECS", 600)?),
            fetch_connect_timeout: Duration::from_secs(parsed("FETCH_CONNECT_TIMEOUT_SECS", 10)?),
            session_ttl: session_ttl()?,
            login_state_ttl: Duration::from_secs(parsed("LOGIN_STATE_TTL_SECS", 600)?),
            require_login_for_downloads: parsed("REQUIRE_LOGIN_FOR_DOWNLOADS", false)?,

            google_client_secret: required("GOOGLE_CLIENT_SECRET")?,
            session_secret,
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn is_https(&self) -> bool {
        self.public_url.starts_with("https://")
    }

    /// Callback URL registered with the OAuth provider.
    pub fn oauth_redirect_uri(&self) -> String {
        format!("{}/login/google/authorized", self.public_url)
    }
}

fn session_ttl() -> Result<Duration, ConfigError> {
    let hours: u64 = parsed("SESSION_TTL_HOURS", 168)?;
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        return Err(ConfigError::Invalid {
            name: "SESSION_TTL_HOURS",
            reason: format!("must be between 1 and {MAX_SESSION_TTL_HOURS}"),
        });
    }
    Ok(Duration::from_secs(hours * 60 * 60))
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(value.to_string())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("could not parse {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
