// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Query,
    http::{header, HeaderMap, Request, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use drive_fetch::config::Config;
use drive_fetch::db::{MemorySessionStore, MemoryUserStore};
use drive_fetch::models::Profile;
use drive_fetch::routes::create_router;
use drive_fetch::services::{IdentityError, IdentityProvider};
use drive_fetch::AppState;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const FAKE_AUTHORIZE_URL: &str = "https://accounts.example.test/auth";
pub const SESSION_COOKIE: &str = "drive_fetch_session";

/// Size of the `/report` payload; spans several write chunks.
#[allow(dead_code)]
pub const REPORT_SIZE: usize = 20_000;

/// Identity provider answering from a table of authorization codes.
#[derive(Default)]
pub struct FakeIdentityProvider {
    profiles: Mutex<HashMap<String, Profile>>,
}

#[allow(dead_code)]
impl FakeIdentityProvider {
    pub fn register(&self, code: &str, profile: Profile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(code.to_string(), profile);
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String {
        format!(
            "{}?redirect_uri={}&state={}",
            FAKE_AUTHORIZE_URL,
            urlencoding::encode(redirect_uri),
            state
        )
    }

    async fn exchange_code_for_profile(
        &self,
        code: &str,
        _redirect_uri: &str,
    ) -> Result<Profile, IdentityError> {
        self.profiles
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected {
                status: 400,
                body: "invalid_grant".to_string(),
            })
    }
}

/// Router plus direct handles on the in-memory backends.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub users: Arc<MemoryUserStore>,
    pub sessions: Arc<MemorySessionStore>,
    pub provider: Arc<FakeIdentityProvider>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Start a login and return `(cookie, state)` from the redirect.
    pub async fn begin_login(&self) -> (String, String) {
        let response = self.get("/login", None).await;
        assert_eq!(response.status(), StatusCode::FOUND);

        let cookie = session_cookie(&response).expect("login should set a session cookie");
        let state = location(&response)
            .split_once("state=")
            .map(|(_, s)| s.to_string())
            .expect("authorize URL should carry state");
        (cookie, state)
    }

    /// Run the whole consent flow for `code`; returns the session cookie.
    pub async fn login(&self, code: &str) -> String {
        let (cookie, state) = self.begin_login().await;

        let callback = self
            .get(
                &format!("/login/google/authorized?code={code}&state={state}"),
                Some(&cookie),
            )
            .await;
        assert_eq!(callback.status(), StatusCode::FOUND);
        assert_eq!(location(&callback), "/");
        session_cookie(&callback).expect("callback should set a session cookie")
    }
}

#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let users = Arc::new(MemoryUserStore::new());
    let sessions = Arc::new(MemorySessionStore::new(
        config.session_ttl,
        config.login_state_ttl,
    ));
    let provider = Arc::new(FakeIdentityProvider::default());

    let state = Arc::new(
        AppState::new(config, users.clone(), sessions.clone(), provider.clone())
            .expect("state should build"),
    );

    TestApp {
        router: create_router(state.clone()),
        state,
        users,
        sessions,
        provider,
    }
}

#[allow(dead_code)]
pub fn profile(email: &str, name: &str) -> Profile {
    Profile {
        email: Some(email.to_string()),
        name: Some(name.to_string()),
        picture: Some(format!("https://img.example.com/{name}.png")),
    }
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Raw `Set-Cookie` header for the session cookie, if any.
#[allow(dead_code)]
pub fn session_set_cookie(response: &Response) -> Option<String> {
    set_cookie_headers(response)
        .into_iter()
        .find(|v| v.starts_with(&format!("{SESSION_COOKIE}=")))
}

/// `name=value` pair for the session cookie, ready for a `Cookie` header.
#[allow(dead_code)]
pub fn session_cookie(response: &Response) -> Option<String> {
    session_set_cookie(response).map(|v| v.split(';').next().unwrap().to_string())
}

#[allow(dead_code)]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}

#[allow(dead_code)]
pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[derive(Deserialize)]
struct DriveQuery {
    id: String,
}

/// Local stand-in for a file host.
///
/// - `/report`: PDF bytes with a quoted `filename=`
/// - `/semicolon`: quoted `filename=` containing a `;`
/// - `/plain`: bytes with no `Content-Disposition`
/// - `/missing`: 404
/// - `/uc?export=download&id=<id>`: `drive:<id>` named `<id>.bin`
#[allow(dead_code)]
pub async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route(
            "/report",
            get(|| async {
                let mut headers = HeaderMap::new();
                headers.insert(
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"report.pdf\"".parse().unwrap(),
                );
                (headers, vec![b'x'; REPORT_SIZE])
            }),
        )
        .route(
            "/semicolon",
            get(|| async {
                let mut headers = HeaderMap::new();
                headers.insert(
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"a;b.pdf\"; size=9".parse().unwrap(),
                );
                (headers, "pdf bytes")
            }),
        )
        .route("/plain", get(|| async { "plain bytes" }))
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "not here") }),
        )
        .route(
            "/uc",
            get(|Query(q): Query<DriveQuery>| async move {
                let mut headers = HeaderMap::new();
                headers.insert(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.bin\"", q.id)
                        .parse()
                        .unwrap(),
                );
                (headers, format!("drive:{}", q.id))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Test config whose direct-download base points at the local upstream.
#[allow(dead_code)]
pub fn config_for_upstream(addr: SocketAddr) -> Config {
    Config {
        direct_download_base: format!("http://{addr}/uc?export=download"),
        ..Config::test_default()
    }
}
