#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use jobquest_api::config::AppConfig;
use jobquest_api::database::{
    DeleteResult, DocumentStore, InsertOneResult, MemoryStore, StoreError, Update, UpdateResult,
};
use jobquest_api::filter::Filter;
use jobquest_api::types::{Collection, Document};
use jobquest_api::{app, AppState};

pub const TEST_SECRET: &str = "test-secret";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.access_token_secret = TEST_SECRET.to_string();
    config
}

pub fn test_state(config: AppConfig) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(config, store.clone()).expect("test state");
    (state, store)
}

/// Router over a fresh MemoryStore with auth enforced
pub fn test_app() -> (Router, Arc<MemoryStore>) {
    let (state, store) = test_state(test_config());
    (app(state), store)
}

/// Store whose backend is unreachable; every call fails
pub struct UnavailableStore;

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::ConnectionError("connection refused".to_string()))
}

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn find(&self, _: Collection, _: &Filter) -> Result<Vec<Document>, StoreError> {
        unavailable()
    }

    async fn find_one(&self, _: Collection, _: &Filter) -> Result<Option<Document>, StoreError> {
        unavailable()
    }

    async fn insert_one(&self, _: Collection, _: Document) -> Result<InsertOneResult, StoreError> {
        unavailable()
    }

    async fn update_one(&self, _: Collection, _: &Filter, _: Update, _: bool) -> Result<UpdateResult, StoreError> {
        unavailable()
    }

    async fn delete_one(&self, _: Collection, _: &Filter) -> Result<DeleteResult, StoreError> {
        unavailable()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        unavailable()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `name=value` pair of the session cookie set by this response
    pub fn session_cookie(&self) -> Option<String> {
        self.set_cookie().and_then(|raw| raw.split(';').next().map(str::to_string))
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers.get(header::SET_COOKIE).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");

    // Extractor rejections are plain text
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

    TestResponse { status, headers, body }
}

pub fn request(method: Method, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("valid request")
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> TestResponse {
    send(app, request(Method::GET, uri, None, cookie)).await
}

/// Signs in through POST /jwt and returns the cookie pair to send back
pub async fn login(app: &Router, email: &str) -> String {
    let res = send(
        app,
        request(Method::POST, "/jwt", Some(serde_json::json!({ "email": email })), None),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "login failed: {}", res.body);
    res.session_cookie().expect("session cookie")
}

/// Real listener on a free port for reqwest-level tests
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let (router, _) = test_app();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self { port, base_url };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}
