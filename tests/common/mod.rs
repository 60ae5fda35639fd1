#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use news_cms_api::{
    build_router,
    config::AppConfig,
    db,
    installers::{self, Registry},
    services::{InMemoryLogSearch, LogSearch},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_SECRET: &str = "news_cms_test_secret_key_with_enough_entropy_42";

/// Router plus state over a fresh in-memory SQLite database with the schema
/// migrated and the default roles seeded.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_log_search(None).await
    }

    /// Same as [`TestApp::new`] but serving the given log documents.
    pub async fn with_log_search(log_search: Option<Arc<dyn LogSearch>>) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        // a second connection would open a different in-memory database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        let mut registry = Registry::new(Arc::new(pool), &cfg);
        installers::run_all(&mut registry, &cfg)
            .await
            .expect("startup installers failed");
        if let Some(search) = log_search {
            registry.log_search = search;
        }

        let state = registry.into_state(cfg);
        let token = state
            .tokens
            .generate(
                Uuid::new_v4(),
                "admin@example.com",
                &["Admin".to_string()],
                &[],
            )
            .expect("failed to sign test token");
        let router = build_router(state.clone());

        Self {
            router,
            state,
            token,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router failed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body was not JSON")
        };
        (status, json)
    }

    /// Authenticated request with the admin token.
    pub async fn authed(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(method, uri, body, Some(&self.token)).await
    }
}

pub fn in_memory_logs(logs: Vec<news_cms_api::services::log::LogModel>) -> Arc<dyn LogSearch> {
    Arc::new(InMemoryLogSearch::new(logs))
}

/// Percent-encodes a filter object for the `?filter=` query parameter.
pub fn filter_query(filter: &Value) -> String {
    let raw = filter.to_string();
    let mut encoded = String::with_capacity(raw.len() * 3);
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
