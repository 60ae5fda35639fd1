//! News CMS API Library
//!
//! Content management backend: news articles and their category tree,
//! navigation menus, and the accounts and roles that see them.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod installers;
#[allow(elided_lifetimes_in_paths)]
pub mod migrator;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::{http::HeaderValue, middleware, response::Json, Router};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::TokenService;
use crate::envelope::Envelope;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub tokens: Arc<TokenService>,
    pub services: handlers::AppServices,
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<Envelope<T>>, errors::ServiceError>;

/// Every `/api/v1` route. Category and log routes require a bearer token.
pub fn api_v1_routes(tokens: Arc<TokenService>) -> Router<AppState> {
    let protected = handlers::categories::category_routes()
        .merge(handlers::logs::log_routes())
        .route_layer(middleware::from_fn_with_state(tokens, auth::auth_middleware));

    Router::new()
        .merge(handlers::menus::menu_routes())
        .merge(handlers::news::news_routes())
        .merge(handlers::roles::role_routes())
        .merge(handlers::accounts::account_routes())
        .merge(protected)
}

/// CORS from config: explicit origins win, otherwise wildcard when allowed.
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.cors_allow_any_origin {
        info!("Using permissive CORS");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

/// Full application router: health, versioned API, Swagger UI and the
/// tracing/request-id/CORS stack.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(health::health_routes())
        .nest("/api/v1", api_v1_routes(state.tokens.clone()))
        .merge(openapi::swagger_ui())
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(cors)
        .with_state(state)
}

// Request logging middleware
async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    tracing::info!(method = %method, uri = %uri, "Incoming request");

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}
