// src/main.rs
use axum::{extract::Extension, middleware, routing::get, Json, Router};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod auth;
mod common;
mod logging_middleware;
mod store;
mod users;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use common::config::{AuthConfig, ServerConfig};
use common::AppState;
use store::{IdentityStore, SqliteIdentityStore};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // STARTUP VALIDATION
    // ========================================================================

    // Secrets and hash cost are checked once here; nothing is served without them
    let auth_config = AuthConfig::from_env().map_err(|e| {
        error!(error = %e, "Refusing to start: invalid auth configuration");
        e
    })?;
    info!(hash_cost = auth_config.hash_cost, "Auth configuration loaded");

    let server_config = ServerConfig::from_env()?;

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    let database_url = &server_config.database_url;
    if let Some(path_part) = database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .acquire_timeout(server_config.store_timeout)
        .connect_with(connect_options)
        .await?;

    common::migrations::run_migrations(&pool, server_config.reset_db).await?;

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let store: Arc<dyn IdentityStore> =
        Arc::new(SqliteIdentityStore::new(pool, server_config.store_timeout));
    info!(timeout = ?server_config.store_timeout, "Identity store initialized");

    let app_state = Arc::new(AppState::new(&auth_config, store)?);

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = build_router(app_state, &server_config);

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn build_router(state: Arc<AppState>, server_config: &ServerConfig) -> Router {
    let origins: Vec<axum::http::HeaderValue> = server_config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    Router::new()
        .route("/health", get(health))
        // ====================================================================
        // AUTHENTICATION ROUTES (signup, login)
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // USER ROUTES (behind the authentication gate)
        // ====================================================================
        .merge(users::users_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(state))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                    axum::http::HeaderName::from_static(auth::middleware::TOKEN_HEADER),
                    axum::http::HeaderName::from_static(logging_middleware::REQUEST_ID_HEADER),
                ])
                .allow_credentials(true),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
