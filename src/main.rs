mod config;
mod dto;
mod error;
mod handlers;
mod keys;
mod models;
mod permissions;
mod repositories;
mod services;
mod utils;

use axum::{
    http::{header, Method},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::mysql::MySqlPoolOptions;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppState, Config};
use crate::handlers::{
    auth_requests::{auth_request_consented_handler, auth_request_get_handler},
    authentication::authentication_handler,
    authorization::{authorize_handler, authorize_post_handler, consented_handler},
    consents::{consent_create_handler, consent_delete_handler, consents_list_handler},
    metadata::{jwks_handler, openid_configuration_handler},
    password_reset::{
        password_hash_handler, password_reset_confirm_handler, password_reset_request_handler,
    },
    revocation::revocation_handler,
    sessions::{
        session_delete_handler, session_get_handler, session_verify_handler,
        sessions_list_handler, token_verify_handler, update_last_logined_handler,
    },
    token::token_handler,
    totp::{totp_disable_handler, totp_provision_handler, totp_verify_handler},
    userinfo::userinfo_handler,
};
use crate::keys::KeyStore;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Health check endpoint
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create the application router with all routes configured
///
/// # Routes
///
/// ## Public routes
/// - GET  /health - liveness
/// - GET  /authorization - start the authorization-code flow (redirects)
/// - POST /authorization - legacy consent submit (redirects)
/// - GET  /consented - post-consent redirect to the client
/// - POST /token - authorization_code and refresh_token grants
/// - POST /revocation - RFC 7009 revocation
/// - GET  /userinfo - OIDC userinfo
/// - GET  /.well-known/openid-configuration - discovery
/// - GET  /.well-known/jwks.json - signing keys
///
/// ## Internal routes (network-restricted; consumed by the frontend)
/// - POST /internal/authentication - password/TOTP login
/// - GET/POST /internal/consents, DELETE /internal/consents/:id
/// - GET  /internal/sessions?user_id= - session list
/// - GET/DELETE /internal/sessions/:sid
/// - GET  /internal/session_verify?session_jwt=
/// - GET  /internal/token_verify?jti=
/// - GET  /internal/auth-requests/:id, POST /internal/auth-requests/:id/consented
/// - POST /internal/totp/:uid (+ /verify, /disable)
/// - POST /internal/password_reset/request, /internal/password_reset/confirm
/// - POST /internal/password_hash
/// - POST /internal/update_last_logined
pub fn create_router(state: AppState) -> Router {
    let wellknown_routes = Router::new()
        .route("/openid-configuration", get(openid_configuration_handler))
        .route("/jwks.json", get(jwks_handler));

    let internal_routes = Router::new()
        .route("/authentication", post(authentication_handler))
        .route("/consents", get(consents_list_handler).post(consent_create_handler))
        .route("/consents/:id", delete(consent_delete_handler))
        .route("/sessions", get(sessions_list_handler))
        .route("/sessions/:sid", get(session_get_handler))
        .route("/sessions/:sid", delete(session_delete_handler))
        .route("/session_verify", get(session_verify_handler))
        .route("/token_verify", get(token_verify_handler))
        .route("/auth-requests/:id", get(auth_request_get_handler))
        .route(
            "/auth-requests/:id/consented",
            post(auth_request_consented_handler),
        )
        .route("/totp/:uid", post(totp_provision_handler))
        .route("/totp/:uid/verify", post(totp_verify_handler))
        .route("/totp/:uid/disable", post(totp_disable_handler))
        .route("/password_reset/request", post(password_reset_request_handler))
        .route("/password_reset/confirm", post(password_reset_confirm_handler))
        .route("/password_hash", post(password_hash_handler))
        .route("/update_last_logined", post(update_last_logined_handler));

    Router::new()
        .route("/health", get(health_handler))
        .route("/authorization", get(authorize_handler).post(authorize_post_handler))
        .route("/consented", get(consented_handler))
        .route("/token", post(token_handler))
        .route("/revocation", post(revocation_handler))
        .route("/userinfo", get(userinfo_handler))
        .nest("/.well-known", wellknown_routes)
        .nest("/internal", internal_routes)
        // Middleware layers
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .max_age(Duration::from_secs(3600)),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oidc_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration and signing keys
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let keys = KeyStore::load(
        &config.key_type,
        &config.public_keys_path,
        &config.private_keys_path,
    )?;
    tracing::info!(
        kid = %keys.active().kid,
        key_count = keys.pairs().len(),
        "loaded signing keys"
    );

    // Create database pool with production settings
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    let addr = config.socket_addr();
    let state = AppState::new(pool, config, keys);
    let app = create_router(state);

    tracing::info!("authorization server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
