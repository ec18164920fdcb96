//! Course Registry API Server implementation
//!
//! HTTP REST API server using Axum. Each uploaded workbook becomes an
//! isolated session with its own pending edits.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers;
use super::sessions::SessionStore;
use crate::config::RegistryConfig;

/// API Server configuration
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
    /// Sessions untouched for this long are dropped
    pub session_ttl: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_upload_bytes: 16 * 1024 * 1024,
            session_ttl: Duration::from_secs(2 * 60 * 60),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub version: String,
    pub config: RegistryConfig,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config,
            sessions: SessionStore::new(),
        }
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Sessions
        .route("/api/v1/sessions", post(handlers::create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/v1/sessions/:id/volunteers", get(handlers::volunteers))
        .route("/api/v1/sessions/:id/courses", get(handlers::courses))
        .route("/api/v1/sessions/:id/table", get(handlers::table))
        // Pending edits
        .route(
            "/api/v1/sessions/:id/edits",
            get(handlers::list_edits)
                .post(handlers::add_edit)
                .delete(handlers::clear_edits),
        )
        .route(
            "/api/v1/sessions/:id/edits/:position",
            delete(handlers::remove_edit),
        )
        .route("/api/v1/sessions/:id/commit", post(handlers::commit))
        .route("/api/v1/sessions/:id/download", get(handlers::download))
        // State and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig, registry: RegistryConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "course_registry=info,tower_http=info".into()),
        )
        .init();

    let state = Arc::new(AppState::new(registry));
    let sweeper = tokio::spawn(expire_sessions(state.clone(), config.session_ttl));
    let app = router(state, config.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("📒 Course Registry API Server starting on http://{}", addr);
    info!("   Upload: POST /api/v1/sessions (multipart field 'file')");
    info!("   Health: /health, Version: /version");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    sweeper.abort();

    info!("Course Registry API Server shutdown complete");
    Ok(())
}

/// How often idle sessions are looked for
fn sweep_period(ttl: Duration) -> Duration {
    (ttl / 4).clamp(Duration::from_secs(1), Duration::from_secs(60))
}

/// Drop idle sessions until the server stops
async fn expire_sessions(state: Arc<AppState>, ttl: Duration) {
    let mut ticker = tokio::time::interval(sweep_period(ttl));
    loop {
        ticker.tick().await;
        match state.sessions.evict_idle(ttl) {
            Ok(0) => {}
            Ok(n) => info!("expired {} idle session(s), {} open", n, state.sessions.len()),
            Err(e) => warn!("session sweep failed: {}", e),
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}
