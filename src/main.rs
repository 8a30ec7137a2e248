//! Kode Share Backend
//!
//! A REST backend for sharing code snippets and files, persisted in a single JSON document.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod ids;
mod models;
mod slug;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use db::{DocumentStore, Repository};
use storage::BlobStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Kode Share Backend");
    tracing::info!("Data path: {:?}", config.data_path);
    tracing::info!("Upload dir: {:?}", config.upload_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.admin_psk.is_none() {
        tracing::warn!("No admin key configured (KODE_ADMIN_PSK). Delete endpoints are open!");
    }
    if !config.uploads_enabled {
        tracing::info!("File uploads are disabled");
    }

    let state = build_state(config.clone()).await?;
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Open the document and blob stores and assemble the shared state.
pub async fn build_state(config: Config) -> Result<AppState, errors::AppError> {
    let store = Arc::new(DocumentStore::open(&config.data_path).await?);
    tracing::info!("Document loaded from {}", store.path().display());

    let blobs = BlobStore::new(config.upload_dir.clone());
    if config.uploads_enabled {
        blobs.ensure_dir().await?;
    }

    let repo = Arc::new(Repository::open(store, blobs).await?);

    Ok(AppState {
        repo,
        config: Arc::new(config),
    })
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Destructive endpoints sit behind the optional admin key
    let admin = middleware::from_fn_with_state(state.clone(), auth::require_admin);

    // API routes
    let api_routes = Router::new()
        // Snippets
        .route("/kode", get(api::list_snippets).post(api::create_snippet))
        .route(
            "/kode/{id}",
            get(api::get_snippet).merge(delete(api::delete_snippet).route_layer(admin.clone())),
        )
        .route("/kode/{id}/copy", post(api::copy_snippet))
        .route("/kode/{id}/like", post(api::like_snippet))
        .route(
            "/kode/{id}/comments",
            get(api::list_comments).post(api::add_comment),
        )
        .route("/kode/{id}/share", get(api::share_snippet))
        // Files
        .route("/files", get(api::list_files).post(api::upload_file))
        .route(
            "/files/{id}",
            get(api::get_file).merge(delete(api::delete_file).route_layer(admin)),
        )
        .route("/files/{id}/like", post(api::like_file))
        .route("/files/{id}/download", post(api::count_download))
        .route("/files/{id}/share", get(api::share_file));

    // Share links and health check (no admin key required)
    let public_routes = Router::new()
        .route("/kode/{id}/{slug}", get(api::open_shared_snippet))
        .route("/files/{id}/{slug}", get(api::open_shared_file))
        .route("/download/{id}/{slug}", get(api::download_file))
        .route("/health", get(health_check));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .merge(public_routes);

    if let Some(static_dir) = &state.config.static_dir {
        router = router.fallback_service(ServeDir::new(static_dir));
    }

    router
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
