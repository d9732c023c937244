pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::Database;
use crate::services::storage::StorageService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub storage: Arc<StorageService>,
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Connect to database
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://wordcards.db".to_string());

    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let uploads_dir = std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string());
    let storage = StorageService::new(uploads_dir);

    let state = AppState {
        db: Arc::new(db),
        storage: Arc::new(storage),
    };

    let app = build_router(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Full application router; integration tests build directly on this
pub fn build_router(state: AppState) -> Router {
    // Build router with protected routes
    let protected_routes = Router::new()
        // User routes
        .route("/api/users/me", get(routes::users::me))
        // Dictionary routes
        .route("/api/dictionaries", get(routes::dictionaries::list_mine))
        .route("/api/dictionaries", post(routes::dictionaries::upload))
        .route(
            "/api/dictionaries/available",
            get(routes::dictionaries::list_available),
        )
        .route("/api/dictionaries/search", get(routes::dictionaries::search))
        .route(
            "/api/dictionaries/{id}",
            get(routes::dictionaries::get_dictionary),
        )
        .route(
            "/api/dictionaries/{id}",
            delete(routes::dictionaries::delete_dictionary),
        )
        .route(
            "/api/dictionaries/{id}/status",
            post(routes::dictionaries::toggle_status),
        )
        .route(
            "/api/dictionaries/{id}/students",
            post(routes::dictionaries::enroll),
        )
        .route(
            "/api/dictionaries/{id}/students",
            delete(routes::dictionaries::unenroll),
        )
        // Lesson routes
        .route("/api/lessons", post(routes::lessons::start_lesson))
        .route("/api/lessons/{id}", get(routes::lessons::get_lesson))
        .route("/api/lessons/{id}/next-card", get(routes::lessons::next_card))
        .route(
            "/api/lessons/{id}/required-answers",
            put(routes::lessons::set_required_answers),
        )
        // Card routes
        .route("/api/cards/{id}/answer", post(routes::cards::answer))
        .route("/api/cards/{id}/status", put(routes::cards::set_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    // Build full router
    Router::new()
        .route("/health", get(health_check))
        .route("/api/users/register", post(routes::users::register))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
