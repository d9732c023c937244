//! Common test utilities and fixtures for integration tests.
//!
//! Every test context owns a fresh SQLite database and upload directory
//! inside a temporary directory, so tests can run in parallel and leave
//! nothing behind.

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use wordcards_backend::db::Database;
use wordcards_backend::services::storage::StorageService;
use wordcards_backend::{build_router, AppState};

/// Test context containing the database handle and the app router.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
    _tmp: TempDir,
}

impl TestContext {
    /// Create a new test context backed by a temporary database.
    ///
    /// # Panics
    /// Panics if the database cannot be created or migrated.
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("Failed to create temp dir");

        let db_path = tmp.path().join("test.db");
        let database_url = format!("sqlite://{}", db_path.display());

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations().await.expect("Failed to run migrations");

        let db = Arc::new(db);
        let storage = StorageService::new(tmp.path().join("uploads"));

        let state = AppState {
            db: db.clone(),
            storage: Arc::new(storage),
        };

        let app = build_router(state);

        Self {
            db,
            app,
            _tmp: tmp,
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test user and return its ID and token.
    pub async fn create_test_user(&self, username: &str) -> (i64, String) {
        let user = self
            .db
            .create_user(username)
            .await
            .expect("Failed to create test user");
        (user.id, user.token)
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }
}
