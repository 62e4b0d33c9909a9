//! SQLite persistence layer for the farm dashboard.
//!
//! This crate is the "real" backend: it implements the `backend-core`
//! traits on top of SQLx with SQLite.
//!
//! - documents: JSON bodies grouped by collection, equality queries,
//!   shallow merge-upsert and standing queries fed by a change broadcast
//! - objects: uploaded payloads addressed by path
//! - accounts: email/password sign-up and sign-in (Argon2 hashes)
//! - projects: API-key registration checked at startup
//!
//! # Example
//!
//! ```no_run
//! use backend_core::{DocumentStore, Query};
//! use database::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:farm.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let fields = backend_core::to_fields(&serde_json::json!({ "name": "North Field" }))?;
//!     let id = db.insert("farmLocations", fields).await?;
//!     let docs = db.query(&Query::collection("farmLocations")).await?;
//!     assert!(docs.iter().any(|d| d.id == id));
//!
//!     Ok(())
//! }
//! ```

pub mod accounts;
pub mod changes;
pub mod documents;
pub mod error;
pub mod models;
pub mod objects;
pub mod project;

pub use changes::ChangeFeed;
pub use error::{DatabaseError, Result};
pub use models::{Account, DocumentRow, ObjectRow, Project};

use std::sync::Arc;

use backend_core::AuthUser;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tokio::sync::watch;

/// Base URL used for object links until [`Database::with_object_base_url`] is called.
pub const DEFAULT_OBJECT_BASE_URL: &str = "http://localhost:8080/v0/objects";

/// Database connection wrapper.
///
/// Cloning is cheap; clones share the pool, the change feed and the
/// signed-in user.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    changes: ChangeFeed,
    session: Arc<watch::Sender<Option<AuthUser>>>,
    object_base_url: String,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/farm.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        let (session, _) = watch::channel(None);

        Ok(Self {
            pool,
            changes: ChangeFeed::new(),
            session: Arc::new(session),
            object_base_url: DEFAULT_OBJECT_BASE_URL.to_string(),
        })
    }

    /// Set the public base URL that object links are resolved against.
    pub fn with_object_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.object_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the change feed written to by every document mutation.
    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    /// Public base URL for object links.
    pub fn object_base_url(&self) -> &str {
        &self.object_base_url
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub(crate) fn session(&self) -> &watch::Sender<Option<AuthUser>> {
        &self.session
    }
}
