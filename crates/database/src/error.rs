//! Database error types.

use backend_core::BackendError;
use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored or supplied JSON could not be processed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Rejected input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Email/password mismatch
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing failure
    #[error("password hash error: {0}")]
    PasswordHash(String),

    /// Project registered with a different API key
    #[error("API key does not match project {project_id}")]
    ApiKeyMismatch { project_id: String },
}

impl From<DatabaseError> for BackendError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Sqlx(e) => match e {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    BackendError::Unavailable(e.to_string())
                }
                other => BackendError::Storage(other.to_string()),
            },
            DatabaseError::Migration(e) => BackendError::Initialization(e.to_string()),
            DatabaseError::Json(e) => BackendError::Serialization(e),
            DatabaseError::NotFound { entity, id } => BackendError::NotFound {
                collection: entity.to_string(),
                id,
            },
            DatabaseError::AlreadyExists { id, .. } => BackendError::AccountExists(id),
            DatabaseError::InvalidInput(msg) => BackendError::InvalidArgument(msg),
            DatabaseError::InvalidCredentials => BackendError::InvalidCredentials,
            DatabaseError::PasswordHash(msg) => BackendError::Storage(msg),
            err @ DatabaseError::ApiKeyMismatch { .. } => {
                BackendError::PermissionDenied(err.to_string())
            }
        }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
