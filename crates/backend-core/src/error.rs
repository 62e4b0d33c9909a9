//! Error types for backend operations.

use thiserror::Error;

/// Errors that can occur during backend operations.
///
/// Backends report their own failures through this type; callers above the
/// backend pass it through untouched.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached or is not running.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The caller is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A storage quota was exceeded.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The addressed record does not exist.
    #[error("{collection} not found: {id}")]
    NotFound { collection: String, id: String },

    /// The request itself was malformed (bad email, weak password, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Email/password pair did not match an account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Sign-up for an email that already has an account.
    #[error("account already exists: {0}")]
    AccountExists(String),

    /// A document body could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The underlying storage engine failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The backend could not be initialized.
    #[error("initialization failed: {0}")]
    Initialization(String),
}
