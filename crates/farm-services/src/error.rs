//! Error types for facade operations.

use backend_core::BackendError;
use thiserror::Error;

/// Errors that can occur in data-access operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The backend rejected the operation; passed through unchanged.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A typed record could not be turned into document fields.
    #[error("could not encode {collection} document: {source}")]
    Encode {
        collection: &'static str,
        source: serde_json::Error,
    },

    /// A stored document does not match its entity shape.
    #[error("could not decode {collection}/{id}: {source}")]
    Decode {
        collection: &'static str,
        id: String,
        source: serde_json::Error,
    },
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
