//! Mock backend implementations for the farm dashboard.
//!
//! This crate provides stand-ins for the backend traits so the rest of the
//! application runs without live credentials:
//! - `MockDocumentStore` - accepts every write, never retains anything
//! - `MockObjectStore` - accepts every upload, resolves a placeholder URL
//! - `MockAuth` - signs anyone in with a fabricated user
//! - `FailingBackend` - rejects every operation, for error-path tests
//!
//! The mocks are structural: reads always come back empty or absent, even
//! after writes in the same process.
//!
//! # Example
//!
//! ```rust
//! use mock_backend::{AuthProvider, MockAuth};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_backend::BackendError> {
//!     let auth = MockAuth::new();
//!     let user = auth.sign_in("jane@example.com", "secret").await?;
//!     assert_eq!(user.display_name.as_deref(), Some("jane"));
//!     Ok(())
//! }
//! ```

mod auth;
mod documents;
mod failing;
mod objects;

// Re-export backend-core types for convenience
pub use backend_core::{
    async_trait, AuthProvider, AuthUser, BackendError, Document, DocumentStore, ObjectStore,
    Payload, Query,
};

pub use auth::{MockAuth, MOCK_AUTH_DELAY, MOCK_USER_ID};
pub use documents::{MockDocumentStore, MOCK_DOC_ID};
pub use failing::FailingBackend;
pub use objects::{MockObjectStore, MOCK_IMAGE_URL};
