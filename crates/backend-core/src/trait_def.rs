//! The backend collaborator traits.

use async_trait::async_trait;

use crate::auth::AuthUser;
use crate::document::{Document, Fields};
use crate::error::BackendError;
use crate::object::Payload;
use crate::query::Query;
use crate::stream::{AuthStateStream, SnapshotStream};

/// A schema-less document store.
///
/// This trait is object-safe and can be used with `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point lookup. `Ok(None)` when no document exists at `id`.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, BackendError>;

    /// Run a query and return the matching documents in order.
    async fn query(&self, query: &Query) -> Result<Vec<Document>, BackendError>;

    /// Insert a new document and return its generated id.
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, BackendError>;

    /// Overlay `fields` onto the document at `id`, creating it if missing.
    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), BackendError>;

    /// Permanently remove the document at `id`.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError>;

    /// Open a standing query.
    ///
    /// The stream yields the initial snapshot, then a fresh full snapshot
    /// each time the result set changes. Dropping the stream detaches it.
    async fn listen(&self, query: Query) -> Result<SnapshotStream, BackendError>;

    /// Get a human-readable name for this store.
    fn name(&self) -> &str;
}

/// Binary object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `payload` at `path`, replacing anything already there.
    async fn put(&self, path: &str, payload: Payload) -> Result<(), BackendError>;

    /// Resolve the publicly retrievable URL of the object at `path`.
    async fn download_url(&self, path: &str) -> Result<String, BackendError>;

    /// Get a human-readable name for this store.
    fn name(&self) -> &str;
}

/// Email/password authentication.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Sign in with an existing account.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, BackendError>;

    /// Create an account and sign in with it.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, BackendError>;

    /// Sign the current user out.
    async fn sign_out(&self) -> Result<(), BackendError>;

    /// The signed-in user, if any.
    fn current_user(&self) -> Option<AuthUser>;

    /// Watch auth state.
    ///
    /// The first item is the current state and is delivered asynchronously.
    fn auth_state(&self) -> AuthStateStream;

    /// Get a human-readable name for this provider.
    fn name(&self) -> &str;
}
