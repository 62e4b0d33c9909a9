//! Failing backend - rejects every operation.

use backend_core::{
    async_trait, AuthProvider, AuthStateStream, AuthUser, BackendError, Document, DocumentStore,
    Fields, ObjectStore, Payload, Query, SnapshotStream,
};
use futures::stream;

/// A backend whose every operation fails with [`BackendError::Unavailable`].
///
/// Useful for testing that callers propagate backend failures.
#[derive(Debug, Clone)]
pub struct FailingBackend {
    reason: String,
}

impl FailingBackend {
    /// Create a failing backend that reports `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> BackendError {
        BackendError::Unavailable(self.reason.clone())
    }
}

impl Default for FailingBackend {
    fn default() -> Self {
        Self::new("network unreachable")
    }
}

#[async_trait]
impl DocumentStore for FailingBackend {
    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Document>, BackendError> {
        Err(self.error())
    }

    async fn query(&self, _query: &Query) -> Result<Vec<Document>, BackendError> {
        Err(self.error())
    }

    async fn insert(&self, _collection: &str, _fields: Fields) -> Result<String, BackendError> {
        Err(self.error())
    }

    async fn merge(&self, _collection: &str, _id: &str, _fields: Fields) -> Result<(), BackendError> {
        Err(self.error())
    }

    async fn delete(&self, _collection: &str, _id: &str) -> Result<(), BackendError> {
        Err(self.error())
    }

    async fn listen(&self, _query: Query) -> Result<SnapshotStream, BackendError> {
        Err(self.error())
    }

    fn name(&self) -> &str {
        "FailingBackend"
    }
}

#[async_trait]
impl ObjectStore for FailingBackend {
    async fn put(&self, _path: &str, _payload: Payload) -> Result<(), BackendError> {
        Err(self.error())
    }

    async fn download_url(&self, _path: &str) -> Result<String, BackendError> {
        Err(self.error())
    }

    fn name(&self) -> &str {
        "FailingBackend"
    }
}

#[async_trait]
impl AuthProvider for FailingBackend {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<AuthUser, BackendError> {
        Err(self.error())
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<AuthUser, BackendError> {
        Err(self.error())
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        Err(self.error())
    }

    fn current_user(&self) -> Option<AuthUser> {
        None
    }

    fn auth_state(&self) -> AuthStateStream {
        Box::pin(stream::pending())
    }

    fn name(&self) -> &str {
        "FailingBackend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_operation_fails() {
        let backend = FailingBackend::new("offline");

        let err = DocumentStore::get(&backend, "users", "u1").await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(ref r) if r == "offline"));

        assert!(backend.query(&Query::collection("users")).await.is_err());
        assert!(backend.insert("users", Fields::new()).await.is_err());
        assert!(backend.merge("users", "u1", Fields::new()).await.is_err());
        assert!(DocumentStore::delete(&backend, "users", "u1").await.is_err());
        assert!(backend.listen(Query::collection("users")).await.is_err());
        assert!(backend.put("p", Payload::new("f", vec![])).await.is_err());
        assert!(backend.download_url("p").await.is_err());
        assert!(backend.sign_in("a@b.c", "pw").await.is_err());
        assert!(backend.sign_out().await.is_err());
    }
}
