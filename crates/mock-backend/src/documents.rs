//! Mock document store - accepts writes, remembers nothing.

use backend_core::{
    async_trait, BackendError, Document, DocumentStore, Fields, Query, SnapshotStream,
};
use futures::stream::{self, StreamExt};
use tracing::debug;

/// Id reported for every inserted document.
pub const MOCK_DOC_ID: &str = "mock-doc-id";

/// A document store that reports success for every write and empty results
/// for every read.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDocumentStore;

impl MockDocumentStore {
    /// Create a new mock store.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Document>, BackendError> {
        Ok(None)
    }

    async fn query(&self, _query: &Query) -> Result<Vec<Document>, BackendError> {
        Ok(Vec::new())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, BackendError> {
        debug!(collection, fields = fields.len(), "[mock] add document");
        Ok(MOCK_DOC_ID.to_string())
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), BackendError> {
        debug!(collection, id, fields = fields.len(), "[mock] update document");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), BackendError> {
        debug!(collection, id, "[mock] delete document");
        Ok(())
    }

    async fn listen(&self, query: Query) -> Result<SnapshotStream, BackendError> {
        debug!(collection = %query.collection, "[mock] listen");
        // One empty snapshot on first poll, then silence until dropped.
        let initial = stream::once(async {
            tokio::task::yield_now().await;
            Ok(Vec::new())
        });
        Ok(Box::pin(initial.chain(stream::pending())))
    }

    fn name(&self) -> &str {
        "MockDocumentStore"
    }
}
