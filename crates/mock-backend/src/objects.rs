//! Mock object store - accepts uploads, serves a placeholder.

use backend_core::{async_trait, BackendError, ObjectStore, Payload};
use tracing::debug;

/// URL resolved for every object.
pub const MOCK_IMAGE_URL: &str = "https://via.placeholder.com/400x300?text=Mock+Image";

/// An object store that discards uploads and resolves every path to
/// [`MOCK_IMAGE_URL`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MockObjectStore;

impl MockObjectStore {
    /// Create a new mock object store.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put(&self, path: &str, payload: Payload) -> Result<(), BackendError> {
        debug!(path, bytes = payload.len(), "[mock] upload file");
        Ok(())
    }

    async fn download_url(&self, _path: &str) -> Result<String, BackendError> {
        Ok(MOCK_IMAGE_URL.to_string())
    }

    fn name(&self) -> &str {
        "MockObjectStore"
    }
}
