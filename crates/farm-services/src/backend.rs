//! Backend selection.
//!
//! [`select_backend`] inspects a [`BackendConfig`] and produces a [`Backend`]
//! bundle: the SQLite-backed stores when configuration is complete and the
//! project initializes, the mock stores otherwise. Selection never fails.

use std::fmt;
use std::sync::Arc;

use backend_core::{AuthProvider, BackendError, DocumentStore, ObjectStore};
use database::Database;
use mock_backend::{MockAuth, MockDocumentStore, MockObjectStore};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::BackendConfig;

/// Which implementation a [`Backend`] is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Real,
    Mock,
}

/// The handle set every facade operation runs against.
///
/// Cheap to clone; clones share the same stores and clock.
#[derive(Clone)]
pub struct Backend {
    kind: BackendKind,
    documents: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    auth: Arc<dyn AuthProvider>,
    clock: Clock,
}

impl Backend {
    /// Assemble a bundle from individual stores.
    pub fn from_parts(
        kind: BackendKind,
        documents: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            kind,
            documents,
            objects,
            auth,
            clock: Clock::new(),
        }
    }

    /// The mock bundle.
    pub fn mock() -> Self {
        Self::from_parts(
            BackendKind::Mock,
            Arc::new(MockDocumentStore::new()),
            Arc::new(MockObjectStore::new()),
            Arc::new(MockAuth::new()),
        )
    }

    /// A bundle over an already migrated database.
    pub fn from_database(db: Database) -> Self {
        Self::from_parts(
            BackendKind::Real,
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            Arc::new(db),
        )
    }

    /// Initialize the real backend.
    ///
    /// Connects to the configured database, runs migrations and registers or
    /// verifies the project's API key.
    pub async fn connect(config: &BackendConfig) -> Result<Self, BackendError> {
        let credentials = config.credentials().ok_or_else(|| {
            BackendError::Initialization(format!(
                "missing configuration: {}",
                config.missing_required().join(", ")
            ))
        })?;
        let url = config.resolved_database_url().ok_or_else(|| {
            BackendError::Initialization("no database URL could be derived".to_string())
        })?;

        let mut db = Database::connect(&url).await?;
        if let Some(base_url) = config.resolved_storage_public_url() {
            db = db.with_object_base_url(base_url);
        }
        db.migrate().await?;

        database::project::register_or_verify(
            db.pool(),
            credentials.project_id,
            credentials.api_key,
            credentials.auth_domain,
        )
        .await?;

        Ok(Self::from_database(db))
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn is_mock(&self) -> bool {
        self.kind == BackendKind::Mock
    }

    pub fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub fn auth(&self) -> &dyn AuthProvider {
        self.auth.as_ref()
    }

    /// Clock used to stamp documents written through this bundle.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("kind", &self.kind)
            .field("documents", &self.documents.name())
            .field("objects", &self.objects.name())
            .field("auth", &self.auth.name())
            .finish()
    }
}

/// Choose and initialize a backend. Falls back to the mock on any problem.
pub async fn select_backend(config: &BackendConfig) -> Backend {
    let missing = config.missing_required();
    if !missing.is_empty() {
        warn!(
            "Backend configuration incomplete (missing {}), using mock backend",
            missing.join(", ")
        );
        return Backend::mock();
    }

    match Backend::connect(config).await {
        Ok(backend) => {
            info!(
                "Using real backend for project {}",
                config.project_id.as_deref().unwrap_or_default()
            );
            backend
        }
        Err(e) => {
            warn!("Backend initialization failed: {}, using mock backend", e);
            Backend::mock()
        }
    }
}

/// Owns the process's single [`Backend`].
///
/// The first [`init`](Self::init) selects a backend; later calls return that
/// same bundle whatever configuration they pass.
#[derive(Debug, Default)]
pub struct BackendSelector {
    backend: OnceCell<Backend>,
}

impl BackendSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a backend on first call; return the existing one afterwards.
    pub async fn init(&self, config: &BackendConfig) -> &Backend {
        self.backend
            .get_or_init(|| select_backend(config))
            .await
    }

    /// The selected backend, if [`init`](Self::init) has completed.
    pub fn get(&self) -> Option<&Backend> {
        self.backend.get()
    }
}
