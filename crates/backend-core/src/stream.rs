//! Stream types for standing queries and auth-state changes.

use std::pin::Pin;

use futures::stream::Stream;

use crate::auth::AuthUser;
use crate::document::Document;
use crate::error::BackendError;

/// Full, ordered result sets of a standing query; one item per change.
pub type SnapshotStream =
    Pin<Box<dyn Stream<Item = Result<Vec<Document>, BackendError>> + Send>>;

/// Auth state over time; `None` means nobody is signed in.
pub type AuthStateStream = Pin<Box<dyn Stream<Item = Option<AuthUser>> + Send>>;
