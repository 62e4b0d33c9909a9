//! Core traits and types for backend implementations.
//!
//! This crate provides the shared contract every backend in the farm
//! dashboard ecosystem meets. It defines:
//!
//! - [`DocumentStore`] - schema-less documents grouped into collections
//! - [`ObjectStore`] - binary payload upload and URL resolution
//! - [`AuthProvider`] - email/password accounts and auth-state changes
//! - [`Document`] / [`Query`] - the values those traits exchange
//! - [`BackendError`] - the error every backend operation reports
//!
//! # Example
//!
//! ```rust
//! use backend_core::{Direction, Query};
//! use serde_json::json;
//!
//! let query = Query::collection("farmLocations")
//!     .where_eq("userId", json!("user-1"))
//!     .order_by("createdAt", Direction::Descending);
//!
//! assert_eq!(query.collection, "farmLocations");
//! assert_eq!(query.filters.len(), 1);
//! ```

mod auth;
mod document;
mod error;
mod object;
mod query;
mod stream;
mod timestamp;
mod trait_def;

pub use auth::AuthUser;
pub use document::{to_fields, Document, Fields};
pub use error::BackendError;
pub use object::Payload;
pub use query::{Direction, Filter, OrderBy, Query};
pub use stream::{AuthStateStream, SnapshotStream};
pub use timestamp::Timestamp;
pub use trait_def::{AuthProvider, DocumentStore, ObjectStore};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
