//! Generic document operations shared by the entity modules.
//!
//! Each entity module is a thin typed layer over these helpers: they pick
//! the collection, inject owner ids and stamps, and decode results.

use backend_core::{to_fields, Direction, Document, Fields, Query};
use serde::Serialize;
use serde_json::Value;

use crate::backend::Backend;
use crate::error::{Result, ServiceError};
use crate::models::{fields, Entity, EntityKind, Record};

/// Serialize a caller-supplied struct into document fields.
pub(crate) fn encode<T: Serialize>(kind: EntityKind, value: &T) -> Result<Fields> {
    to_fields(value).map_err(|source| ServiceError::Encode {
        collection: kind.collection(),
        source,
    })
}

/// Decode one stored document into its record type.
pub(crate) fn decode<T: Record>(document: &Document) -> Result<T> {
    document.decode().map_err(|source| ServiceError::Decode {
        collection: T::KIND.collection(),
        id: document.id.clone(),
        source,
    })
}

/// Decode a snapshot, failing on the first mismatching document.
pub(crate) fn decode_all<T: Record>(documents: &[Document]) -> Result<Vec<T>> {
    documents.iter().map(decode::<T>).collect()
}

/// Documents of `kind` owned by `owner_id`, ordered by `order_field`.
pub(crate) fn owned_query(
    kind: EntityKind,
    owner_id: &str,
    order_field: &str,
    direction: Direction,
) -> Query {
    Query::collection(kind.collection())
        .where_eq(fields::USER_ID, Value::String(owner_id.to_string()))
        .order_by(order_field, direction)
}

pub(crate) async fn get_one<T: Record>(backend: &Backend, id: &str) -> Result<Option<T>> {
    let document = backend
        .documents()
        .get(T::KIND.collection(), id)
        .await?;
    document.as_ref().map(decode::<T>).transpose()
}

pub(crate) async fn list<T: Record>(backend: &Backend, query: &Query) -> Result<Vec<T>> {
    let documents = backend.documents().query(query).await?;
    decode_all(&documents)
}

/// Most recent first, ties by insertion order.
pub(crate) async fn list_for_owner<T: Record>(backend: &Backend, owner_id: &str) -> Result<Vec<T>> {
    let query = owned_query(T::KIND, owner_id, fields::CREATED_AT, Direction::Descending);
    list(backend, &query).await
}

/// Insert a document owned by `owner_id`.
///
/// `extra` is merged over the caller's fields; the owner id and every field
/// named in `stamps` are merged last, all stamped with one clock reading.
pub(crate) async fn insert_owned<T: Serialize>(
    backend: &Backend,
    kind: EntityKind,
    owner_id: &str,
    value: &T,
    extra: Fields,
    stamps: &[&str],
) -> Result<String> {
    let mut document = encode(kind, value)?;
    document.extend(extra);
    document.insert(
        fields::USER_ID.to_string(),
        Value::String(owner_id.to_string()),
    );
    stamp(backend, &mut document, stamps);

    let id = backend
        .documents()
        .insert(kind.collection(), document)
        .await?;
    Ok(id)
}

/// Merge `patch` into document `id`, refreshing `updatedAt`.
///
/// Writes even when the document does not exist yet.
pub(crate) async fn update<T: Serialize>(
    backend: &Backend,
    kind: EntityKind,
    id: &str,
    patch: &T,
) -> Result<()> {
    let mut document = encode(kind, patch)?;
    document.remove(fields::USER_ID);
    document.remove(fields::CREATED_AT);
    stamp(backend, &mut document, &[fields::UPDATED_AT]);

    backend
        .documents()
        .merge(kind.collection(), id, document)
        .await?;
    Ok(())
}

pub(crate) async fn delete(backend: &Backend, kind: EntityKind, id: &str) -> Result<()> {
    backend.documents().delete(kind.collection(), id).await?;
    Ok(())
}

fn stamp(backend: &Backend, document: &mut Fields, stamps: &[&str]) {
    if stamps.is_empty() {
        return;
    }
    let now = Value::String(backend.clock().now().to_string());
    for field in stamps {
        document.insert(field.to_string(), now.clone());
    }
}

/// Fetch any entity by kind and id.
pub async fn get_entity(backend: &Backend, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
    let Some(document) = backend.documents().get(kind.collection(), id).await? else {
        return Ok(None);
    };
    kind.decode(&document)
        .map(Some)
        .map_err(|source| ServiceError::Decode {
            collection: kind.collection(),
            id: document.id.clone(),
            source,
        })
}
