//! Document CRUD operations.

use backend_core::{
    async_trait, BackendError, Direction, Document, DocumentStore, Fields, Query, SnapshotStream,
};
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::changes::{self, ChangeFeed};
use crate::error::Result;
use crate::models::DocumentRow;
use crate::Database;

/// Generate a new document id.
fn new_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// JSON path for a top-level field.
fn field_path(field: &str) -> String {
    format!("$.\"{}\"", field)
}

fn row_to_document(row: DocumentRow) -> Result<Document> {
    let fields: Fields = serde_json::from_str(&row.body)?;
    Ok(Document::new(row.id, fields))
}

/// Get a document by collection and id.
pub async fn get_document(pool: &SqlitePool, collection: &str, id: &str) -> Result<Option<Document>> {
    let row = sqlx::query_as::<_, DocumentRow>(
        r#"
        SELECT id, body
        FROM documents
        WHERE collection = ? AND id = ?
        "#,
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_document).transpose()
}

/// Run an equality/order query.
///
/// Ties on the order field fall back to insertion order in the same
/// direction, so descending queries list the newest insert first.
pub async fn query_documents(pool: &SqlitePool, query: &Query) -> Result<Vec<Document>> {
    let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ?");

    for filter in &query.filters {
        sql.push_str(match filter.value {
            Value::Null => " AND json_type(body, ?) = 'null'",
            Value::Array(_) | Value::Object(_) => " AND json_extract(body, ?) = json(?)",
            _ => " AND json_extract(body, ?) = ?",
        });
    }

    match &query.order_by {
        Some(order) => {
            let dir = match order.direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            sql.push_str(&format!(" ORDER BY json_extract(body, ?) {dir}, seq {dir}"));
        }
        None => sql.push_str(" ORDER BY seq ASC"),
    }

    if query.limit.is_some() {
        sql.push_str(" LIMIT ?");
    }

    let mut q = sqlx::query_as::<_, DocumentRow>(&sql).bind(query.collection.clone());

    for filter in &query.filters {
        q = q.bind(field_path(&filter.field));
        q = match &filter.value {
            Value::Null => q,
            Value::Bool(b) => q.bind(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => q.bind(i),
                None => q.bind(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => q.bind(s.clone()),
            other @ (Value::Array(_) | Value::Object(_)) => q.bind(other.to_string()),
        };
    }

    if let Some(order) = &query.order_by {
        q = q.bind(field_path(&order.field));
    }

    if let Some(limit) = query.limit {
        q = q.bind(limit as i64);
    }

    let rows = q.fetch_all(pool).await?;
    rows.into_iter().map(row_to_document).collect()
}

/// Insert a new document and return its generated id.
pub async fn insert_document(pool: &SqlitePool, collection: &str, fields: &Fields) -> Result<String> {
    let id = new_document_id();
    let body = serde_json::to_string(fields)?;

    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, body)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(collection)
    .bind(&id)
    .bind(body)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Overlay `patch` onto a document's top-level fields.
///
/// Creates the document when it does not exist yet.
pub async fn merge_document(pool: &SqlitePool, collection: &str, id: &str, patch: Fields) -> Result<()> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_scalar::<_, String>(
        r#"
        SELECT body
        FROM documents
        WHERE collection = ? AND id = ?
        "#,
    )
    .bind(collection)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let mut document = match existing {
        Some(body) => Document::new(id, serde_json::from_str(&body)?),
        None => Document::new(id, Fields::new()),
    };
    document.merge(patch);
    let body = serde_json::to_string(&document.fields)?;

    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, body)
        VALUES (?, ?, ?)
        ON CONFLICT(collection, id) DO UPDATE SET
            body = excluded.body,
            updated_at = datetime('now')
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(body)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Delete a document.
///
/// Returns true if a document was deleted, false if none existed.
pub async fn delete_document(pool: &SqlitePool, collection: &str, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM documents
        WHERE collection = ? AND id = ?
        "#,
    )
    .bind(collection)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Count documents in a collection.
pub async fn count_documents(pool: &SqlitePool, collection: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM documents WHERE collection = ?
        "#,
    )
    .bind(collection)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

fn announce(feed: &ChangeFeed, collection: &str) {
    tracing::debug!(collection, "Document change");
    feed.publish(collection);
}

#[async_trait]
impl DocumentStore for Database {
    async fn get(&self, collection: &str, id: &str) -> std::result::Result<Option<Document>, BackendError> {
        Ok(get_document(self.pool(), collection, id).await?)
    }

    async fn query(&self, query: &Query) -> std::result::Result<Vec<Document>, BackendError> {
        Ok(query_documents(self.pool(), query).await?)
    }

    async fn insert(&self, collection: &str, fields: Fields) -> std::result::Result<String, BackendError> {
        let id = insert_document(self.pool(), collection, &fields).await?;
        announce(self.changes(), collection);
        Ok(id)
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> std::result::Result<(), BackendError> {
        merge_document(self.pool(), collection, id, fields).await?;
        announce(self.changes(), collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> std::result::Result<(), BackendError> {
        if delete_document(self.pool(), collection, id).await? {
            announce(self.changes(), collection);
        }
        Ok(())
    }

    async fn listen(&self, query: Query) -> std::result::Result<SnapshotStream, BackendError> {
        Ok(changes::listen(self.pool().clone(), self.changes(), query))
    }

    fn name(&self) -> &str {
        "SqliteDocumentStore"
    }
}
