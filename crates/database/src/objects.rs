//! Object storage for uploaded payloads.

use backend_core::{async_trait, BackendError, ObjectStore, Payload};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::ObjectRow;
use crate::Database;

/// Store an object, replacing any previous object at the same path.
pub async fn put_object(pool: &SqlitePool, path: &str, payload: &Payload) -> Result<()> {
    if path.is_empty() {
        return Err(DatabaseError::InvalidInput("object path is empty".to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO objects (path, content_type, bytes, size)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(path) DO UPDATE SET
            content_type = excluded.content_type,
            bytes = excluded.bytes,
            size = excluded.size,
            created_at = datetime('now')
        "#,
    )
    .bind(path)
    .bind(payload.content_type.as_deref())
    .bind(&payload.bytes)
    .bind(payload.bytes.len() as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a stored object.
pub async fn get_object(pool: &SqlitePool, path: &str) -> Result<ObjectRow> {
    sqlx::query_as::<_, ObjectRow>(
        r#"
        SELECT path, content_type, bytes, size, created_at
        FROM objects
        WHERE path = ?
        "#,
    )
    .bind(path)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Object",
        id: path.to_string(),
    })
}

/// Check whether an object exists.
pub async fn object_exists(pool: &SqlitePool, path: &str) -> Result<bool> {
    let found = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM objects WHERE path = ?
        "#,
    )
    .bind(path)
    .fetch_one(pool)
    .await?;

    Ok(found > 0)
}

/// Public URL of the object at `path` under `base_url`.
pub fn object_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}?alt=media",
        base_url.trim_end_matches('/'),
        urlencoding::encode(path)
    )
}

#[async_trait]
impl ObjectStore for Database {
    async fn put(&self, path: &str, payload: Payload) -> std::result::Result<(), BackendError> {
        put_object(self.pool(), path, &payload).await?;
        tracing::debug!(path, bytes = payload.len(), "Stored object");
        Ok(())
    }

    async fn download_url(&self, path: &str) -> std::result::Result<String, BackendError> {
        if !object_exists(self.pool(), path).await? {
            return Err(DatabaseError::NotFound {
                entity: "Object",
                id: path.to_string(),
            }
            .into());
        }
        Ok(object_url(self.object_base_url(), path))
    }

    fn name(&self) -> &str {
        "SqliteObjectStore"
    }
}
