//! Project registration keyed by API key.
//!
//! The first startup against a database records the project id with a
//! digest of its API key. Later startups must present the same key.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Project;

/// SHA-256 hex digest of an API key.
pub fn api_key_digest(api_key: &str) -> String {
    hex::encode(Sha256::digest(api_key.as_bytes()))
}

/// Get a project registration.
pub async fn get_project(pool: &SqlitePool, project_id: &str) -> Result<Option<Project>> {
    let project = sqlx::query_as::<_, Project>(
        r#"
        SELECT project_id, api_key_digest, auth_domain, created_at
        FROM projects
        WHERE project_id = ?
        "#,
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    Ok(project)
}

/// Register a project on first use, or verify its API key afterwards.
pub async fn register_or_verify(
    pool: &SqlitePool,
    project_id: &str,
    api_key: &str,
    auth_domain: &str,
) -> Result<Project> {
    let digest = api_key_digest(api_key);

    if let Some(project) = get_project(pool, project_id).await? {
        if project.api_key_digest != digest {
            return Err(DatabaseError::ApiKeyMismatch {
                project_id: project_id.to_string(),
            });
        }
        return Ok(project);
    }

    sqlx::query(
        r#"
        INSERT INTO projects (project_id, api_key_digest, auth_domain)
        VALUES (?, ?, ?)
        ON CONFLICT(project_id) DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(&digest)
    .bind(auth_domain)
    .execute(pool)
    .await?;

    tracing::info!(project_id, "Registered project");

    // Re-read: a concurrent registration may have won the insert.
    let project = get_project(pool, project_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Project",
            id: project_id.to_string(),
        })?;

    if project.api_key_digest != digest {
        return Err(DatabaseError::ApiKeyMismatch {
            project_id: project_id.to_string(),
        });
    }

    Ok(project)
}
