//! Database row models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A raw document row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DocumentRow {
    /// Document id within its collection.
    pub id: String,
    /// JSON object body.
    pub body: String,
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ObjectRow {
    /// Object path.
    pub path: String,
    /// MIME type, if supplied at upload.
    pub content_type: Option<String>,
    /// Raw bytes.
    pub bytes: Vec<u8>,
    /// Byte count.
    pub size: i64,
    /// Upload timestamp.
    pub created_at: String,
}

/// An email/password account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Generated user id.
    pub uid: String,
    /// Sign-in email (case-insensitive unique).
    pub email: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Avatar URL.
    pub photo_url: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last successful sign-in.
    pub last_sign_in_at: Option<String>,
}

/// A registered project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Project {
    /// Project identifier.
    pub project_id: String,
    /// SHA-256 hex digest of the API key.
    pub api_key_digest: String,
    /// Auth domain recorded at registration.
    pub auth_domain: String,
    /// Registration timestamp.
    pub created_at: String,
}
