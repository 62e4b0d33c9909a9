//! Email/password accounts and the signed-in session.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use backend_core::{async_trait, AuthProvider, AuthStateStream, AuthUser, BackendError};
use sqlx::SqlitePool;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::Account;
use crate::Database;

/// Shortest accepted password.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(DatabaseError::InvalidInput("email cannot be empty".to_string()));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(DatabaseError::InvalidInput(format!(
            "email is too long ({} chars, max {})",
            email.len(),
            MAX_EMAIL_LENGTH
        )));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(()),
        _ => Err(DatabaseError::InvalidInput(format!("invalid email: {}", email))),
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| DatabaseError::PasswordHash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DatabaseError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| DatabaseError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

impl From<Account> for AuthUser {
    fn from(account: Account) -> Self {
        AuthUser {
            uid: account.uid,
            email: account.email,
            display_name: account.display_name,
            photo_url: account.photo_url,
        }
    }
}

/// Create an account.
///
/// The display name defaults to the part of the email before `@`.
pub async fn create_account(pool: &SqlitePool, email: &str, password: &str) -> Result<Account> {
    let email = email.trim();
    validate_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DatabaseError::InvalidInput(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let uid = Uuid::new_v4().simple().to_string();
    let password_hash = hash_password(password)?;
    let display_name = AuthUser::local_part(email).to_string();

    sqlx::query(
        r#"
        INSERT INTO accounts (uid, email, password_hash, display_name)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&uid)
    .bind(email)
    .bind(&password_hash)
    .bind(&display_name)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Account",
                    id: email.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_account(pool, &uid).await
}

/// Get an account by uid.
pub async fn get_account(pool: &SqlitePool, uid: &str) -> Result<Account> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT uid, email, password_hash, display_name, photo_url, created_at, last_sign_in_at
        FROM accounts
        WHERE uid = ?
        "#,
    )
    .bind(uid)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Account",
        id: uid.to_string(),
    })
}

/// Get an account by email (case-insensitive).
pub async fn get_account_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT uid, email, password_hash, display_name, photo_url, created_at, last_sign_in_at
        FROM accounts
        WHERE email = ?
        "#,
    )
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Check an email/password pair and record the sign-in.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<Account> {
    let account = get_account_by_email(pool, email)
        .await?
        .ok_or(DatabaseError::InvalidCredentials)?;

    if !verify_password(password, &account.password_hash)? {
        return Err(DatabaseError::InvalidCredentials);
    }

    sqlx::query(
        r#"
        UPDATE accounts
        SET last_sign_in_at = datetime('now')
        WHERE uid = ?
        "#,
    )
    .bind(&account.uid)
    .execute(pool)
    .await?;

    get_account(pool, &account.uid).await
}

/// Count accounts.
pub async fn count_accounts(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM accounts
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[async_trait]
impl AuthProvider for Database {
    async fn sign_in(&self, email: &str, password: &str) -> std::result::Result<AuthUser, BackendError> {
        let user = AuthUser::from(authenticate(self.pool(), email, password).await?);
        tracing::info!(uid = %user.uid, "User signed in");
        self.session().send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> std::result::Result<AuthUser, BackendError> {
        let user = AuthUser::from(create_account(self.pool(), email, password).await?);
        tracing::info!(uid = %user.uid, "Account created");
        self.session().send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> std::result::Result<(), BackendError> {
        if let Some(user) = self.session().send_replace(None) {
            tracing::info!(uid = %user.uid, "User signed out");
        }
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session().borrow().clone()
    }

    fn auth_state(&self) -> AuthStateStream {
        Box::pin(WatchStream::new(self.session().subscribe()))
    }

    fn name(&self) -> &str {
        "SqliteAuth"
    }
}
