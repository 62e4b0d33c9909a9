//! Backend configuration loaded from environment variables.

use std::env;
use std::fmt;

/// API key variable.
pub const ENV_API_KEY: &str = "FARM_API_KEY";
/// Auth domain variable.
pub const ENV_AUTH_DOMAIN: &str = "FARM_AUTH_DOMAIN";
/// Project id variable.
pub const ENV_PROJECT_ID: &str = "FARM_PROJECT_ID";
/// Storage bucket variable.
pub const ENV_STORAGE_BUCKET: &str = "FARM_STORAGE_BUCKET";
/// Messaging sender id variable.
pub const ENV_MESSAGING_SENDER_ID: &str = "FARM_MESSAGING_SENDER_ID";
/// App id variable.
pub const ENV_APP_ID: &str = "FARM_APP_ID";
/// SQLite URL override.
pub const ENV_DATABASE_URL: &str = "FARM_DATABASE_URL";
/// Public object URL base override.
pub const ENV_STORAGE_PUBLIC_URL: &str = "FARM_STORAGE_PUBLIC_URL";

/// Backend configuration.
///
/// Every value is optional; empty or whitespace-only values count as
/// absent. The API key, project id and auth domain together decide whether
/// a real backend can be attempted.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    /// API key.
    pub api_key: Option<String>,
    /// Auth domain.
    pub auth_domain: Option<String>,
    /// Project identifier.
    pub project_id: Option<String>,
    /// Object storage bucket.
    pub storage_bucket: Option<String>,
    /// Messaging sender id.
    pub messaging_sender_id: Option<String>,
    /// App id.
    pub app_id: Option<String>,
    /// SQLite URL; derived from the project id when unset.
    pub database_url: Option<String>,
    /// Public base URL for object links; derived when unset.
    pub storage_public_url: Option<String>,
}

/// The minimum credential set for a real backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub api_key: &'a str,
    pub project_id: &'a str,
    pub auth_domain: &'a str,
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `FARM_API_KEY` | API key | (required for real backend) |
    /// | `FARM_PROJECT_ID` | Project id | (required for real backend) |
    /// | `FARM_AUTH_DOMAIN` | Auth domain | (required for real backend) |
    /// | `FARM_STORAGE_BUCKET` | Object bucket | `{project_id}.appspot.com` |
    /// | `FARM_MESSAGING_SENDER_ID` | Messaging sender id | none |
    /// | `FARM_APP_ID` | App id | none |
    /// | `FARM_DATABASE_URL` | SQLite URL | `sqlite:{project_id}.db?mode=rwc` |
    /// | `FARM_STORAGE_PUBLIC_URL` | Object URL base | `https://{auth_domain}/v0/b/{bucket}/o` |
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            api_key: get(ENV_API_KEY),
            auth_domain: get(ENV_AUTH_DOMAIN),
            project_id: get(ENV_PROJECT_ID),
            storage_bucket: get(ENV_STORAGE_BUCKET),
            messaging_sender_id: get(ENV_MESSAGING_SENDER_ID),
            app_id: get(ENV_APP_ID),
            database_url: get(ENV_DATABASE_URL),
            storage_public_url: get(ENV_STORAGE_PUBLIC_URL),
        }
    }

    /// Names of the required variables that are absent.
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            (ENV_API_KEY, &self.api_key),
            (ENV_PROJECT_ID, &self.project_id),
            (ENV_AUTH_DOMAIN, &self.auth_domain),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(name, _)| name)
        .collect()
    }

    /// Whether the minimum credential set is present.
    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }

    /// The minimum credential set, if complete.
    pub fn credentials(&self) -> Option<Credentials<'_>> {
        Some(Credentials {
            api_key: non_blank(&self.api_key)?,
            project_id: non_blank(&self.project_id)?,
            auth_domain: non_blank(&self.auth_domain)?,
        })
    }

    /// SQLite URL to connect to.
    pub fn resolved_database_url(&self) -> Option<String> {
        if let Some(url) = non_blank(&self.database_url) {
            return Some(url.to_string());
        }
        non_blank(&self.project_id).map(|project| format!("sqlite:{}.db?mode=rwc", project))
    }

    /// Object storage bucket.
    pub fn resolved_storage_bucket(&self) -> Option<String> {
        if let Some(bucket) = non_blank(&self.storage_bucket) {
            return Some(bucket.to_string());
        }
        non_blank(&self.project_id).map(|project| format!("{}.appspot.com", project))
    }

    /// Public base URL that object links resolve against.
    pub fn resolved_storage_public_url(&self) -> Option<String> {
        if let Some(url) = non_blank(&self.storage_public_url) {
            return Some(url.to_string());
        }
        let domain = non_blank(&self.auth_domain)?;
        let bucket = self.resolved_storage_bucket()?;
        Some(format!("https://{}/v0/b/{}/o", domain, bucket))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn is_blank(value: &Option<String>) -> bool {
    non_blank(value).is_none()
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("auth_domain", &self.auth_domain)
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .field("database_url", &self.database_url)
            .field("storage_public_url", &self.storage_public_url)
            .finish()
    }
}
