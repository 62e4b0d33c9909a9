//! Authenticated user records.

use serde::{Deserialize, Serialize};

/// A signed-in user as reported by an [`AuthProvider`](crate::AuthProvider).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// Stable user id; owner key for every per-user document.
    pub uid: String,
    /// Sign-in email.
    pub email: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Avatar URL.
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl AuthUser {
    /// The part of an email address before `@`, used as a default display name.
    pub fn local_part(email: &str) -> &str {
        email.split('@').next().unwrap_or(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_part() {
        assert_eq!(AuthUser::local_part("jane@example.com"), "jane");
        assert_eq!(AuthUser::local_part("no-at-sign"), "no-at-sign");
        assert_eq!(AuthUser::local_part("@example.com"), "");
    }
}
