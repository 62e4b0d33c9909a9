//! User profiles.

use crate::backend::Backend;
use crate::documents;
use crate::error::Result;
use crate::models::{EntityKind, UserProfile, UserProfileUpdate};

/// Profile stored under the user's id, if any.
pub async fn get_user_profile(backend: &Backend, user_id: &str) -> Result<Option<UserProfile>> {
    documents::get_one(backend, user_id).await
}

/// Merge `update` into the user's profile, creating it if absent.
pub async fn update_user_profile(
    backend: &Backend,
    user_id: &str,
    update: &UserProfileUpdate,
) -> Result<()> {
    documents::update(backend, EntityKind::UserProfile, user_id, update).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sqlite_backend;

    #[tokio::test]
    async fn test_profile_upsert_and_merge() {
        let (backend, _db) = sqlite_backend().await;
        assert!(get_user_profile(&backend, "u1").await.unwrap().is_none());

        update_user_profile(
            &backend,
            "u1",
            &UserProfileUpdate {
                display_name: Some("Jane".to_string()),
                farm_name: Some("Green Acres".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let first = get_user_profile(&backend, "u1").await.unwrap().unwrap();
        assert_eq!(first.id, "u1");
        assert_eq!(first.farm_name.as_deref(), Some("Green Acres"));

        update_user_profile(
            &backend,
            "u1",
            &UserProfileUpdate {
                phone: Some("+91 98765 43210".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let second = get_user_profile(&backend, "u1").await.unwrap().unwrap();
        assert_eq!(second.display_name.as_deref(), Some("Jane"));
        assert_eq!(second.farm_name.as_deref(), Some("Green Acres"));
        assert_eq!(second.phone.as_deref(), Some("+91 98765 43210"));
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn test_mock_profile_is_always_absent() {
        let backend = Backend::mock();
        update_user_profile(
            &backend,
            "u1",
            &UserProfileUpdate {
                farm_name: Some("Green Acres".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(get_user_profile(&backend, "u1").await.unwrap().is_none());
    }
}
