//! Signed-in user tracking.

use std::sync::atomic::Ordering;

use backend_core::AuthUser;
use futures::StreamExt;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::backend::Backend;
use crate::error::Result;
use crate::models::UserProfile;
use crate::subscription::Subscription;
use crate::users;

/// What the dashboard knows about the current user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub profile: Option<UserProfile>,
    /// True until the first auth state arrives.
    pub loading: bool,
}

/// Follows the backend's auth state for as long as it lives.
///
/// The profile is the stored [`UserProfile`] when there is one, otherwise a
/// basic profile built from the auth user.
pub struct AuthSession {
    backend: Backend,
    state: watch::Receiver<SessionState>,
    listener: Subscription,
}

impl AuthSession {
    /// Start following auth state. Must be called inside a Tokio runtime.
    pub fn start(backend: &Backend) -> Self {
        let (tx, rx) = watch::channel(SessionState {
            loading: true,
            ..Default::default()
        });
        let mut states = backend.auth().auth_state();
        let lookup = backend.clone();

        let listener = Subscription::spawn(move |active| async move {
            while let Some(user) = states.next().await {
                if !active.load(Ordering::SeqCst) {
                    return;
                }
                info!(
                    "Auth state changed: {}",
                    user.as_ref().map(|u| u.uid.as_str()).unwrap_or("no user")
                );
                let profile = match &user {
                    Some(user) => Some(load_profile(&lookup, user).await),
                    None => None,
                };
                tx.send_replace(SessionState {
                    user,
                    profile,
                    loading: false,
                });
            }
        });

        Self {
            backend: backend.clone(),
            state: rx,
            listener,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// A receiver notified on every state change.
    pub fn changes(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait for the first auth state and return the state at that point.
    pub async fn wait_until_loaded(&self) -> SessionState {
        let mut changes = self.state.clone();
        if let Ok(state) = changes.wait_for(|s| !s.loading).await {
            return (*state).clone();
        }
        self.state()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        Ok(self.backend.auth().sign_in(email, password).await?)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        Ok(self.backend.auth().sign_up(email, password).await?)
    }

    /// Sign out. Failures are logged, not returned.
    pub async fn logout(&self) {
        if let Err(e) = self.backend.auth().sign_out().await {
            error!("Error signing out: {}", e);
        }
    }

    /// Stop following auth state.
    pub fn close(&self) {
        self.listener.unsubscribe();
    }
}

impl Drop for AuthSession {
    fn drop(&mut self) {
        self.listener.unsubscribe();
    }
}

async fn load_profile(backend: &Backend, user: &AuthUser) -> UserProfile {
    match users::get_user_profile(backend, &user.uid).await {
        Ok(Some(profile)) => profile,
        Ok(None) => UserProfile::from_auth(user),
        Err(e) => {
            warn!("Could not load profile for {}: {}", user.uid, e);
            UserProfile::from_auth(user)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfileUpdate;
    use crate::test_support::sqlite_backend;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn wait_for<F>(session: &AuthSession, predicate: F) -> SessionState
    where
        F: Fn(&SessionState) -> bool,
    {
        let mut changes = session.changes();
        let state = timeout(Duration::from_secs(5), changes.wait_for(|s| predicate(s)))
            .await
            .unwrap()
            .unwrap();
        (*state).clone()
    }

    #[tokio::test]
    async fn test_mock_session_loads_signed_out() {
        let session = AuthSession::start(&Backend::mock());
        assert!(session.state().loading);

        let state = session.wait_until_loaded().await;
        assert!(!state.loading);
        assert!(state.user.is_none());
        assert!(state.profile.is_none());

        // Mock sign-in does not change auth state.
        let user = session.sign_in("jane@example.com", "secret").await.unwrap();
        assert_eq!(user.display_name.as_deref(), Some("jane"));
        assert!(session.state().user.is_none());
        session.logout().await;
    }

    #[tokio::test]
    async fn test_session_follows_sign_in_and_out() {
        let (backend, _db) = sqlite_backend().await;
        let session = AuthSession::start(&backend);
        assert!(session.wait_until_loaded().await.user.is_none());

        let user = session.sign_up("jane@example.com", "hunter22").await.unwrap();
        let state = wait_for(&session, |s| s.user.is_some()).await;
        assert_eq!(state.user.as_ref(), Some(&user));
        let profile = state.profile.unwrap();
        assert_eq!(profile.id, user.uid);
        assert_eq!(profile.display_name.as_deref(), Some("jane"));
        assert!(profile.farm_name.is_none());

        session.logout().await;
        let state = wait_for(&session, |s| s.user.is_none()).await;
        assert!(state.profile.is_none());
    }

    #[tokio::test]
    async fn test_session_uses_stored_profile() {
        let (backend, _db) = sqlite_backend().await;
        let user = backend
            .auth()
            .sign_up("ravi@example.com", "hunter22")
            .await
            .unwrap();
        backend.auth().sign_out().await.unwrap();
        users::update_user_profile(
            &backend,
            &user.uid,
            &UserProfileUpdate {
                farm_name: Some("Sunrise Farm".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let session = AuthSession::start(&backend);
        session.wait_until_loaded().await;
        session.sign_in("ravi@example.com", "hunter22").await.unwrap();

        let state = wait_for(&session, |s| s.user.is_some()).await;
        assert_eq!(
            state.profile.and_then(|p| p.farm_name).as_deref(),
            Some("Sunrise Farm")
        );
    }

    #[tokio::test]
    async fn test_close_stops_updates() {
        let (backend, _db) = sqlite_backend().await;
        let session = AuthSession::start(&backend);
        session.wait_until_loaded().await;
        session.close();

        backend
            .auth()
            .sign_up("late@example.com", "hunter22")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(session.state().user.is_none());
    }
}
