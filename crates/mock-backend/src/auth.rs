//! Mock authentication - everyone gets in, nobody stays signed in.

use std::time::Duration;

use backend_core::{async_trait, AuthProvider, AuthStateStream, AuthUser, BackendError};
use futures::stream::{self, StreamExt};
use tracing::debug;

/// User id given to every fabricated user.
pub const MOCK_USER_ID: &str = "mock-user-id";

/// Delay before the mock reports its (signed-out) auth state.
pub const MOCK_AUTH_DELAY: Duration = Duration::from_millis(100);

/// An auth provider that fabricates a user for any email/password pair.
///
/// Auth state never changes: watchers see a single "no user" shortly after
/// they start watching, and sign-in does not update [`current_user`].
///
/// [`current_user`]: AuthProvider::current_user
#[derive(Debug, Clone, Default)]
pub struct MockAuth {
    delay: Option<Duration>,
}

impl MockAuth {
    /// Create a mock provider that reports auth state after [`MOCK_AUTH_DELAY`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider with a custom auth-state delay.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }

    fn fabricate(email: &str) -> AuthUser {
        AuthUser {
            uid: MOCK_USER_ID.to_string(),
            email: email.to_string(),
            display_name: Some(AuthUser::local_part(email).to_string()),
            photo_url: None,
        }
    }
}

#[async_trait]
impl AuthProvider for MockAuth {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthUser, BackendError> {
        Ok(Self::fabricate(email))
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<AuthUser, BackendError> {
        Ok(Self::fabricate(email))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        debug!("[mock] user signed out");
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        None
    }

    fn auth_state(&self) -> AuthStateStream {
        let delay = self.delay.unwrap_or(MOCK_AUTH_DELAY);
        let once = stream::once(async move {
            tokio::time::sleep(delay).await;
            None
        });
        Box::pin(once.chain(stream::pending()))
    }

    fn name(&self) -> &str {
        "MockAuth"
    }
}
