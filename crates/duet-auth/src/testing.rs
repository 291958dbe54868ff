//! Fixed-identity provider for tests.

use std::sync::Arc;

use tokio::sync::watch;

use duet_domain::UserId;

use crate::error::AuthError;
use crate::provider::{AuthUser, IdentityProvider};

/// Identity provider that always reports the same signed-in user until
/// [`IdentityProvider::sign_out`] is called. Sign-in calls re-establish it.
#[derive(Clone)]
pub struct StaticIdentity {
    user: AuthUser,
    state: Arc<watch::Sender<Option<AuthUser>>>,
}

impl StaticIdentity {
    pub fn signed_in(uid: impl Into<String>) -> Self {
        let user = AuthUser {
            uid: UserId::new(uid),
            email: None,
            display_name: None,
            photo_url: None,
        };
        let (state, _) = watch::channel(Some(user.clone()));
        Self {
            user,
            state: Arc::new(state),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    async fn sign_in_with_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<AuthUser, AuthError> {
        let _ = self.state.send(Some(self.user.clone()));
        Ok(self.user.clone())
    }

    async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        self.sign_in_with_password(email, password).await
    }

    async fn sign_in_with_credential(
        &self,
        _provider_id: &str,
        _id_token: &str,
    ) -> Result<AuthUser, AuthError> {
        let _ = self.state.send(Some(self.user.clone()));
        Ok(self.user.clone())
    }

    async fn update_profile(
        &self,
        _display_name: Option<&str>,
        _photo_url: Option<&str>,
    ) -> Result<(), AuthError> {
        if self.current_user().is_none() {
            return Err(AuthError::NotSignedIn);
        }
        Ok(())
    }

    async fn sign_out(&self) {
        let _ = self.state.send(None);
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().clone()
    }

    fn watch_auth_state(&self) -> watch::Receiver<Option<AuthUser>> {
        self.state.subscribe()
    }
}
