#![allow(async_fn_in_trait)]

use tokio::sync::watch;

use duet_domain::UserId;

use crate::error::AuthError;

/// The signed-in actor as reported by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub uid: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Boundary to the external identity provider.
///
/// This core never issues identities; it trusts the provider's uid as the
/// actor's identity. Sign-in state is held by the implementation and
/// observable via [`IdentityProvider::watch_auth_state`].
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError>;

    async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError>;

    /// Sign in with a federated credential (e.g. a Google id token).
    async fn sign_in_with_credential(
        &self,
        provider_id: &str,
        id_token: &str,
    ) -> Result<AuthUser, AuthError>;

    /// Update display name / photo on the provider-side profile of the
    /// signed-in user. [`AuthError::NotSignedIn`] when nobody is.
    async fn update_profile(
        &self,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<(), AuthError>;

    async fn sign_out(&self);

    /// The current identity, if signed in.
    fn current_user(&self) -> Option<AuthUser>;

    /// Subscribe to identity-change notifications. The receiver always holds
    /// the latest state; `changed().await` wakes on every transition.
    fn watch_auth_state(&self) -> watch::Receiver<Option<AuthUser>>;
}
