//! Identity provider client for the Firebase Identity Toolkit REST API.

use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use serde::Deserialize;
use serde_json::{Value as Json, json};
use tokio::sync::watch;
use tracing::info;

use duet_core::config::Config;
use duet_domain::UserId;

use crate::error::AuthError;
use crate::provider::{AuthUser, IdentityProvider};

/// Settings loaded from `FIREBASE_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseAuthConfig {
    /// Web API key of the Firebase project.
    pub api_key: String,
}

impl Config for FirebaseAuthConfig {}

impl FirebaseAuthConfig {
    pub fn load() -> Self {
        Self::from_env_prefixed("FIREBASE_")
    }
}

/// A signed-in session: the identity plus the provider-issued tokens.
#[derive(Debug, Clone)]
struct Session {
    user: AuthUser,
    id_token: String,
}

#[derive(Clone)]
pub struct FirebaseAuth {
    http: reqwest::Client,
    config: FirebaseAuthConfig,
    session: Arc<Mutex<Option<Session>>>,
    state: Arc<watch::Sender<Option<AuthUser>>>,
}

impl FirebaseAuth {
    pub fn new(config: FirebaseAuthConfig) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            http: reqwest::Client::new(),
            config,
            session: Arc::new(Mutex::new(None)),
            state: Arc::new(state),
        }
    }

    /// The current session's id token, used as the store bearer credential.
    pub fn id_token(&self) -> Option<String> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|s| s.id_token.clone())
    }

    fn endpoint(&self, op: &str) -> String {
        format!(
            "https://identitytoolkit.googleapis.com/v1/accounts:{op}?key={}",
            self.config.api_key
        )
    }

    async fn accounts_call(&self, op: &str, body: Json) -> Result<Json, AuthError> {
        let resp = self
            .http
            .post(self.endpoint(op))
            .json(&body)
            .send()
            .await
            .context("identity provider request")?;
        if !resp.status().is_success() {
            let body: Json = resp.json().await.unwrap_or(Json::Null);
            let code = body["error"]["message"].as_str().unwrap_or("UNKNOWN");
            return Err(AuthError::from_provider_code(code));
        }
        Ok(resp
            .json()
            .await
            .context("identity provider response body")?)
    }

    fn store_session(&self, body: &Json) -> Result<AuthUser, AuthError> {
        let uid = body["localId"]
            .as_str()
            .ok_or_else(|| AuthError::Provider("response without localId".to_owned()))?;
        let user = AuthUser {
            uid: UserId::from(uid),
            email: body["email"].as_str().map(str::to_owned),
            display_name: body["displayName"].as_str().map(str::to_owned),
            photo_url: body["photoUrl"].as_str().map(str::to_owned),
        };
        let id_token = body["idToken"].as_str().unwrap_or_default().to_owned();
        *self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Session {
            user: user.clone(),
            id_token,
        });
        let _ = self.state.send(Some(user.clone()));
        info!(uid = %user.uid, "signed in");
        Ok(user)
    }
}

impl IdentityProvider for FirebaseAuth {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        let body = self
            .accounts_call(
                "signInWithPassword",
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        self.store_session(&body)
    }

    async fn sign_up_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        let body = self
            .accounts_call(
                "signUp",
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        self.store_session(&body)
    }

    async fn sign_in_with_credential(
        &self,
        provider_id: &str,
        id_token: &str,
    ) -> Result<AuthUser, AuthError> {
        let body = self
            .accounts_call(
                "signInWithIdp",
                json!({
                    "postBody": format!("id_token={id_token}&providerId={provider_id}"),
                    "requestUri": "http://localhost",
                    "returnSecureToken": true,
                }),
            )
            .await?;
        self.store_session(&body)
    }

    async fn update_profile(
        &self,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<(), AuthError> {
        let id_token = self.id_token().ok_or(AuthError::NotSignedIn)?;
        let mut body = json!({ "idToken": id_token, "returnSecureToken": false });
        if let Some(name) = display_name {
            body["displayName"] = json!(name);
        }
        if let Some(url) = photo_url {
            body["photoUrl"] = json!(url);
        }
        let resp = self.accounts_call("update", body).await?;
        // Keep the cached identity in sync with what the provider stored.
        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(session) = session.as_mut() {
            if let Some(name) = resp["displayName"].as_str() {
                session.user.display_name = Some(name.to_owned());
            }
            if let Some(url) = resp["photoUrl"].as_str() {
                session.user.photo_url = Some(url.to_owned());
            }
            let _ = self.state.send(Some(session.user.clone()));
        }
        Ok(())
    }

    async fn sign_out(&self) {
        *self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        let _ = self.state.send(None);
        info!("signed out");
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|s| s.user.clone())
    }

    fn watch_auth_state(&self) -> watch::Receiver<Option<AuthUser>> {
        self.state.subscribe()
    }
}
