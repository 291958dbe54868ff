/// Identity provider error variants.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already in use")]
    EmailInUse,
    #[error("weak password: {0}")]
    WeakPassword(String),
    #[error("not signed in")]
    NotSignedIn,
    #[error("identity provider rejected the request: {0}")]
    Provider(String),
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::EmailInUse => "EMAIL_IN_USE",
            Self::WeakPassword(_) => "WEAK_PASSWORD",
            Self::NotSignedIn => "NOT_SIGNED_IN",
            Self::Provider(_) => "PROVIDER",
            Self::Transport(_) => "TRANSPORT",
        }
    }

    /// Map the provider's error code (e.g. `EMAIL_NOT_FOUND`) onto the
    /// taxonomy.
    pub fn from_provider_code(code: &str) -> Self {
        match code {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "USER_DISABLED" | "INVALID_IDP_RESPONSE" => Self::InvalidCredentials,
            "EMAIL_EXISTS" => Self::EmailInUse,
            weak if weak.starts_with("WEAK_PASSWORD") => Self::WeakPassword(code.to_owned()),
            other => Self::Provider(other.to_owned()),
        }
    }
}
