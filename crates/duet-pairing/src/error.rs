use duet_store::StoreError;

/// Pairing failure taxonomy surfaced to the caller.
///
/// Every failure is converted to a user-facing notice at the call boundary;
/// none are retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum PairingError {
    #[error("not signed in")]
    Unauthenticated,
    #[error("invalid or expired code")]
    InvalidCode,
    #[error("code has no timestamp")]
    CorruptCode,
    #[error("code has expired")]
    CodeExpired,
    #[error("you can't connect with yourself")]
    SelfConnection,
    #[error("you are already connected with this user")]
    AlreadyConnected,
    #[error("code generation failed")]
    GenerationFailed(#[source] StoreError),
    #[error("redemption failed")]
    RedemptionFailed(#[source] StoreError),
    #[error("store unavailable")]
    StoreUnavailable(#[source] StoreError),
}

impl PairingError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidCode => "INVALID_CODE",
            Self::CorruptCode => "CORRUPT_CODE",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::SelfConnection => "SELF_CONNECTION",
            Self::AlreadyConnected => "ALREADY_CONNECTED",
            Self::GenerationFailed(_) => "GENERATION_FAILED",
            Self::RedemptionFailed(_) => "REDEMPTION_FAILED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }
}
