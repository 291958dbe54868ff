use duet_media::MediaError;
use duet_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("failed to upload profile photo")]
    PhotoUpload(#[source] MediaError),

    #[error("profile store operation failed")]
    Store(#[source] StoreError),
}

impl ProfileError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::PhotoUpload(_) => "PHOTO_UPLOAD",
            Self::Store(_) => "STORE",
        }
    }
}
