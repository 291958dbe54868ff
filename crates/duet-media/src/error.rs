/// Media host error variants.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The host answered but without a `secure_url`; carries the server's
    /// error message when it sent one.
    #[error("upload rejected: {0}")]
    UploadRejected(String),
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}

impl MediaError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UploadRejected(_) => "UPLOAD_REJECTED",
            Self::Transport(_) => "TRANSPORT",
        }
    }
}
