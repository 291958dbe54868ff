use duet_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("not signed in")]
    Unauthenticated,

    #[error("no couple to chat in")]
    NotConnected,

    #[error("not a member of this couple")]
    NotAMember,

    #[error("message text is empty")]
    EmptyMessage,

    #[error("chat store operation failed")]
    Store(#[source] StoreError),
}

impl ChatError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::NotConnected => "NOT_CONNECTED",
            Self::NotAMember => "NOT_A_MEMBER",
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::Store(_) => "STORE",
        }
    }
}
