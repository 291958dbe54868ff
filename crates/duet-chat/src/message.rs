//! Message document shape and drafts.

use chrono::{DateTime, Utc};

use duet_domain::UserId;
use duet_store::{Document, Fields, Value};

/// A message as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: UserId,
    pub sender_name: String,
    pub sender_avatar: String,
    pub text: String,
    /// `None` only for the brief window before the server stamp resolves.
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub(crate) fn from_doc(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            sender_id: UserId::from(doc.text("senderId").unwrap_or_default()),
            sender_name: doc.text("senderName").unwrap_or_default().to_owned(),
            sender_avatar: doc.text("senderAvatar").unwrap_or_default().to_owned(),
            text: doc.text("text").unwrap_or_default().to_owned(),
            created_at: doc.timestamp("createdAt"),
        }
    }
}

/// Outgoing message contents; sender display data is denormalized into the
/// document so the timeline renders without profile lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageDraft {
    pub text: String,
    pub sender_name: String,
    pub sender_avatar: String,
}

pub(crate) fn message_fields(sender: &UserId, draft: &MessageDraft, text: &str) -> Fields {
    Fields::from([
        ("text".to_owned(), Value::text(text)),
        ("senderId".to_owned(), Value::text(sender.as_str())),
        ("senderName".to_owned(), Value::text(draft.sender_name.as_str())),
        (
            "senderAvatar".to_owned(),
            Value::text(draft.sender_avatar.as_str()),
        ),
        ("createdAt".to_owned(), Value::ServerTimestamp),
    ])
}
