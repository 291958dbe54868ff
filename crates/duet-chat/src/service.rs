//! Sending and streaming messages within a couple.

use tracing::info;
use uuid::Uuid;

use duet_domain::{CoupleId, UserId};
use duet_store::{Direction, DocumentStore, Query, Subscription, Value};

use crate::error::ChatError;
use crate::message::{ChatMessage, MessageDraft, message_fields};

const COUPLES: &str = "couples";

pub struct ChatService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ChatService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve the requester's couple key, creator side first.
    pub async fn find_couple_id(
        &self,
        requester: Option<&UserId>,
    ) -> Result<Option<CoupleId>, ChatError> {
        let requester = require_signed_in(requester)?;
        for side in ["userA", "userB"] {
            let hits = self
                .store
                .query(
                    &Query::collection(COUPLES)
                        .where_eq(side, Value::text(requester.as_str()))
                        .limit(1),
                )
                .await
                .map_err(ChatError::Store)?;
            if let Some(doc) = hits.first() {
                return Ok(Some(CoupleId::from_raw(doc.id.clone())));
            }
        }
        Ok(None)
    }

    /// Append a message to the couple's timeline.
    pub async fn send(
        &self,
        requester: Option<&UserId>,
        couple_id: &CoupleId,
        draft: &MessageDraft,
    ) -> Result<ChatMessage, ChatError> {
        let requester = require_signed_in(requester)?;
        self.authorize(requester, couple_id).await?;

        let text = draft.text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let message_id = Uuid::new_v4().to_string();
        let stored = self
            .store
            .create(
                &messages_path(couple_id),
                &message_id,
                message_fields(requester, draft, text),
            )
            .await
            .map_err(ChatError::Store)?;
        info!(couple_id = %couple_id, message_id, "message sent");
        Ok(ChatMessage::from_doc(&stored))
    }

    /// Live timeline, newest first. Membership is checked once at
    /// subscription time.
    pub async fn watch(
        &self,
        requester: Option<&UserId>,
        couple_id: &CoupleId,
    ) -> Result<MessageStream, ChatError> {
        let requester = require_signed_in(requester)?;
        self.authorize(requester, couple_id).await?;

        let sub = self
            .store
            .watch(
                &Query::collection(messages_path(couple_id))
                    .order_by("createdAt", Direction::Descending),
            )
            .await
            .map_err(ChatError::Store)?;
        Ok(MessageStream { sub })
    }

    async fn authorize(&self, requester: &UserId, couple_id: &CoupleId) -> Result<(), ChatError> {
        let doc = self
            .store
            .get(COUPLES, couple_id.as_str())
            .await
            .map_err(ChatError::Store)?
            .ok_or(ChatError::NotConnected)?;
        let is_member = [doc.text("userA"), doc.text("userB")]
            .contains(&Some(requester.as_str()));
        if is_member {
            Ok(())
        } else {
            Err(ChatError::NotAMember)
        }
    }
}

/// Live message snapshots; each item is the full ordered timeline.
pub struct MessageStream {
    sub: Subscription,
}

impl MessageStream {
    /// Next snapshot, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Vec<ChatMessage>> {
        self.sub
            .next()
            .await
            .map(|docs| docs.iter().map(ChatMessage::from_doc).collect())
    }

    pub fn stop(self) {
        self.sub.stop();
    }
}

fn messages_path(couple_id: &CoupleId) -> String {
    format!("{COUPLES}/{}/messages", couple_id.as_str())
}

fn require_signed_in(requester: Option<&UserId>) -> Result<&UserId, ChatError> {
    match requester {
        Some(uid) if !uid.is_empty() => Ok(uid),
        _ => Err(ChatError::Unauthenticated),
    }
}
