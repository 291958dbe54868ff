//! Couple-scoped messaging over the `couples/{id}/messages` subcollection.

mod error;
mod message;
mod service;

pub use crate::error::ChatError;
pub use crate::message::{ChatMessage, MessageDraft};
pub use crate::service::{ChatService, MessageStream};
