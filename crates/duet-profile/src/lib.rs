//! Per-user profile documents: load, edit, and avatar management.

mod error;
mod service;

pub use crate::error::ProfileError;
pub use crate::service::{ProfileDraft, ProfileService};
