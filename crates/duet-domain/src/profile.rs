//! User profile document shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::CoupleId;

/// Profile document stored per user, keyed by uid.
///
/// This core does not own profiles; the pairing flow only patches the
/// `couple_id` back-reference and the profile screen edits the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub display_name: String,
    pub email: String,
    pub photo_url: String,
    pub bio: String,
    pub location: String,
    pub relationship_status: String,
    /// Back-reference to the couple, set as a side effect of pairing.
    pub couple_id: Option<CoupleId>,
    /// Server-assigned on every save; `None` for never-saved profiles.
    pub updated_at: Option<DateTime<Utc>>,
}
