//! The persisted record representing two linked identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Couple document, keyed in the store by the composite [`CoupleId`].
///
/// `user_a` is always the identity that generated the connection code and
/// `user_b` the one that redeemed it; the key alone carries the sorted
/// order. Created exactly once at redemption and never deleted by this
/// core.
///
/// [`CoupleId`]: crate::id::CoupleId
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Couple {
    pub user_a: UserId,
    pub user_b: UserId,
    pub created_at: DateTime<Utc>,
    pub anniversary_date: DateTime<Utc>,
    /// The connection code that produced this pairing (audit trail).
    pub connection_code: String,
    /// Owned by the distance feature; zeroed at creation.
    pub distance: f64,
    /// Owned by the day-counter feature; zeroed at creation.
    pub total_days_together: i64,
}

impl Couple {
    /// Whether the given uid is one of the two members.
    pub fn has_member(&self, uid: &UserId) -> bool {
        &self.user_a == uid || &self.user_b == uid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Couple {
        Couple {
            user_a: UserId::from("u1"),
            user_b: UserId::from("u2"),
            created_at: Utc::now(),
            anniversary_date: Utc::now(),
            connection_code: "AB12CD".to_owned(),
            distance: 0.0,
            total_days_together: 0,
        }
    }

    #[test]
    fn membership_covers_both_sides() {
        let couple = sample();
        assert!(couple.has_member(&UserId::from("u1")));
        assert!(couple.has_member(&UserId::from("u2")));
        assert!(!couple.has_member(&UserId::from("u3")));
    }
}
