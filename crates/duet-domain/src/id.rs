//! Newtype wrappers for domain identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity-provider uid for a signed-in user.
///
/// The identity provider owns the format; this core only compares and
/// concatenates uids, so the wrapper is a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for UserId {
    fn from(uid: &str) -> Self {
        Self(uid.to_owned())
    }
}

/// Deterministic composite identifier for a couple document.
///
/// Built by sorting the two member uids lexicographically and joining them
/// with `_`, so both members derive the same key no matter who initiates
/// the pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoupleId(String);

impl CoupleId {
    /// Derive the couple key for an unordered pair of uids.
    pub fn from_pair(a: &UserId, b: &UserId) -> Self {
        if a <= b {
            Self(format!("{}_{}", a.0, b.0))
        } else {
            Self(format!("{}_{}", b.0, a.0))
        }
    }

    /// Wrap an already-derived key (e.g. a document id read back from the
    /// store).
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoupleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn couple_key_is_commutative() {
        let u1 = UserId::from("alpha");
        let u2 = UserId::from("zulu");
        assert_eq!(CoupleId::from_pair(&u1, &u2), CoupleId::from_pair(&u2, &u1));
    }

    #[test]
    fn couple_key_sorts_members_lexicographically() {
        let u1 = UserId::from("zulu");
        let u2 = UserId::from("alpha");
        assert_eq!(CoupleId::from_pair(&u1, &u2).as_str(), "alpha_zulu");
    }

    #[test]
    fn couple_key_for_uppercase_uids() {
        // Matches the end-to-end scenario: U1 < U2 ⇒ "U1_U2".
        let u1 = UserId::from("U1");
        let u2 = UserId::from("U2");
        assert_eq!(CoupleId::from_pair(&u2, &u1).as_str(), "U1_U2");
    }

    #[test]
    fn user_id_serializes_as_plain_string() {
        let uid = UserId::from("abc123");
        assert_eq!(serde_json::to_string(&uid).unwrap(), "\"abc123\"");
    }
}
