//! Pairing document shapes, collection names, and code minting.

use chrono::{DateTime, Duration, Utc};
use rand::RngExt;

use duet_domain::{Couple, CoupleId, UserId};
use duet_store::{Document, Fields, StoreError, Value};

pub const CONNECTION_CODES: &str = "connectionCodes";
pub const COUPLES: &str = "couples";
pub const USERS: &str = "users";

/// Connection code length in characters.
pub const CODE_LEN: usize = 6;

/// Code validity window.
pub const CODE_TTL_MINUTES: i64 = 60;

/// Charset for minted codes (uppercase base-36).
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Bounded retries when a freshly minted code collides with a live one.
pub const MAX_MINT_ATTEMPTS: u32 = 3;

pub fn code_ttl() -> Duration {
    Duration::minutes(CODE_TTL_MINUTES)
}

/// Mint a random 6-character uppercase base-36 code.
pub fn mint_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// Normalize user input: trim surrounding whitespace, uppercase.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// A stored connection code, as read back from the store. Fields that may
/// be absent in a corrupt document stay optional; the service decides what
/// absence means.
#[derive(Debug, Clone)]
pub struct ConnectionCode {
    pub created_by: Option<UserId>,
    pub created_at: Option<DateTime<Utc>>,
    pub couple_id: Option<CoupleId>,
}

impl ConnectionCode {
    pub fn from_doc(doc: &Document) -> Self {
        Self {
            created_by: doc.text("createdBy").map(UserId::from),
            created_at: doc.timestamp("createdAt"),
            couple_id: doc
                .text("coupleId")
                .map(|id| CoupleId::from_raw(id.to_owned())),
        }
    }
}

/// Field map for a freshly minted, unredeemed code document.
pub fn new_code_fields(code: &str, created_by: &UserId) -> Fields {
    Fields::from([
        ("code".to_owned(), Value::text(code)),
        ("createdBy".to_owned(), Value::text(created_by.as_str())),
        ("createdAt".to_owned(), Value::ServerTimestamp),
        ("coupleId".to_owned(), Value::Null),
    ])
}

/// Field map for the couple document created at redemption. The generator
/// is recorded as `userA`, the redeemer as `userB`; the document key alone
/// carries the sorted order.
pub fn new_couple_fields(user_a: &UserId, user_b: &UserId, code: &str) -> Fields {
    Fields::from([
        ("userA".to_owned(), Value::text(user_a.as_str())),
        ("userB".to_owned(), Value::text(user_b.as_str())),
        ("createdAt".to_owned(), Value::ServerTimestamp),
        ("anniversaryDate".to_owned(), Value::ServerTimestamp),
        ("connectionCode".to_owned(), Value::text(code)),
        ("distance".to_owned(), Value::Double(0.0)),
        ("totalDaysTogether".to_owned(), Value::Integer(0)),
    ])
}

/// Parse a couple document; [`StoreError::Corrupt`] when the member or
/// timestamp fields are unusable.
pub fn couple_from_doc(doc: &Document) -> Result<Couple, StoreError> {
    let field = |name: &str| {
        doc.text(name)
            .map(UserId::from)
            .ok_or_else(|| StoreError::Corrupt(format!("couple {} missing {name}", doc.id)))
    };
    let timestamp = |name: &str| {
        doc.timestamp(name)
            .ok_or_else(|| StoreError::Corrupt(format!("couple {} missing {name}", doc.id)))
    };
    Ok(Couple {
        user_a: field("userA")?,
        user_b: field("userB")?,
        created_at: timestamp("createdAt")?,
        anniversary_date: timestamp("anniversaryDate")?,
        connection_code: doc.text("connectionCode").unwrap_or_default().to_owned(),
        distance: doc.get("distance").and_then(Value::as_f64).unwrap_or(0.0),
        total_days_together: doc
            .get("totalDaysTogether")
            .and_then(Value::as_i64)
            .unwrap_or(0),
    })
}
