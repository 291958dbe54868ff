use chrono::{Duration, Utc};

use duet_domain::UserId;
use duet_pairing::PairingService;
use duet_store::{DocumentStore, Fields, MemoryStore, Value};

pub const CONNECTION_CODES: &str = "connectionCodes";
pub const COUPLES: &str = "couples";
pub const USERS: &str = "users";

pub fn uid(s: &str) -> UserId {
    UserId::from(s)
}

pub fn service(store: &MemoryStore) -> PairingService<MemoryStore> {
    PairingService::new(store.clone())
}

pub fn fields(pairs: &[(&str, Value)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

/// Seed a code document whose `createdAt` lies `age_minutes` in the past.
pub async fn seed_code(store: &MemoryStore, code: &str, created_by: &str, age_minutes: i64) {
    let created_at = Utc::now() - Duration::minutes(age_minutes);
    store
        .set(
            CONNECTION_CODES,
            code,
            fields(&[
                ("code", Value::text(code)),
                ("createdBy", Value::text(created_by)),
                ("createdAt", Value::Timestamp(created_at)),
                ("coupleId", Value::Null),
            ]),
        )
        .await
        .unwrap();
}

/// Seed a minimal profile document so back-reference patches have a target.
pub async fn seed_profile(store: &MemoryStore, user: &str) {
    store
        .set(
            USERS,
            user,
            fields(&[
                ("displayName", Value::text(user)),
                ("email", Value::text(format!("{user}@example.com"))),
            ]),
        )
        .await
        .unwrap();
}
