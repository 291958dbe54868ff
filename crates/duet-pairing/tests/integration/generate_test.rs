use duet_pairing::PairingError;
use duet_store::{DocumentStore, MemoryStore, Query, Value};

use crate::helpers::{CONNECTION_CODES, fields, seed_code, service, uid};

#[tokio::test]
async fn should_fail_without_a_signed_in_requester() {
    let store = MemoryStore::new();
    let result = service(&store).generate_code(None).await;
    assert!(
        matches!(result, Err(PairingError::Unauthenticated)),
        "expected Unauthenticated, got {result:?}"
    );
}

#[tokio::test]
async fn should_persist_a_six_char_uppercase_code() {
    let store = MemoryStore::new();
    let requester = uid("u1");

    let code = service(&store)
        .generate_code(Some(&requester))
        .await
        .unwrap();

    assert_eq!(code.len(), 6);
    assert!(
        code.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
        "code should be uppercase base-36, got {code}"
    );

    let doc = store
        .get(CONNECTION_CODES, &code)
        .await
        .unwrap()
        .expect("code document should exist");
    assert_eq!(doc.text("code"), Some(code.as_str()));
    assert_eq!(doc.text("createdBy"), Some("u1"));
    assert!(doc.timestamp("createdAt").is_some(), "createdAt resolved");
    assert!(doc.get("coupleId").unwrap().is_null(), "unredeemed code");
}

#[tokio::test]
async fn should_sweep_stale_codes_and_keep_fresh_ones() {
    let store = MemoryStore::new();
    seed_code(&store, "OLDAAA", "u2", 61).await;
    seed_code(&store, "OLDBBB", "u3", 120).await;
    seed_code(&store, "FRESH1", "u4", 59).await;

    let code = service(&store).generate_code(Some(&uid("u1"))).await.unwrap();

    assert!(store.get(CONNECTION_CODES, "OLDAAA").await.unwrap().is_none());
    assert!(store.get(CONNECTION_CODES, "OLDBBB").await.unwrap().is_none());
    assert!(store.get(CONNECTION_CODES, "FRESH1").await.unwrap().is_some());

    let remaining = store
        .query(&Query::collection(CONNECTION_CODES))
        .await
        .unwrap();
    let ids: Vec<&str> = remaining.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(remaining.len(), 2, "fresh + new, got {ids:?}");
    assert!(ids.contains(&code.as_str()));
}

#[tokio::test]
async fn should_sweep_codes_without_a_resolvable_timestamp() {
    let store = MemoryStore::new();
    store
        .set(
            CONNECTION_CODES,
            "BROKEN",
            fields(&[("code", Value::text("BROKEN")), ("createdBy", Value::text("u2"))]),
        )
        .await
        .unwrap();

    service(&store).generate_code(Some(&uid("u1"))).await.unwrap();

    assert!(
        store.get(CONNECTION_CODES, "BROKEN").await.unwrap().is_none(),
        "timestampless code should be collected"
    );
}
