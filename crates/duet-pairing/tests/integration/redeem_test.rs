use duet_pairing::{PairingError, PairingService};
use duet_store::{DocumentStore, MemoryStore, Query};

use crate::helpers::{
    CONNECTION_CODES, COUPLES, USERS, seed_code, seed_profile, service, uid,
};

#[tokio::test]
async fn should_fail_without_a_signed_in_requester() {
    let store = MemoryStore::new();
    seed_code(&store, "AB12CD", "u1", 0).await;

    let result = service(&store).redeem_code(None, "AB12CD").await;

    assert!(matches!(result, Err(PairingError::Unauthenticated)));
}

#[tokio::test]
async fn should_reject_an_unknown_code() {
    let store = MemoryStore::new();

    let result = service(&store).redeem_code(Some(&uid("u2")), "NOPE99").await;

    assert!(matches!(result, Err(PairingError::InvalidCode)));
}

#[tokio::test]
async fn should_reject_a_blank_code() {
    let store = MemoryStore::new();

    let result = service(&store).redeem_code(Some(&uid("u2")), "   ").await;

    assert!(matches!(result, Err(PairingError::InvalidCode)));
}

#[tokio::test]
async fn should_link_both_users_from_a_messy_input() {
    let store = MemoryStore::new();
    seed_code(&store, "AB12CD", "U1", 10).await;
    seed_profile(&store, "U1").await;
    seed_profile(&store, "U2").await;

    let redemption = service(&store)
        .redeem_code(Some(&uid("U2")), " ab12cd ")
        .await
        .unwrap();

    assert_eq!(redemption.couple_id.as_str(), "U1_U2");
    assert_eq!(redemption.couple.user_a.as_str(), "U1");
    assert_eq!(redemption.couple.user_b.as_str(), "U2");
    assert_eq!(redemption.couple.connection_code, "AB12CD");
    assert_eq!(redemption.couple.distance, 0.0);
    assert_eq!(redemption.couple.total_days_together, 0);

    let couple_doc = store
        .get(COUPLES, "U1_U2")
        .await
        .unwrap()
        .expect("couple document should exist");
    assert!(couple_doc.timestamp("createdAt").is_some());
    assert!(couple_doc.timestamp("anniversaryDate").is_some());

    let code_doc = store
        .get(CONNECTION_CODES, "AB12CD")
        .await
        .unwrap()
        .expect("redeemed code should stay in place");
    assert_eq!(code_doc.text("coupleId"), Some("U1_U2"));

    for user in ["U1", "U2"] {
        let profile = store.get(USERS, user).await.unwrap().unwrap();
        assert_eq!(profile.text("coupleId"), Some("U1_U2"), "back-ref for {user}");
    }
}

#[tokio::test]
async fn should_succeed_when_profile_documents_are_missing() {
    let store = MemoryStore::new();
    seed_code(&store, "AB12CD", "u1", 0).await;

    let redemption = service(&store)
        .redeem_code(Some(&uid("u2")), "AB12CD")
        .await
        .unwrap();

    assert_eq!(redemption.couple_id.as_str(), "u1_u2");
    assert!(store.get(USERS, "u1").await.unwrap().is_none());
}

#[tokio::test]
async fn should_expire_codes_past_the_validity_window() {
    let store = MemoryStore::new();
    seed_code(&store, "AB12CD", "u1", 61).await;

    let result = service(&store).redeem_code(Some(&uid("u2")), "AB12CD").await;

    assert!(matches!(result, Err(PairingError::CodeExpired)));
    assert!(
        store.get(CONNECTION_CODES, "AB12CD").await.unwrap().is_none(),
        "expired code should be deleted on contact"
    );
}

#[tokio::test]
async fn should_discard_a_code_without_a_timestamp() {
    let store = MemoryStore::new();
    store
        .set(
            CONNECTION_CODES,
            "AB12CD",
            crate::helpers::fields(&[
                ("code", duet_store::Value::text("AB12CD")),
                ("createdBy", duet_store::Value::text("u1")),
            ]),
        )
        .await
        .unwrap();

    let result = service(&store).redeem_code(Some(&uid("u2")), "AB12CD").await;

    assert!(matches!(result, Err(PairingError::CorruptCode)));
    assert!(store.get(CONNECTION_CODES, "AB12CD").await.unwrap().is_none());
}

#[tokio::test]
async fn should_reject_self_connection_without_writing() {
    let store = MemoryStore::new();
    seed_code(&store, "AB12CD", "u1", 0).await;

    let result = service(&store).redeem_code(Some(&uid("u1")), "AB12CD").await;

    assert!(matches!(result, Err(PairingError::SelfConnection)));
    assert!(
        store.get(CONNECTION_CODES, "AB12CD").await.unwrap().is_some(),
        "a self-redeemed code stays usable"
    );
    assert!(store.query(&Query::collection(COUPLES)).await.unwrap().is_empty());
}

#[tokio::test]
async fn should_not_mutate_an_existing_couple_on_repeat_redemption() {
    let store = MemoryStore::new();
    seed_code(&store, "FIRST1", "u1", 0).await;
    seed_code(&store, "SECOND", "u2", 0).await;
    let svc = service(&store);

    svc.redeem_code(Some(&uid("u2")), "FIRST1").await.unwrap();
    let before = store.get(COUPLES, "u1_u2").await.unwrap().unwrap();

    let result = svc.redeem_code(Some(&uid("u1")), "SECOND").await;

    assert!(matches!(result, Err(PairingError::AlreadyConnected)));
    let after = store.get(COUPLES, "u1_u2").await.unwrap().unwrap();
    assert_eq!(before.fields, after.fields, "existing couple untouched");
}

#[tokio::test]
async fn should_let_exactly_one_of_two_racing_redemptions_win() {
    let store = MemoryStore::new();
    seed_code(&store, "CODEAA", "u1", 0).await;
    seed_code(&store, "CODEBB", "u2", 0).await;

    let first = PairingService::new(store.clone());
    let second = PairingService::new(store.clone());
    let a = tokio::spawn(async move { first.redeem_code(Some(&uid("u2")), "CODEAA").await });
    let b = tokio::spawn(async move { second.redeem_code(Some(&uid("u1")), "CODEBB").await });
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    let wins = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "a: {a:?}, b: {b:?}");
    let loss = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(loss, PairingError::AlreadyConnected));

    let couples = store.query(&Query::collection(COUPLES)).await.unwrap();
    assert_eq!(couples.len(), 1);
    assert_eq!(couples[0].id, "u1_u2");
}
