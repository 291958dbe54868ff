use duet_pairing::PairingError;
use duet_store::MemoryStore;

use crate::helpers::{seed_code, service, uid};

#[tokio::test]
async fn should_fail_without_a_signed_in_requester() {
    let store = MemoryStore::new();

    let result = service(&store).watch_own_couple(None).await;

    assert!(matches!(result, Err(PairingError::Unauthenticated)));
}

#[tokio::test]
async fn should_report_absence_then_the_new_couple() {
    let store = MemoryStore::new();
    let svc = service(&store);
    let watcher = uid("u1");

    let mut watch = svc.watch_own_couple(Some(&watcher)).await.unwrap();
    assert_eq!(watch.next().await.unwrap(), None, "initial state is unpaired");

    seed_code(&store, "AB12CD", "u1", 0).await;
    svc.redeem_code(Some(&uid("u2")), "AB12CD").await.unwrap();

    let (couple_id, couple) = watch
        .next()
        .await
        .expect("watch still live")
        .expect("couple appears after redemption");
    assert_eq!(couple_id.as_str(), "u1_u2");
    assert!(couple.has_member(&watcher));
    assert!(couple.has_member(&uid("u2")));
}

#[tokio::test]
async fn should_see_the_couple_from_the_redeemer_side() {
    let store = MemoryStore::new();
    let svc = service(&store);
    seed_code(&store, "AB12CD", "u1", 0).await;
    svc.redeem_code(Some(&uid("u2")), "AB12CD").await.unwrap();

    let mut watch = svc.watch_own_couple(Some(&uid("u2"))).await.unwrap();

    let state = watch.next().await.unwrap();
    let (couple_id, _) = state.expect("existing couple visible immediately");
    assert_eq!(couple_id.as_str(), "u1_u2");
}

#[tokio::test]
async fn should_never_report_absence_to_an_already_paired_watcher() {
    let store = MemoryStore::new();
    let svc = service(&store);
    seed_code(&store, "AB12CD", "u1", 0).await;
    svc.redeem_code(Some(&uid("u2")), "AB12CD").await.unwrap();

    // The merge must not emit before both sides have reported, whichever
    // side's initial snapshot lands first.
    for _ in 0..50 {
        let mut watch = svc.watch_own_couple(Some(&uid("u2"))).await.unwrap();
        let first = watch.next().await.unwrap();
        assert!(first.is_some(), "paired watcher saw a spurious absence");
        watch.stop();
    }
}

#[tokio::test]
async fn should_be_restartable_after_stop() {
    let store = MemoryStore::new();
    let svc = service(&store);
    seed_code(&store, "AB12CD", "u1", 0).await;
    svc.redeem_code(Some(&uid("u2")), "AB12CD").await.unwrap();

    let mut first = svc.watch_own_couple(Some(&uid("u1"))).await.unwrap();
    assert!(first.next().await.unwrap().is_some());
    first.stop();

    let mut second = svc.watch_own_couple(Some(&uid("u1"))).await.unwrap();
    let state = second.next().await.unwrap();
    assert!(state.is_some(), "fresh watch re-reports current state");
}
