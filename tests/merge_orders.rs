mod support;

use std::sync::Arc;

use market_mirror_engine::{
    db_types::OrderStatus,
    MergeDecision,
    MergeOutcome,
    MirrorApiError,
    MirrorError,
    OrderMirrorApi,
    SqliteDatabase,
};
use support::{attachment, line_item, locker, money, prepare_test_env, snapshot, ts};

async fn api_with_vendor() -> (OrderMirrorApi<SqliteDatabase>, market_mirror_engine::db_types::Vendor) {
    let db = prepare_test_env().await;
    let api = OrderMirrorApi::new(db);
    let vendor = api.fetch_or_create_vendor("acme", false, "acme-main").await.unwrap();
    (api, vendor)
}

#[tokio::test]
async fn registering_a_vendor_twice_returns_the_same_row() {
    let (api, vendor) = api_with_vendor().await;
    let again = api.fetch_or_create_vendor("acme", true, "other-account").await.unwrap();
    assert_eq!(again.id, vendor.id);
    // the first registration's details win
    assert_eq!(again.account, "acme-main");
    assert!(!again.is_fbe);
}

#[tokio::test]
async fn the_fetch_window_round_trips_by_account() {
    let (api, _vendor) = api_with_vendor().await;
    assert_eq!(api.last_fetch("acme-main").await.unwrap(), None);
    let fetched_at = ts("2024-05-05T00:00:00Z");
    api.update_last_fetch("acme-main", fetched_at).await.unwrap();
    assert_eq!(api.last_fetch("acme-main").await.unwrap(), Some(fetched_at));
    assert_eq!(api.last_fetch("no-such-account").await.unwrap(), None);
}

#[tokio::test]
async fn locker_details_are_mirrored_and_refreshed() {
    let (api, vendor) = api_with_vendor().await;
    let mut snap = snapshot("1000", OrderStatus::New, "2024-05-03T10:00:00Z", vec![line_item(
        1, "PNK-A", 1, 1, 0, "10.00", None,
    )]);
    snap.locker_id = Some("L-9".to_string());
    snap.locker = Some(locker("L-9", "Easybox Central"));
    api.merge_order(&snap, vendor.id).await.unwrap();
    let stored = api.db().fetch_locker("L-9").await.unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("Easybox Central"));
    assert_eq!(stored.locker_delivery_eligible, Some(1));

    let mut renamed = snap.clone();
    renamed.locker = Some(locker("L-9", "Easybox Gara"));
    api.merge_order(&renamed, vendor.id).await.unwrap();
    let stored = api.db().fetch_locker("L-9").await.unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("Easybox Gara"));
}

#[tokio::test]
async fn merging_the_same_snapshot_twice_is_idempotent() {
    let (api, vendor) = api_with_vendor().await;
    let snap = snapshot("1001", OrderStatus::Finalized, "2024-05-03T10:00:00Z", vec![line_item(
        1, "PNK-A", 2, 2, 0, "100.00", None,
    )]);
    let first = api.merge_order(&snap, vendor.id).await.unwrap();
    assert!(matches!(first, MergeOutcome::Inserted { .. }));
    let second = api.merge_order(&snap, vendor.id).await.unwrap();
    assert_eq!(second, MergeOutcome::Unchanged { surrogate_id: first.surrogate_id() });
    let stored = api.fetch_order(&snap.id, vendor.id, OrderStatus::Finalized).await.unwrap().unwrap();
    assert_eq!(stored.line_items.len(), 1);
    assert_eq!(stored.line_items[0].sale_price, money("100.00"));
    assert_eq!(stored.order.payment_mode.as_deref(), Some("COD"));
    assert_eq!(stored.courier_accounts, vec!["courier-1".to_string()]);
}

#[tokio::test]
async fn handled_fields_are_updated_in_place() {
    let (api, vendor) = api_with_vendor().await;
    let snap = snapshot("1002", OrderStatus::InProgress, "2024-05-03T10:00:00Z", vec![line_item(
        1, "PNK-A", 1, 1, 0, "50.00", None,
    )]);
    api.merge_order(&snap, vendor.id).await.unwrap();

    let mut newer = snap.clone();
    newer.payment_status = Some(1);
    newer.cashed_cod = Some(money("238.00"));
    newer.modified = Some(ts("2024-05-04T09:00:00Z"));
    let outcome = api.merge_order(&newer, vendor.id).await.unwrap();
    match outcome {
        MergeOutcome::Updated { changed_fields, unhandled, .. } => {
            assert!(changed_fields.contains(&"payment_status"));
            assert!(changed_fields.contains(&"cashed_cod"));
            assert!(changed_fields.contains(&"modified"));
            assert!(unhandled.is_empty());
        },
        other => panic!("expected an update, got {other:?}"),
    }
    let stored = api.fetch_order(&snap.id, vendor.id, OrderStatus::InProgress).await.unwrap().unwrap();
    assert_eq!(stored.order.payment_status, Some(1));
    assert_eq!(stored.order.cashed_cod, Some(money("238.00")));
    assert_eq!(stored.order.modified, newer.modified);
}

#[tokio::test]
async fn the_modified_timestamp_never_moves_backwards() {
    let (api, vendor) = api_with_vendor().await;
    let snap = snapshot("1003", OrderStatus::New, "2024-05-03T10:00:00Z", vec![line_item(
        1, "PNK-A", 1, 1, 0, "10.00", None,
    )]);
    api.merge_order(&snap, vendor.id).await.unwrap();

    let mut stale = snap.clone();
    stale.modified = Some(ts("2024-05-02T00:00:00Z"));
    let outcome = api.merge_order(&stale, vendor.id).await.unwrap();
    assert!(matches!(outcome, MergeOutcome::Unchanged { .. }));
    let stored = api.fetch_order(&snap.id, vendor.id, OrderStatus::New).await.unwrap().unwrap();
    assert_eq!(stored.order.modified, snap.modified);
}

#[tokio::test]
async fn changed_collections_are_replaced_wholesale() {
    let (api, vendor) = api_with_vendor().await;
    let mut snap = snapshot("1004", OrderStatus::Finalized, "2024-05-03T10:00:00Z", vec![line_item(
        1, "PNK-A", 1, 1, 0, "10.00", None,
    )]);
    snap.attachments = vec![attachment("https://files.example.com/invoice-1.pdf")];
    api.merge_order(&snap, vendor.id).await.unwrap();

    let mut newer = snap.clone();
    newer.attachments = vec![
        attachment("https://files.example.com/invoice-1.pdf"),
        attachment("https://files.example.com/invoice-2.pdf"),
    ];
    let outcome = api.merge_order(&newer, vendor.id).await.unwrap();
    match outcome {
        MergeOutcome::Updated { replaced_collections, .. } => {
            assert_eq!(replaced_collections, vec!["attachments"]);
        },
        other => panic!("expected an update, got {other:?}"),
    }
    let stored = api.fetch_order(&snap.id, vendor.id, OrderStatus::Finalized).await.unwrap().unwrap();
    assert_eq!(stored.attachments.len(), 2);
}

#[tokio::test]
async fn each_status_gets_its_own_row() {
    let (api, vendor) = api_with_vendor().await;
    let finalized = snapshot("1005", OrderStatus::Finalized, "2024-05-03T10:00:00Z", vec![line_item(
        1, "PNK-A", 2, 2, 0, "100.00", None,
    )]);
    let storno = snapshot("1005", OrderStatus::Storno, "2024-05-20T10:00:00Z", vec![line_item(
        1, "PNK-A", 1, 2, 1, "100.00", None,
    )]);
    let a = api.merge_order(&finalized, vendor.id).await.unwrap();
    let b = api.merge_order(&storno, vendor.id).await.unwrap();
    assert!(matches!(a, MergeOutcome::Inserted { .. }));
    assert!(matches!(b, MergeOutcome::Inserted { .. }));
    assert_ne!(a.surrogate_id(), b.surrogate_id());
    let rows = api.db().fetch_order_rows(&finalized.id, vendor.id).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn a_malformed_snapshot_does_not_abort_the_batch() {
    let (api, vendor) = api_with_vendor().await;
    let mut bad = snapshot("2001", OrderStatus::New, "2024-05-03T10:00:00Z", vec![line_item(
        1, "PNK-A", 1, 1, 0, "10.00", None,
    )]);
    // locker id without locker details
    bad.locker_id = Some("L-17".to_string());
    let good = snapshot("2002", OrderStatus::New, "2024-05-03T11:00:00Z", vec![line_item(
        1, "PNK-A", 1, 1, 0, "10.00", None,
    )]);
    let report = api.merge_batch(&vendor, &[bad.clone(), good.clone()]).await.unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, bad.id);
    assert!(matches!(report.failed[0].1, MirrorError::MalformedSnapshot { .. }));
    assert!(api.fetch_order(&good.id, vendor.id, OrderStatus::New).await.unwrap().is_some());
    assert!(api.fetch_order(&bad.id, vendor.id, OrderStatus::New).await.unwrap().is_none());
}

#[tokio::test]
async fn unhandled_differences_are_surfaced_but_not_applied() {
    let (api, vendor) = api_with_vendor().await;
    let snap = snapshot("2003", OrderStatus::Finalized, "2024-05-03T10:00:00Z", vec![line_item(
        1, "PNK-A", 1, 1, 0, "10.00", None,
    )]);
    api.merge_order(&snap, vendor.id).await.unwrap();

    let mut newer = snap.clone();
    newer.observation = Some("customer called about delivery".to_string());
    let outcome = api.merge_order(&newer, vendor.id).await.unwrap();
    match outcome {
        MergeOutcome::Updated { changed_fields, unhandled, .. } => {
            assert!(changed_fields.is_empty());
            assert_eq!(unhandled.len(), 1);
            assert_eq!(unhandled[0].field, "observation");
        },
        other => panic!("expected surfaced differences, got {other:?}"),
    }
    let stored = api.fetch_order(&snap.id, vendor.id, OrderStatus::Finalized).await.unwrap().unwrap();
    assert_eq!(stored.order.observation, None);
}

#[tokio::test]
async fn the_difference_hook_can_halt_a_batch() {
    let (api, vendor) = api_with_vendor().await;
    let snap = snapshot("2004", OrderStatus::Finalized, "2024-05-03T10:00:00Z", vec![line_item(
        1, "PNK-A", 1, 1, 0, "10.00", None,
    )]);
    api.merge_order(&snap, vendor.id).await.unwrap();

    let mut conflicting = snap.clone();
    conflicting.observation = Some("manual review required".to_string());
    let untouched = snapshot("2005", OrderStatus::New, "2024-05-03T11:00:00Z", vec![line_item(
        1, "PNK-A", 1, 1, 0, "10.00", None,
    )]);
    let halting = api.clone().with_difference_hook(Arc::new(|_| MergeDecision::Halt));
    let err = halting.merge_batch(&vendor, &[conflicting, untouched.clone()]).await.unwrap_err();
    assert!(matches!(err, MirrorApiError::HaltedByOperator(ref id) if *id == snap.id));
    // the order after the halt was never merged
    assert!(api.fetch_order(&untouched.id, vendor.id, OrderStatus::New).await.unwrap().is_none());
}

#[tokio::test]
async fn customer_updates_follow_last_writer_wins() {
    let (api, vendor) = api_with_vendor().await;
    let snap = snapshot("2006", OrderStatus::New, "2024-05-03T10:00:00Z", vec![line_item(
        1, "PNK-A", 1, 1, 0, "10.00", None,
    )]);
    api.merge_order(&snap, vendor.id).await.unwrap();

    // an older customer version loses, a newer one wins
    let mut stale = snap.clone();
    let customer = stale.customer.as_mut().unwrap();
    customer.email = Some("old@example.com".to_string());
    customer.modified = Some(ts("2024-04-01T00:00:00Z"));
    api.merge_order(&stale, vendor.id).await.unwrap();
    let stored = api.db().fetch_customer(70001).await.unwrap().unwrap();
    assert_eq!(stored.email.as_deref(), Some("ana@example.com"));

    let mut fresh = snap.clone();
    let customer = fresh.customer.as_mut().unwrap();
    customer.email = Some("new@example.com".to_string());
    customer.modified = Some(ts("2024-06-01T00:00:00Z"));
    api.merge_order(&fresh, vendor.id).await.unwrap();
    let stored = api.db().fetch_customer(70001).await.unwrap().unwrap();
    assert_eq!(stored.email.as_deref(), Some("new@example.com"));
}
