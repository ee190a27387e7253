mod support;

use chrono::NaiveDate;
use market_mirror_engine::{
    db_types::{OrderStatus, Product},
    GmvStore,
    OrderMirrorApi,
    SqliteDatabase,
};
use support::{line_item, money, prepare_test_env, snapshot};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn api_with_catalog() -> (OrderMirrorApi<SqliteDatabase>, market_mirror_engine::db_types::Vendor) {
    let db = prepare_test_env().await;
    let api = OrderMirrorApi::new(db);
    let vendor = api.fetch_or_create_vendor("acme", false, "acme-main").await.unwrap();
    let widget = Product { product_code: "SKU-1".to_string(), name: "Widget".to_string(), pnk: Some("PNK-A".to_string()) };
    api.upsert_product(&widget).await.unwrap();
    (api, vendor)
}

#[tokio::test]
async fn a_single_finalized_sale_lands_in_its_own_month() {
    let (api, vendor) = api_with_catalog().await;
    let sale = snapshot("3001", OrderStatus::Finalized, "2024-03-10T09:00:00Z", vec![line_item(
        1, "PNK-A", 3, 3, 0, "25.00", None,
    )]);
    api.merge_order(&sale, vendor.id).await.unwrap();

    let stats = api.update_gmv("SKU-1", day(2024, 3, 1), day(2024, 4, 1)).await.unwrap();
    assert_eq!(stats.inserted, 1);
    let totals = api.db().gmv_for_product("SKU-1").await.unwrap();
    assert_eq!(totals[&day(2024, 3, 1)], money("75.00"));
}

#[tokio::test]
async fn a_same_month_cancellation_nets_to_the_storno_amount() {
    let (api, vendor) = api_with_catalog().await;
    let sale = snapshot("3002", OrderStatus::Finalized, "2024-01-05T09:00:00Z", vec![line_item(
        1, "PNK-A", 3, 3, 0, "100.00", None,
    )]);
    let cancellation = snapshot("3002", OrderStatus::Storno, "2024-01-20T09:00:00Z", vec![line_item(
        1, "PNK-A", 3, 3, 3, "100.00", None,
    )]);
    api.merge_order(&sale, vendor.id).await.unwrap();
    api.merge_order(&cancellation, vendor.id).await.unwrap();

    api.update_gmv("SKU-1", day(2024, 1, 1), day(2024, 2, 1)).await.unwrap();
    let totals = api.db().gmv_for_product("SKU-1").await.unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[&day(2024, 1, 1)], money("300.00"));
}

#[tokio::test]
async fn a_cross_month_cancellation_reverses_in_the_storno_month() {
    let (api, vendor) = api_with_catalog().await;
    let sale = snapshot("3003", OrderStatus::Finalized, "2024-01-28T09:00:00Z", vec![line_item(
        7, "PNK-A", 2, 2, 0, "50.00", None,
    )]);
    let cancellation = snapshot("3003", OrderStatus::Storno, "2024-02-03T09:00:00Z", vec![line_item(
        7, "PNK-A", 0, 2, 2, "50.00", None,
    )]);
    api.merge_order(&sale, vendor.id).await.unwrap();
    api.merge_order(&cancellation, vendor.id).await.unwrap();

    api.update_gmv("SKU-1", day(2024, 1, 1), day(2024, 3, 1)).await.unwrap();
    let totals = api.db().gmv_for_product("SKU-1").await.unwrap();
    assert_eq!(totals[&day(2024, 1, 1)], money("100.00"));
    assert_eq!(totals[&day(2024, 2, 1)], money("-100.00"));
}

#[tokio::test]
async fn prices_include_vat() {
    let (api, vendor) = api_with_catalog().await;
    let sale = snapshot("3004", OrderStatus::Finalized, "2024-04-12T09:00:00Z", vec![line_item(
        1,
        "PNK-A",
        1,
        1,
        0,
        "100.00",
        Some("0.19"),
    )]);
    api.merge_order(&sale, vendor.id).await.unwrap();

    api.update_gmv("SKU-1", day(2024, 4, 1), day(2024, 5, 1)).await.unwrap();
    let totals = api.db().gmv_for_product("SKU-1").await.unwrap();
    assert_eq!(totals[&day(2024, 4, 1)], money("119.00"));
}

#[tokio::test]
async fn recomputing_over_unchanged_data_writes_nothing() {
    let (api, vendor) = api_with_catalog().await;
    let sale = snapshot("3005", OrderStatus::Finalized, "2024-05-02T09:00:00Z", vec![line_item(
        1, "PNK-A", 2, 2, 0, "10.00", None,
    )]);
    api.merge_order(&sale, vendor.id).await.unwrap();

    let first = api.update_gmv("SKU-1", day(2024, 5, 1), day(2024, 6, 1)).await.unwrap();
    assert_eq!(first.inserted, 1);
    let second = api.update_gmv("SKU-1", day(2024, 5, 1), day(2024, 6, 1)).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.skipped, 1);
}

#[tokio::test]
async fn rebinding_a_product_to_a_new_listing_takes_effect_on_the_next_run() {
    let (api, vendor) = api_with_catalog().await;
    // the only sale in the window is on a listing the product is not yet bound to
    let sale = snapshot("3008", OrderStatus::Finalized, "2024-07-03T09:00:00Z", vec![line_item(
        1, "PNK-B", 1, 1, 0, "10.00", None,
    )]);
    api.merge_order(&sale, vendor.id).await.unwrap();
    let before = api.update_gmv("SKU-1", day(2024, 7, 1), day(2024, 8, 1)).await.unwrap();
    assert_eq!(before.inserted, 0);

    let rebound =
        Product { product_code: "SKU-1".to_string(), name: "Widget".to_string(), pnk: Some("PNK-B".to_string()) };
    api.upsert_product(&rebound).await.unwrap();
    let stored = api.db().fetch_product("SKU-1").await.unwrap().unwrap();
    assert_eq!(stored.pnk.as_deref(), Some("PNK-B"));

    let after = api.update_gmv("SKU-1", day(2024, 7, 1), day(2024, 8, 1)).await.unwrap();
    assert_eq!(after.inserted, 1);
    let totals = api.db().gmv_for_product("SKU-1").await.unwrap();
    assert_eq!(totals[&day(2024, 7, 1)], money("10.00"));
}

#[tokio::test]
async fn the_monthly_report_joins_product_names() {
    let (api, vendor) = api_with_catalog().await;
    let gadget =
        Product { product_code: "SKU-2".to_string(), name: "Gadget".to_string(), pnk: Some("PNK-B".to_string()) };
    api.upsert_product(&gadget).await.unwrap();
    let widgets = snapshot("3006", OrderStatus::Finalized, "2024-06-05T09:00:00Z", vec![line_item(
        1, "PNK-A", 1, 1, 0, "10.00", None,
    )]);
    let gadgets = snapshot("3007", OrderStatus::Finalized, "2024-06-06T09:00:00Z", vec![line_item(
        1, "PNK-B", 2, 2, 0, "20.00", None,
    )]);
    api.merge_order(&widgets, vendor.id).await.unwrap();
    api.merge_order(&gadgets, vendor.id).await.unwrap();
    api.update_gmv("SKU-1", day(2024, 6, 1), day(2024, 7, 1)).await.unwrap();
    api.update_gmv("SKU-2", day(2024, 6, 1), day(2024, 7, 1)).await.unwrap();

    let report = api.gmv_for_month(day(2024, 6, 1)).await.unwrap();
    assert_eq!(report.len(), 2);
    assert_eq!(report[0].product_code, "SKU-1");
    assert_eq!(report[0].name, "Widget");
    assert_eq!(report[0].gmv, money("10.00"));
    assert_eq!(report[1].name, "Gadget");
    assert_eq!(report[1].gmv, money("40.00"));
}
