//! Snapshot builders shared by the integration tests. Database setup comes from the crate's own
//! `test_utils` feature.
#![allow(dead_code)]

use std::str::FromStr;

use chrono::{DateTime, Utc};
use market_mirror_engine::{
    db_types::{Attachment, Customer, LineItem, LockerDetails, OrderId, OrderSnapshot, OrderStatus},
    helpers::Money,
};

pub use market_mirror_engine::test_utils::prepare_test_env;

pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid RFC3339 timestamp")
}

pub fn money(s: &str) -> Money {
    Money::from_str(s).expect("valid amount")
}

pub fn customer(id: i64) -> Customer {
    Customer {
        id,
        mkt_id: Some(id),
        name: Some("Ana Pop".to_string()),
        email: Some("ana@example.com".to_string()),
        billing_city: Some("Cluj-Napoca".to_string()),
        shipping_city: Some("Cluj-Napoca".to_string()),
        created: Some(ts("2023-11-01T12:00:00Z")),
        modified: Some(ts("2024-05-01T12:00:00Z")),
        ..Customer::default()
    }
}

pub fn line_item(
    line_id: i64,
    pnk: &str,
    qty: i64,
    initial: i64,
    storno: i64,
    sale_price: &str,
    vat: Option<&str>,
) -> LineItem {
    LineItem {
        line_id,
        product_id: Some(line_id * 100),
        part_number_key: Some(pnk.to_string()),
        name: Some("Widget".to_string()),
        status: Some(1),
        currency: Some("RON".to_string()),
        vat: vat.map(String::from),
        quantity: qty,
        initial_qty: initial,
        storno_qty: storno,
        sale_price: money(sale_price),
        original_price: None,
        created: None,
        modified: None,
        voucher_splits: vec![],
    }
}

pub fn locker(id: &str, name: &str) -> LockerDetails {
    LockerDetails {
        locker_id: id.to_string(),
        name: Some(name.to_string()),
        locker_delivery_eligible: Some(1),
        courier_external_office_id: None,
    }
}

pub fn attachment(url: &str) -> Attachment {
    Attachment {
        name: Some("invoice.pdf".to_string()),
        url: url.to_string(),
        kind: Some(1),
        force_download: Some(0),
        visibility: Some("public".to_string()),
    }
}

/// A fully populated order snapshot with one customer and the given line items.
pub fn snapshot(id: &str, status: OrderStatus, order_date: &str, items: Vec<LineItem>) -> OrderSnapshot {
    OrderSnapshot {
        id: OrderId::from(id.to_string()),
        status,
        is_complete: Some(1),
        order_type: Some(3),
        payment_mode: Some("COD".to_string()),
        payment_mode_id: Some(1),
        delivery_payment_mode: Some("cash".to_string()),
        delivery_mode: Some("courier".to_string()),
        observation: None,
        locker_id: None,
        locker: None,
        order_date: Some(ts(order_date)),
        payment_status: Some(0),
        cashed_co: None,
        cashed_cod: None,
        shipping_tax: Some(money("19.99")),
        shipping_tax_voucher_split: vec![],
        customer: Some(customer(70001)),
        line_items: items,
        attachments: vec![],
        vouchers: vec![],
        is_storno: status == OrderStatus::Storno,
        refunded_amount: None,
        refund_status: None,
        maximum_date_for_shipment: None,
        finalization_date: None,
        parent_id: None,
        detailed_payment_method: None,
        cancellation_request: None,
        cancellation_reason: None,
        late_shipment: Some(0),
        flags: vec![],
        courier_accounts: vec!["courier-1".to_string()],
        created: Some(ts("2024-05-01T08:00:00Z")),
        modified: Some(ts("2024-05-03T10:00:00Z")),
    }
}
