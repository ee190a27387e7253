use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef},
    Decode,
    Encode,
    FromRow,
    Sqlite,
    Type,
};
use thiserror::Error;

use crate::helpers::Money;

//--------------------------------------      OrderId       ----------------------------------------------------------
/// The marketplace's own order identifier. Not unique on its own: the marketplace reports each
/// status transition of an order as a distinct entity, so the stored identity is the
/// (order id, vendor, status) triple and rows carry a locally assigned surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     OrderStatus     ---------------------------------------------------------
/// Order lifecycle status as reported by the marketplace. The wire format is a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum OrderStatus {
    Cancelled,
    New,
    InProgress,
    Prepared,
    /// The sale has completed.
    Finalized,
    /// The finalized sale was (partially) cancelled or returned.
    Storno,
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct OrderStatusConversionError(pub i64);

impl TryFrom<i64> for OrderStatus {
    type Error = OrderStatusConversionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Cancelled),
            1 => Ok(Self::New),
            2 => Ok(Self::InProgress),
            3 => Ok(Self::Prepared),
            4 => Ok(Self::Finalized),
            5 => Ok(Self::Storno),
            other => Err(OrderStatusConversionError(other)),
        }
    }
}

impl From<OrderStatus> for i64 {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Cancelled => 0,
            OrderStatus::New => 1,
            OrderStatus::InProgress => 2,
            OrderStatus::Prepared => 3,
            OrderStatus::Finalized => 4,
            OrderStatus::Storno => 5,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Cancelled => write!(f, "Cancelled"),
            OrderStatus::New => write!(f, "New"),
            OrderStatus::InProgress => write!(f, "InProgress"),
            OrderStatus::Prepared => write!(f, "Prepared"),
            OrderStatus::Finalized => write!(f, "Finalized"),
            OrderStatus::Storno => write!(f, "Storno"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = OrderStatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cancelled" => Ok(Self::Cancelled),
            "New" => Ok(Self::New),
            "InProgress" => Ok(Self::InProgress),
            "Prepared" => Ok(Self::Prepared),
            "Finalized" => Ok(Self::Finalized),
            "Storno" => Ok(Self::Storno),
            _ => Err(OrderStatusConversionError(-1)),
        }
    }
}

impl Type<Sqlite> for OrderStatus {
    fn type_info() -> SqliteTypeInfo {
        <i64 as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <i64 as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for OrderStatus {
    fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> IsNull {
        buf.push(SqliteArgumentValue::Int64(i64::from(*self)));
        IsNull::No
    }
}

impl<'r> Decode<'r, Sqlite> for OrderStatus {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <i64 as Decode<Sqlite>>::decode(value)?;
        Ok(Self::try_from(raw)?)
    }
}

//--------------------------------------       Vendor        ---------------------------------------------------------
/// One configured marketplace seller account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Vendor {
    pub id: i64,
    pub name: String,
    /// Whether this is the fulfilled-by-marketplace variant of the account.
    pub is_fbe: bool,
    /// Alias of the credential set the fetcher uses for this account.
    pub account: String,
    pub last_fetch: Option<DateTime<Utc>>,
}

//--------------------------------------      Customer       ---------------------------------------------------------
/// Reference data shared across many orders; keyed by the marketplace customer id and updated with
/// last-writer-wins semantics based on the source `modified` timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub mkt_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub gender: Option<String>,
    pub code: Option<String>,
    pub registration_number: Option<String>,
    pub bank: Option<String>,
    pub iban: Option<String>,
    pub legal_entity: Option<i64>,
    pub is_vat_payer: Option<i64>,
    pub phone_1: Option<String>,
    pub billing_name: Option<String>,
    pub billing_phone: Option<String>,
    pub billing_country: Option<String>,
    pub billing_city: Option<String>,
    pub billing_street: Option<String>,
    pub billing_postal_code: Option<String>,
    pub shipping_country: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_street: Option<String>,
    pub shipping_postal_code: Option<String>,
    pub shipping_contact: Option<String>,
    pub shipping_phone: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl Customer {
    /// Structural equality ignoring the created/modified timestamps.
    pub fn same_except_dates(&self, other: &Customer) -> bool {
        let a = Customer { created: None, modified: None, ..self.clone() };
        let b = Customer { created: None, modified: None, ..other.clone() };
        a == b
    }
}

//--------------------------------------    LockerDetails    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LockerDetails {
    pub locker_id: String,
    pub name: Option<String>,
    pub locker_delivery_eligible: Option<i64>,
    pub courier_external_office_id: Option<String>,
}

//-------------------------------------- CancellationReason  ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationReason {
    pub id: i64,
    pub name: Option<String>,
}

//--------------------------------------    VoucherSplit     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct VoucherSplit {
    pub voucher_id: Option<i64>,
    pub value: Option<Money>,
    pub vat_value: Option<Money>,
    pub vat: Option<String>,
    pub offered_by: Option<String>,
    pub voucher_name: Option<String>,
}

//--------------------------------------       Voucher       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Voucher {
    pub voucher_id: i64,
    pub voucher_code: Option<String>,
    pub voucher_name: Option<String>,
    pub status: Option<i64>,
    pub sale_price: Option<Money>,
    pub sale_price_vat: Option<Money>,
    pub vat: Option<Money>,
    /// Dates are kept as the raw strings the marketplace delivers; they are opaque to the mirror.
    pub issue_date: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
}

//--------------------------------------     Attachment      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Attachment {
    pub name: Option<String>,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: Option<i64>,
    pub force_download: Option<i64>,
    pub visibility: Option<String>,
}

//--------------------------------------        Flag         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Flag {
    pub flag: String,
    pub value: Option<String>,
}

//--------------------------------------      LineItem       ---------------------------------------------------------
/// One product position within an order, as reported by the marketplace. The marketplace assigns
/// `line_id` per order; it is stable within one snapshot but nested rows (voucher splits) carry no
/// stable identity across fetches, which is why collections are replaced wholesale on change.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "id")]
    pub line_id: i64,
    pub product_id: Option<i64>,
    /// The marketplace's per-listing key (PNK). The catalog join for GMV goes through this.
    pub part_number_key: Option<String>,
    pub name: Option<String>,
    pub status: Option<i64>,
    pub currency: Option<String>,
    /// VAT rate as delivered ("0.19"); parsed only when a VAT-inclusive price is needed.
    pub vat: Option<String>,
    pub quantity: i64,
    pub initial_qty: i64,
    pub storno_qty: i64,
    pub sale_price: Money,
    pub original_price: Option<Money>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(default)]
    pub voucher_splits: Vec<VoucherSplit>,
}

//--------------------------------------    OrderSnapshot    ---------------------------------------------------------
/// One point-in-time representation of a remote order, fully populated, as handed over by the
/// external fetcher. Immutable input to the merge engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: OrderId,
    pub status: OrderStatus,
    pub is_complete: Option<i64>,
    #[serde(rename = "type")]
    pub order_type: Option<i64>,
    pub payment_mode: Option<String>,
    pub payment_mode_id: Option<i64>,
    pub delivery_payment_mode: Option<String>,
    pub delivery_mode: Option<String>,
    pub observation: Option<String>,
    pub locker_id: Option<String>,
    #[serde(default)]
    pub locker: Option<LockerDetails>,
    pub order_date: Option<DateTime<Utc>>,
    pub payment_status: Option<i64>,
    pub cashed_co: Option<Money>,
    pub cashed_cod: Option<Money>,
    pub shipping_tax: Option<Money>,
    #[serde(default)]
    pub shipping_tax_voucher_split: Vec<VoucherSplit>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(rename = "products", default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub vouchers: Vec<Voucher>,
    #[serde(default)]
    pub is_storno: bool,
    pub refunded_amount: Option<Money>,
    pub refund_status: Option<String>,
    pub maximum_date_for_shipment: Option<DateTime<Utc>>,
    pub finalization_date: Option<DateTime<Utc>>,
    pub parent_id: Option<String>,
    pub detailed_payment_method: Option<String>,
    pub cancellation_request: Option<String>,
    #[serde(default)]
    pub cancellation_reason: Option<CancellationReason>,
    pub late_shipment: Option<i64>,
    #[serde(default)]
    pub flags: Vec<Flag>,
    #[serde(default)]
    pub courier_accounts: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

//--------------------------------------        Order        ---------------------------------------------------------
/// The stored scalar part of a mirrored order. `surrogate_id` is assigned locally on first insert;
/// the natural identity is (order_id, vendor_id, status).
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Order {
    pub surrogate_id: i64,
    pub order_id: OrderId,
    pub vendor_id: i64,
    pub status: OrderStatus,
    pub is_complete: Option<i64>,
    pub order_type: Option<i64>,
    pub payment_mode: Option<String>,
    pub payment_mode_id: Option<i64>,
    pub delivery_payment_mode: Option<String>,
    pub delivery_mode: Option<String>,
    pub observation: Option<String>,
    pub locker_id: Option<String>,
    pub customer_id: Option<i64>,
    pub order_date: Option<DateTime<Utc>>,
    pub payment_status: Option<i64>,
    pub cashed_co: Option<Money>,
    pub cashed_cod: Option<Money>,
    pub shipping_tax: Option<Money>,
    pub is_storno: bool,
    pub cancellation_reason: Option<i64>,
    pub cancellation_reason_text: Option<String>,
    pub refunded_amount: Option<Money>,
    pub refund_status: Option<String>,
    pub maximum_date_for_shipment: Option<DateTime<Utc>>,
    pub finalization_date: Option<DateTime<Utc>>,
    pub parent_id: Option<String>,
    pub detailed_payment_method: Option<String>,
    pub cancellation_request: Option<String>,
    pub late_shipment: Option<i64>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

//--------------------------------------     StoredOrder     ---------------------------------------------------------
/// A mirrored order together with all of its dependent collections, as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOrder {
    pub order: Order,
    pub line_items: Vec<LineItem>,
    pub vouchers: Vec<Voucher>,
    pub attachments: Vec<Attachment>,
    pub flags: Vec<Flag>,
    pub shipping_tax_voucher_split: Vec<VoucherSplit>,
    pub courier_accounts: Vec<String>,
}

//--------------------------------------      Product        ---------------------------------------------------------
/// Our own catalog entry. `product_code` is the internal key; `pnk` is the marketplace listing the
/// code is currently bound to (the binding can change over time).
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Product {
    pub product_code: String,
    pub name: String,
    pub pnk: Option<String>,
}

//--------------------------------------   LineItemState     ---------------------------------------------------------
/// One line-item observation used by GMV reconciliation: the line as it appears under one order
/// status row. A line item that was finalized and later cancelled appears twice, once under the
/// `Finalized` order row and once under the `Storno` row.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemState {
    pub order_id: OrderId,
    pub surrogate_id: i64,
    pub order_date: NaiveDate,
    pub order_status: OrderStatus,
    pub line_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub initial_qty: i64,
    pub storno_qty: i64,
    /// VAT-inclusive unit price, already rounded to 2 decimals.
    pub price: Money,
}

//--------------------------------------     ProductGmv      ---------------------------------------------------------
/// One row of the GMV aggregate, as consumed by the reporting layer.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProductGmv {
    pub product_code: String,
    pub name: String,
    pub month: NaiveDate,
    pub gmv: Money,
}

//--------------------------------------        Task         ---------------------------------------------------------
/// Persisted state of one named periodic job.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Task {
    pub name: String,
    pub started: Option<DateTime<Utc>>,
    pub terminated: Option<DateTime<Utc>>,
    /// Duration of the last completed run, in seconds.
    pub duration_of_last_run: Option<i64>,
    pub last_successful_run: Option<DateTime<Utc>>,
    pub consecutive_failures: i64,
    pub last_error: Option<String>,
}

impl Task {
    /// A task is running iff it has started and not yet terminated.
    pub fn is_running(&self) -> bool {
        self.started.is_some() && self.terminated.is_none()
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::{OrderSnapshot, OrderStatus};
    use crate::helpers::Money;

    #[test]
    fn snapshots_deserialize_from_marketplace_json() {
        let json = r#"{
            "id": "93847",
            "status": 4,
            "type": 3,
            "payment_mode_id": 1,
            "is_storno": false,
            "products": [
                {
                    "id": 11,
                    "part_number_key": "PNK-X",
                    "quantity": 2,
                    "initial_qty": 2,
                    "storno_qty": 0,
                    "sale_price": "49.90",
                    "vat": "0.19"
                }
            ],
            "attachments": [{"url": "https://files.example.com/1.pdf", "type": 1}]
        }"#;
        let snap: OrderSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.id.as_str(), "93847");
        assert_eq!(snap.status, OrderStatus::Finalized);
        assert_eq!(snap.order_type, Some(3));
        assert_eq!(snap.line_items.len(), 1);
        assert_eq!(snap.line_items[0].line_id, 11);
        assert_eq!(snap.line_items[0].sale_price, Money::from_str("49.90").unwrap());
        assert_eq!(snap.attachments[0].kind, Some(1));
        assert!(snap.customer.is_none());
    }

    #[test]
    fn unknown_status_codes_are_rejected() {
        let err = serde_json::from_str::<OrderSnapshot>(r#"{"id": "1", "status": 9}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid order status"));
    }
}
