use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::{
    db_types::{LineItemState, OrderId, OrderSnapshot, OrderStatus, Product, StoredOrder, Vendor},
    traits::MergeOutcome,
};

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    /// The snapshot is missing required nested data. Aborts only the offending order's merge.
    #[error("Malformed snapshot for order {order_id}: {reason}")]
    MalformedSnapshot { order_id: OrderId, reason: String },
    /// A line item appeared as finalized+storno with an unexpected status combination. The data
    /// model is violated; continuing would corrupt the aggregate.
    #[error("Invalid status pairing for line {line_id} of order {order_id}: {first} and {second}")]
    InvalidStatusPairing { order_id: OrderId, line_id: i64, first: OrderStatus, second: OrderStatus },
    /// More than two states for one line item. At most one cancellation per line is assumed.
    #[error("Line {line_id} of order {order_id} appears in {count} states; at most 2 are allowed")]
    TooManyLineItemStates { order_id: OrderId, line_id: i64, count: usize },
    #[error("Order {order_id} (vendor {vendor_id}, status {status}) not found")]
    OrderNotFound { order_id: OrderId, vendor_id: i64, status: OrderStatus },
    #[error("No task named '{0}' exists")]
    TaskNotFound(String),
    #[error("Invalid stored value: {0}")]
    InvalidStoredValue(String),
}

/// The storage behaviour the merge engine and reconciliation need from a backend.
///
/// Backends are expected to enforce the (order id, vendor, status) uniqueness invariant atomically;
/// the merge protocol relies on the conflict-checked insert to decide between the insert and diff
/// paths.
#[allow(async_fn_in_trait)]
pub trait OrderMirrorDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Fetches the vendor row for `name`, creating it on first use.
    async fn fetch_or_create_vendor(&self, name: &str, is_fbe: bool, account: &str) -> Result<Vendor, MirrorError>;

    /// Records when the fetcher last pulled orders for the given account alias.
    async fn update_last_fetch(&self, account: &str, fetched_at: DateTime<Utc>) -> Result<(), MirrorError>;

    /// When the fetcher last pulled orders for the given account alias, if ever. The fetcher uses
    /// this to window its queries.
    async fn last_fetch(&self, account: &str) -> Result<Option<DateTime<Utc>>, MirrorError>;

    /// Merges one order snapshot into the mirror, in a single transaction.
    ///
    /// Inserts a brand-new (order id, vendor, status) row with all dependents, or diffs the
    /// snapshot against the stored version and applies the minimal set of writes. Safe to repeat:
    /// an unchanged snapshot produces [`MergeOutcome::Unchanged`] and zero writes.
    async fn merge_order(&self, snapshot: &OrderSnapshot, vendor_id: i64) -> Result<MergeOutcome, MirrorError>;

    /// Reads one mirrored order with all its dependent collections.
    async fn fetch_order(
        &self,
        order_id: &OrderId,
        vendor_id: i64,
        status: OrderStatus,
    ) -> Result<Option<StoredOrder>, MirrorError>;

    /// Creates or updates a catalog entry, rebinding its PNK if it changed.
    async fn upsert_product(&self, product: &Product) -> Result<(), MirrorError>;

    /// All finalized/storno line-item states for a product whose order date falls in
    /// `[from, until)`. Input to [`crate::reconcile::gmv_by_month`].
    async fn line_item_states(
        &self,
        product_code: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<LineItemState>, MirrorError>;
}
