use chrono::{DateTime, Utc};
use log::{debug, warn};
use sqlx::SqliteConnection;

use super::customers;
use crate::{
    db_types::{
        Attachment,
        Flag,
        LineItem,
        Order,
        OrderId,
        OrderSnapshot,
        OrderStatus,
        StoredOrder,
        Voucher,
        VoucherSplit,
    },
    helpers::Money,
    traits::{MergeOutcome, MirrorError, UnhandledDifference},
};

/// Merges one order snapshot into the mirror.
///
/// Reference data (customer, locker) is upserted first because of referential constraints. The
/// order row insert is conflict-checked on (order_id, vendor_id, status); a rejected insert falls
/// through to the diff path, which applies one update statement per actually-changed field and
/// replaces dependent collections wholesale when they differ. Every write is individually
/// idempotent, so a crashed merge is recovered by re-running the same snapshot.
pub async fn merge_order(
    snapshot: &OrderSnapshot,
    vendor_id: i64,
    conn: &mut SqliteConnection,
) -> Result<MergeOutcome, MirrorError> {
    if snapshot.locker_id.is_some() && snapshot.locker.is_none() {
        return Err(MirrorError::MalformedSnapshot {
            order_id: snapshot.id.clone(),
            reason: "a locker id is present but the locker details are missing".to_string(),
        });
    }
    if let Some(customer) = &snapshot.customer {
        customers::upsert_customer(customer, &mut *conn).await?;
    }
    if let Some(locker) = &snapshot.locker {
        customers::upsert_locker(locker, &mut *conn).await?;
    }
    match insert_order(snapshot, vendor_id, &mut *conn).await? {
        Some(surrogate_id) => {
            debug!("🗃️ Order {} (vendor {vendor_id}, status {}) inserted as #{surrogate_id}", snapshot.id, snapshot.status);
            insert_dependents(snapshot, surrogate_id, &mut *conn).await?;
            Ok(MergeOutcome::Inserted { surrogate_id })
        },
        None => {
            let surrogate_id = surrogate_id_for(&snapshot.id, vendor_id, snapshot.status, &mut *conn).await?;
            let stored = fetch_stored_order(surrogate_id, &mut *conn).await?.ok_or(MirrorError::OrderNotFound {
                order_id: snapshot.id.clone(),
                vendor_id,
                status: snapshot.status,
            })?;
            apply_diff(snapshot, &stored, vendor_id, conn).await
        },
    }
}

/// Reads one mirrored order with all its dependent collections.
pub async fn fetch_order(
    order_id: &OrderId,
    vendor_id: i64,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<StoredOrder>, MirrorError> {
    let surrogate_id: Option<(i64,)> =
        sqlx::query_as("SELECT surrogate_id FROM orders WHERE order_id = $1 AND vendor_id = $2 AND status = $3")
            .bind(order_id.as_str())
            .bind(vendor_id)
            .bind(status)
            .fetch_optional(&mut *conn)
            .await?;
    match surrogate_id {
        Some((id,)) => fetch_stored_order(id, conn).await,
        None => Ok(None),
    }
}

/// All stored rows carrying the given marketplace order id for a vendor, one per status.
pub async fn fetch_order_rows(
    order_id: &OrderId,
    vendor_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, MirrorError> {
    let rows = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1 AND vendor_id = $2 ORDER BY status")
        .bind(order_id.as_str())
        .bind(vendor_id)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

//--------------------------------------   insert path    ------------------------------------------------------------

/// Conflict-checked insert. Returns the new surrogate id, or `None` if a row for the
/// (order id, vendor, status) triple already exists.
async fn insert_order(
    s: &OrderSnapshot,
    vendor_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, MirrorError> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        INSERT INTO orders (
            order_id, vendor_id, status, is_complete, order_type, payment_mode, payment_mode_id,
            delivery_payment_mode, delivery_mode, observation, locker_id, customer_id, order_date,
            payment_status, cashed_co, cashed_cod, shipping_tax, is_storno, cancellation_reason,
            cancellation_reason_text, refunded_amount, refund_status, maximum_date_for_shipment,
            finalization_date, parent_id, detailed_payment_method, cancellation_request,
            late_shipment, created, modified
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19,
            $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30
        ) ON CONFLICT (order_id, vendor_id, status) DO NOTHING
        RETURNING surrogate_id
        "#,
    )
    .bind(s.id.as_str())
    .bind(vendor_id)
    .bind(s.status)
    .bind(s.is_complete)
    .bind(s.order_type)
    .bind(&s.payment_mode)
    .bind(s.payment_mode_id)
    .bind(&s.delivery_payment_mode)
    .bind(&s.delivery_mode)
    .bind(&s.observation)
    .bind(&s.locker_id)
    .bind(s.customer.as_ref().map(|c| c.id))
    .bind(s.order_date)
    .bind(s.payment_status)
    .bind(s.cashed_co)
    .bind(s.cashed_cod)
    .bind(s.shipping_tax)
    .bind(s.is_storno)
    .bind(s.cancellation_reason.as_ref().map(|r| r.id))
    .bind(s.cancellation_reason.as_ref().and_then(|r| r.name.clone()))
    .bind(s.refunded_amount)
    .bind(&s.refund_status)
    .bind(s.maximum_date_for_shipment)
    .bind(s.finalization_date)
    .bind(&s.parent_id)
    .bind(&s.detailed_payment_method)
    .bind(&s.cancellation_request)
    .bind(s.late_shipment)
    .bind(s.created)
    .bind(s.modified)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(id,)| id))
}

async fn surrogate_id_for(
    order_id: &OrderId,
    vendor_id: i64,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<i64, MirrorError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT surrogate_id FROM orders WHERE order_id = $1 AND vendor_id = $2 AND status = $3")
            .bind(order_id.as_str())
            .bind(vendor_id)
            .bind(status)
            .fetch_optional(conn)
            .await?;
    row.map(|(id,)| id).ok_or(MirrorError::OrderNotFound { order_id: order_id.clone(), vendor_id, status })
}

//--------------------------------------     diff path    ------------------------------------------------------------

async fn apply_diff(
    snapshot: &OrderSnapshot,
    stored: &StoredOrder,
    vendor_id: i64,
    conn: &mut SqliteConnection,
) -> Result<MergeOutcome, MirrorError> {
    let old = &stored.order;
    let surrogate_id = old.surrogate_id;
    let mut changed: Vec<&'static str> = Vec::new();

    // The stored 'modified' timestamp only ever moves forward.
    if let Some(incoming) = snapshot.modified {
        match old.modified {
            Some(current) if incoming < current => {
                warn!(
                    "🗃️ Order {} (vendor {vendor_id}): incoming 'modified' {incoming} is older than the stored \
                     {current}; keeping the stored value",
                    snapshot.id
                );
            },
            Some(current) if incoming == current => {},
            _ => {
                update_timestamp(surrogate_id, "modified", Some(incoming), &mut *conn).await?;
                changed.push("modified");
            },
        }
    }
    if old.is_complete != snapshot.is_complete {
        update_int(surrogate_id, "is_complete", snapshot.is_complete, &mut *conn).await?;
        changed.push("is_complete");
    }
    if old.late_shipment != snapshot.late_shipment {
        update_int(surrogate_id, "late_shipment", snapshot.late_shipment, &mut *conn).await?;
        changed.push("late_shipment");
    }
    if old.payment_status != snapshot.payment_status {
        update_int(surrogate_id, "payment_status", snapshot.payment_status, &mut *conn).await?;
        changed.push("payment_status");
    }
    let reason = snapshot.cancellation_reason.as_ref();
    if old.cancellation_reason != reason.map(|r| r.id)
        || old.cancellation_reason_text != reason.and_then(|r| r.name.clone())
    {
        sqlx::query("UPDATE orders SET cancellation_reason = $1, cancellation_reason_text = $2 WHERE surrogate_id = $3")
            .bind(reason.map(|r| r.id))
            .bind(reason.and_then(|r| r.name.clone()))
            .bind(surrogate_id)
            .execute(&mut *conn)
            .await?;
        changed.push("cancellation_reason");
    }
    if old.maximum_date_for_shipment != snapshot.maximum_date_for_shipment {
        update_timestamp(surrogate_id, "maximum_date_for_shipment", snapshot.maximum_date_for_shipment, &mut *conn)
            .await?;
        changed.push("maximum_date_for_shipment");
    }
    if old.finalization_date != snapshot.finalization_date {
        update_timestamp(surrogate_id, "finalization_date", snapshot.finalization_date, &mut *conn).await?;
        changed.push("finalization_date");
    }
    if old.cashed_co != snapshot.cashed_co {
        update_money(surrogate_id, "cashed_co", snapshot.cashed_co, &mut *conn).await?;
        changed.push("cashed_co");
    }
    if old.cashed_cod != snapshot.cashed_cod {
        update_money(surrogate_id, "cashed_cod", snapshot.cashed_cod, &mut *conn).await?;
        changed.push("cashed_cod");
    }
    if old.refunded_amount != snapshot.refunded_amount {
        update_money(surrogate_id, "refunded_amount", snapshot.refunded_amount, &mut *conn).await?;
        changed.push("refunded_amount");
    }
    if old.refund_status != snapshot.refund_status {
        update_text(surrogate_id, "refund_status", snapshot.refund_status.as_deref(), &mut *conn).await?;
        changed.push("refund_status");
    }
    if old.delivery_mode != snapshot.delivery_mode {
        update_text(surrogate_id, "delivery_mode", snapshot.delivery_mode.as_deref(), &mut *conn).await?;
        changed.push("delivery_mode");
    }
    if old.delivery_payment_mode != snapshot.delivery_payment_mode {
        update_text(surrogate_id, "delivery_payment_mode", snapshot.delivery_payment_mode.as_deref(), &mut *conn)
            .await?;
        changed.push("delivery_payment_mode");
    }
    if old.payment_mode != snapshot.payment_mode {
        update_text(surrogate_id, "payment_mode", snapshot.payment_mode.as_deref(), &mut *conn).await?;
        changed.push("payment_mode");
    }
    if old.payment_mode_id != snapshot.payment_mode_id {
        update_int(surrogate_id, "payment_mode_id", snapshot.payment_mode_id, &mut *conn).await?;
        changed.push("payment_mode_id");
    }
    if old.detailed_payment_method != snapshot.detailed_payment_method {
        update_text(surrogate_id, "detailed_payment_method", snapshot.detailed_payment_method.as_deref(), &mut *conn)
            .await?;
        changed.push("detailed_payment_method");
    }

    let mut replaced: Vec<&'static str> = Vec::new();
    update_dependents(snapshot, stored, surrogate_id, &mut replaced, conn).await?;

    let unhandled = unhandled_differences(old, snapshot);
    if changed.is_empty() && replaced.is_empty() && unhandled.is_empty() {
        Ok(MergeOutcome::Unchanged { surrogate_id })
    } else {
        debug!(
            "🗃️ Order {} (vendor {vendor_id}) diffed: {} field(s), {} collection(s), {} unhandled",
            snapshot.id,
            changed.len(),
            replaced.len(),
            unhandled.len()
        );
        Ok(MergeOutcome::Updated { surrogate_id, changed_fields: changed, replaced_collections: replaced, unhandled })
    }
}

/// Differences in fields the diff path has no handling for. These are surfaced, never applied.
fn unhandled_differences(old: &Order, new: &OrderSnapshot) -> Vec<UnhandledDifference> {
    let mut diffs = Vec::new();
    push_diff(&mut diffs, "order_type", &old.order_type, &new.order_type);
    push_diff(&mut diffs, "observation", &old.observation, &new.observation);
    push_diff(&mut diffs, "order_date", &old.order_date, &new.order_date);
    push_diff(&mut diffs, "shipping_tax", &old.shipping_tax, &new.shipping_tax);
    push_diff(&mut diffs, "parent_id", &old.parent_id, &new.parent_id);
    push_diff(&mut diffs, "cancellation_request", &old.cancellation_request, &new.cancellation_request);
    push_diff(&mut diffs, "is_storno", &old.is_storno, &new.is_storno);
    push_diff(&mut diffs, "created", &old.created, &new.created);
    push_diff(&mut diffs, "locker_id", &old.locker_id, &new.locker_id);
    push_diff(&mut diffs, "customer_id", &old.customer_id, &new.customer.as_ref().map(|c| c.id));
    diffs
}

fn push_diff<T: PartialEq + std::fmt::Debug>(
    out: &mut Vec<UnhandledDifference>,
    field: &'static str,
    stored: &T,
    incoming: &T,
) {
    if stored != incoming {
        out.push(UnhandledDifference { field, stored: format!("{stored:?}"), incoming: format!("{incoming:?}") });
    }
}

//--------------------------------------  field updates   ------------------------------------------------------------
// One statement per changed field keeps repeated merges of an unchanged snapshot write-free.
// `field` is always a static column name, never caller input.

async fn update_text(
    surrogate_id: i64,
    field: &'static str,
    value: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), MirrorError> {
    sqlx::query(&format!("UPDATE orders SET {field} = $1 WHERE surrogate_id = $2"))
        .bind(value)
        .bind(surrogate_id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn update_int(
    surrogate_id: i64,
    field: &'static str,
    value: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<(), MirrorError> {
    sqlx::query(&format!("UPDATE orders SET {field} = $1 WHERE surrogate_id = $2"))
        .bind(value)
        .bind(surrogate_id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn update_money(
    surrogate_id: i64,
    field: &'static str,
    value: Option<Money>,
    conn: &mut SqliteConnection,
) -> Result<(), MirrorError> {
    sqlx::query(&format!("UPDATE orders SET {field} = $1 WHERE surrogate_id = $2"))
        .bind(value)
        .bind(surrogate_id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn update_timestamp(
    surrogate_id: i64,
    field: &'static str,
    value: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<(), MirrorError> {
    sqlx::query(&format!("UPDATE orders SET {field} = $1 WHERE surrogate_id = $2"))
        .bind(value)
        .bind(surrogate_id)
        .execute(conn)
        .await?;
    Ok(())
}

//--------------------------------------    read-back     ------------------------------------------------------------

pub async fn fetch_stored_order(
    surrogate_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<StoredOrder>, MirrorError> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE surrogate_id = $1")
        .bind(surrogate_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(order) = order else {
        return Ok(None);
    };
    let mut line_items: Vec<LineItem> = sqlx::query_as(
        "SELECT line_id, product_id, part_number_key, name, status, currency, vat, quantity, initial_qty, \
         storno_qty, sale_price, original_price, created, modified FROM line_items WHERE order_surrogate_id = $1 \
         ORDER BY line_id",
    )
    .bind(surrogate_id)
    .fetch_all(&mut *conn)
    .await?;
    for item in &mut line_items {
        item.voucher_splits = sqlx::query_as(
            "SELECT voucher_id, value, vat_value, vat, offered_by, voucher_name FROM line_voucher_splits WHERE \
             order_surrogate_id = $1 AND line_id = $2",
        )
        .bind(surrogate_id)
        .bind(item.line_id)
        .fetch_all(&mut *conn)
        .await?;
    }
    let vouchers: Vec<Voucher> = sqlx::query_as(
        "SELECT voucher_id, voucher_code, voucher_name, status, sale_price, sale_price_vat, vat, issue_date, \
         created, modified FROM vouchers WHERE order_surrogate_id = $1 ORDER BY voucher_id",
    )
    .bind(surrogate_id)
    .fetch_all(&mut *conn)
    .await?;
    let attachments: Vec<Attachment> = sqlx::query_as(
        "SELECT name, url, kind, force_download, visibility FROM attachments WHERE order_surrogate_id = $1 ORDER BY \
         url",
    )
    .bind(surrogate_id)
    .fetch_all(&mut *conn)
    .await?;
    let flags: Vec<Flag> =
        sqlx::query_as("SELECT flag, value FROM flags WHERE order_surrogate_id = $1 ORDER BY flag")
            .bind(surrogate_id)
            .fetch_all(&mut *conn)
            .await?;
    let shipping_tax_voucher_split: Vec<VoucherSplit> = sqlx::query_as(
        "SELECT voucher_id, value, vat_value, vat, offered_by, voucher_name FROM order_voucher_splits WHERE \
         order_surrogate_id = $1",
    )
    .bind(surrogate_id)
    .fetch_all(&mut *conn)
    .await?;
    let courier_accounts: Vec<String> =
        sqlx::query_scalar("SELECT courier FROM courier_accounts WHERE order_surrogate_id = $1 ORDER BY courier")
            .bind(surrogate_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(Some(StoredOrder { order, line_items, vouchers, attachments, flags, shipping_tax_voucher_split, courier_accounts }))
}

//--------------------------------------    dependents    ------------------------------------------------------------
// The marketplace assigns no stable identity to nested collection rows, so collections are treated
// as values: compared wholesale and replaced with delete-then-reinsert when they differ.

async fn insert_dependents(s: &OrderSnapshot, surrogate_id: i64, conn: &mut SqliteConnection) -> Result<(), MirrorError> {
    insert_line_items(&s.line_items, surrogate_id, &mut *conn).await?;
    insert_order_voucher_splits(&s.shipping_tax_voucher_split, surrogate_id, &mut *conn).await?;
    insert_attachments(&s.attachments, surrogate_id, &mut *conn).await?;
    insert_vouchers(&s.vouchers, surrogate_id, &mut *conn).await?;
    insert_flags(&s.flags, surrogate_id, &mut *conn).await?;
    insert_courier_accounts(&s.courier_accounts, surrogate_id, conn).await?;
    Ok(())
}

async fn update_dependents(
    snapshot: &OrderSnapshot,
    stored: &StoredOrder,
    surrogate_id: i64,
    replaced: &mut Vec<&'static str>,
    conn: &mut SqliteConnection,
) -> Result<(), MirrorError> {
    if sorted_flags(&stored.flags) != sorted_flags(&snapshot.flags) {
        delete_rows("flags", surrogate_id, &mut *conn).await?;
        insert_flags(&snapshot.flags, surrogate_id, &mut *conn).await?;
        replaced.push("flags");
    }
    if sorted_line_items(&stored.line_items) != sorted_line_items(&snapshot.line_items) {
        delete_rows("line_voucher_splits", surrogate_id, &mut *conn).await?;
        delete_rows("line_items", surrogate_id, &mut *conn).await?;
        insert_line_items(&snapshot.line_items, surrogate_id, &mut *conn).await?;
        replaced.push("line_items");
    }
    if sorted_attachments(&stored.attachments) != sorted_attachments(&snapshot.attachments) {
        delete_rows("attachments", surrogate_id, &mut *conn).await?;
        insert_attachments(&snapshot.attachments, surrogate_id, &mut *conn).await?;
        replaced.push("attachments");
    }
    if sorted_vouchers(&stored.vouchers) != sorted_vouchers(&snapshot.vouchers) {
        delete_rows("vouchers", surrogate_id, &mut *conn).await?;
        insert_vouchers(&snapshot.vouchers, surrogate_id, &mut *conn).await?;
        replaced.push("vouchers");
    }
    if sorted_splits(&stored.shipping_tax_voucher_split) != sorted_splits(&snapshot.shipping_tax_voucher_split) {
        delete_rows("order_voucher_splits", surrogate_id, &mut *conn).await?;
        insert_order_voucher_splits(&snapshot.shipping_tax_voucher_split, surrogate_id, &mut *conn).await?;
        replaced.push("shipping_tax_voucher_split");
    }
    let mut old_couriers = stored.courier_accounts.clone();
    let mut new_couriers = snapshot.courier_accounts.clone();
    old_couriers.sort();
    new_couriers.sort();
    if old_couriers != new_couriers {
        delete_rows("courier_accounts", surrogate_id, &mut *conn).await?;
        insert_courier_accounts(&snapshot.courier_accounts, surrogate_id, conn).await?;
        replaced.push("courier_accounts");
    }
    Ok(())
}

fn sorted_line_items(items: &[LineItem]) -> Vec<LineItem> {
    let mut v = items.to_vec();
    v.sort_by_key(|li| li.line_id);
    for item in &mut v {
        item.voucher_splits = sorted_splits(&item.voucher_splits);
    }
    v
}

fn sorted_splits(splits: &[VoucherSplit]) -> Vec<VoucherSplit> {
    let mut v = splits.to_vec();
    v.sort_by(|a, b| (a.voucher_id, &a.voucher_name).cmp(&(b.voucher_id, &b.voucher_name)));
    v
}

fn sorted_attachments(attachments: &[Attachment]) -> Vec<Attachment> {
    let mut v = attachments.to_vec();
    v.sort_by(|a, b| a.url.cmp(&b.url));
    v
}

fn sorted_vouchers(vouchers: &[Voucher]) -> Vec<Voucher> {
    let mut v = vouchers.to_vec();
    v.sort_by_key(|voucher| voucher.voucher_id);
    v
}

fn sorted_flags(flags: &[Flag]) -> Vec<Flag> {
    let mut v = flags.to_vec();
    v.sort_by(|a, b| a.flag.cmp(&b.flag));
    v
}

async fn delete_rows(table: &'static str, surrogate_id: i64, conn: &mut SqliteConnection) -> Result<(), MirrorError> {
    sqlx::query(&format!("DELETE FROM {table} WHERE order_surrogate_id = $1")).bind(surrogate_id).execute(conn).await?;
    Ok(())
}

async fn insert_line_items(
    items: &[LineItem],
    surrogate_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), MirrorError> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO line_items (
                line_id, order_surrogate_id, product_id, part_number_key, name, status, currency,
                vat, quantity, initial_qty, storno_qty, sale_price, original_price, created, modified
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (order_surrogate_id, line_id) DO NOTHING
            "#,
        )
        .bind(item.line_id)
        .bind(surrogate_id)
        .bind(item.product_id)
        .bind(&item.part_number_key)
        .bind(&item.name)
        .bind(item.status)
        .bind(&item.currency)
        .bind(&item.vat)
        .bind(item.quantity)
        .bind(item.initial_qty)
        .bind(item.storno_qty)
        .bind(item.sale_price)
        .bind(item.original_price)
        .bind(item.created)
        .bind(item.modified)
        .execute(&mut *conn)
        .await?;
        for split in &item.voucher_splits {
            sqlx::query(
                "INSERT INTO line_voucher_splits (order_surrogate_id, line_id, voucher_id, value, vat_value, vat, \
                 offered_by, voucher_name) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(surrogate_id)
            .bind(item.line_id)
            .bind(split.voucher_id)
            .bind(split.value)
            .bind(split.vat_value)
            .bind(&split.vat)
            .bind(&split.offered_by)
            .bind(&split.voucher_name)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

async fn insert_order_voucher_splits(
    splits: &[VoucherSplit],
    surrogate_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), MirrorError> {
    for split in splits {
        sqlx::query(
            "INSERT INTO order_voucher_splits (order_surrogate_id, voucher_id, value, vat_value, vat, offered_by, \
             voucher_name) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(surrogate_id)
        .bind(split.voucher_id)
        .bind(split.value)
        .bind(split.vat_value)
        .bind(&split.vat)
        .bind(&split.offered_by)
        .bind(&split.voucher_name)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_attachments(
    attachments: &[Attachment],
    surrogate_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), MirrorError> {
    for attachment in attachments {
        sqlx::query(
            "INSERT INTO attachments (order_surrogate_id, name, url, kind, force_download, visibility) VALUES ($1, \
             $2, $3, $4, $5, $6) ON CONFLICT (order_surrogate_id, url) DO NOTHING",
        )
        .bind(surrogate_id)
        .bind(&attachment.name)
        .bind(&attachment.url)
        .bind(attachment.kind)
        .bind(attachment.force_download)
        .bind(&attachment.visibility)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_vouchers(vouchers: &[Voucher], surrogate_id: i64, conn: &mut SqliteConnection) -> Result<(), MirrorError> {
    for voucher in vouchers {
        sqlx::query(
            "INSERT INTO vouchers (order_surrogate_id, voucher_id, voucher_code, voucher_name, status, sale_price, \
             sale_price_vat, vat, issue_date, created, modified) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, \
             $11) ON CONFLICT (order_surrogate_id, voucher_id) DO NOTHING",
        )
        .bind(surrogate_id)
        .bind(voucher.voucher_id)
        .bind(&voucher.voucher_code)
        .bind(&voucher.voucher_name)
        .bind(voucher.status)
        .bind(voucher.sale_price)
        .bind(voucher.sale_price_vat)
        .bind(voucher.vat)
        .bind(&voucher.issue_date)
        .bind(&voucher.created)
        .bind(&voucher.modified)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_flags(flags: &[Flag], surrogate_id: i64, conn: &mut SqliteConnection) -> Result<(), MirrorError> {
    for flag in flags {
        sqlx::query(
            "INSERT INTO flags (order_surrogate_id, flag, value) VALUES ($1, $2, $3) ON CONFLICT \
             (order_surrogate_id, flag) DO NOTHING",
        )
        .bind(surrogate_id)
        .bind(&flag.flag)
        .bind(&flag.value)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_courier_accounts(
    couriers: &[String],
    surrogate_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(), MirrorError> {
    for courier in couriers {
        sqlx::query(
            "INSERT INTO courier_accounts (order_surrogate_id, courier) VALUES ($1, $2) ON CONFLICT \
             (order_surrogate_id, courier) DO NOTHING",
        )
        .bind(surrogate_id)
        .bind(courier)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
