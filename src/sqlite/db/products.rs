use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{LineItemState, OrderId, OrderStatus, Product},
    helpers::Money,
    traits::MirrorError,
};

pub async fn fetch_product(product_code: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, MirrorError> {
    let product = sqlx::query_as("SELECT product_code, name, pnk FROM products WHERE product_code = $1")
        .bind(product_code)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

/// Registers a catalog entry, or refreshes the name and listing key of an existing one. The
/// PNK binding is what ties marketplace line items back to our product codes, so re-binding a
/// product to a new listing takes effect on the next reconciliation run.
pub async fn upsert_product(product: &Product, conn: &mut SqliteConnection) -> Result<(), MirrorError> {
    sqlx::query(
        "INSERT INTO products (product_code, name, pnk) VALUES ($1, $2, $3) ON CONFLICT (product_code) DO UPDATE \
         SET name = excluded.name, pnk = excluded.pnk",
    )
    .bind(&product.product_code)
    .bind(&product.name)
    .bind(&product.pnk)
    .execute(conn)
    .await?;
    debug!("🗃️ Product '{}' registered", product.product_code);
    Ok(())
}

pub async fn all_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, MirrorError> {
    let products =
        sqlx::query_as("SELECT product_code, name, pnk FROM products ORDER BY product_code").fetch_all(conn).await?;
    Ok(products)
}

#[derive(FromRow)]
struct LineItemStateRow {
    order_id: String,
    surrogate_id: i64,
    order_date: DateTime<Utc>,
    status: OrderStatus,
    line_id: i64,
    product_name: String,
    quantity: i64,
    initial_qty: i64,
    storno_qty: i64,
    sale_price: Money,
    vat: Option<String>,
}

/// All finalized and storno line-item observations for one product inside the half-open date
/// window `[from, until)`. The unit price is made VAT-inclusive here, so downstream aggregation
/// never touches VAT again.
pub async fn line_item_states(
    product_code: &str,
    from: NaiveDate,
    until: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<Vec<LineItemState>, MirrorError> {
    let rows: Vec<LineItemStateRow> = sqlx::query_as(
        r#"
        SELECT o.order_id AS order_id,
               o.surrogate_id AS surrogate_id,
               o.order_date AS order_date,
               o.status AS status,
               li.line_id AS line_id,
               p.name AS product_name,
               li.quantity AS quantity,
               li.initial_qty AS initial_qty,
               li.storno_qty AS storno_qty,
               li.sale_price AS sale_price,
               li.vat AS vat
        FROM line_items li
        JOIN products p ON p.pnk = li.part_number_key
        JOIN orders o ON o.surrogate_id = li.order_surrogate_id
        WHERE p.product_code = $1
          AND o.status IN ($2, $3)
          AND o.order_date IS NOT NULL
          AND o.order_date >= $4
          AND o.order_date < $5
        ORDER BY o.order_id, o.status
        "#,
    )
    .bind(product_code)
    .bind(OrderStatus::Finalized)
    .bind(OrderStatus::Storno)
    .bind(from)
    .bind(until)
    .fetch_all(conn)
    .await?;
    rows.into_iter()
        .map(|row| {
            let vat_rate = match &row.vat {
                Some(raw) => Decimal::from_str(raw).map_err(|e| {
                    MirrorError::InvalidStoredValue(format!(
                        "order {} line {} has an unparseable VAT rate '{raw}': {e}",
                        row.order_id, row.line_id
                    ))
                })?,
                None => Decimal::ZERO,
            };
            Ok(LineItemState {
                order_id: OrderId::from(row.order_id),
                surrogate_id: row.surrogate_id,
                order_date: row.order_date.date_naive(),
                order_status: row.status,
                line_id: row.line_id,
                product_name: row.product_name,
                quantity: row.quantity,
                initial_qty: row.initial_qty,
                storno_qty: row.storno_qty,
                price: row.sale_price.with_vat(vat_rate),
            })
        })
        .collect()
}
