use std::collections::HashMap;

use chrono::NaiveDate;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::ProductGmv,
    helpers::Money,
    traits::{GmvWriteStats, MirrorError},
};

/// The persisted GMV series for one product, keyed by month (first day of the month).
pub async fn gmv_for_product(
    product_code: &str,
    conn: &mut SqliteConnection,
) -> Result<HashMap<NaiveDate, Money>, MirrorError> {
    let rows: Vec<(NaiveDate, Money)> = sqlx::query_as("SELECT month, gmv FROM gmv WHERE product_code = $1")
        .bind(product_code)
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().collect())
}

/// The GMV of every product for one month, joined with the catalog for display names.
pub async fn gmv_for_month(month: NaiveDate, conn: &mut SqliteConnection) -> Result<Vec<ProductGmv>, MirrorError> {
    let rows = sqlx::query_as(
        "SELECT g.product_code AS product_code, p.name AS name, g.month AS month, g.gmv AS gmv FROM gmv g JOIN \
         products p ON p.product_code = g.product_code WHERE g.month = $1 ORDER BY g.product_code",
    )
    .bind(month)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Writes a freshly computed GMV series for one product. Amounts are rounded to the monetary
/// scale before comparison, so a re-run over unchanged data writes nothing.
pub async fn store_gmv(
    product_code: &str,
    gmv: &HashMap<NaiveDate, Money>,
    conn: &mut SqliteConnection,
) -> Result<GmvWriteStats, MirrorError> {
    let stored = gmv_for_product(product_code, &mut *conn).await?;
    let mut stats = GmvWriteStats::default();
    for (&month, &amount) in gmv {
        let amount = amount.round_2();
        match stored.get(&month) {
            None => {
                sqlx::query("INSERT INTO gmv (product_code, month, gmv) VALUES ($1, $2, $3)")
                    .bind(product_code)
                    .bind(month)
                    .bind(amount)
                    .execute(&mut *conn)
                    .await?;
                stats.inserted += 1;
            },
            Some(&current) if current != amount => {
                debug!("📊 GMV for {product_code} in {month} changed from {current} to {amount}");
                sqlx::query("UPDATE gmv SET gmv = $3 WHERE product_code = $1 AND month = $2")
                    .bind(product_code)
                    .bind(month)
                    .bind(amount)
                    .execute(&mut *conn)
                    .await?;
                stats.updated += 1;
            },
            Some(_) => {
                stats.skipped += 1;
            },
        }
    }
    Ok(stats)
}
