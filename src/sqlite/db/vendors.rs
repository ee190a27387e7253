use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::Vendor, traits::MirrorError};

pub async fn fetch_vendor_by_name(name: &str, conn: &mut SqliteConnection) -> Result<Option<Vendor>, MirrorError> {
    let vendor = sqlx::query_as("SELECT * FROM vendors WHERE name = $1").bind(name).fetch_optional(conn).await?;
    Ok(vendor)
}

/// Fetches the vendor row for `name`, inserting it on first use.
pub async fn fetch_or_create_vendor(
    name: &str,
    is_fbe: bool,
    account: &str,
    conn: &mut SqliteConnection,
) -> Result<Vendor, MirrorError> {
    if let Some(vendor) = fetch_vendor_by_name(name, conn).await? {
        return Ok(vendor);
    }
    // DO UPDATE keeps RETURNING populated when a concurrent caller wins the insert
    let vendor: Vendor = sqlx::query_as(
        "INSERT INTO vendors (name, is_fbe, account) VALUES ($1, $2, $3) ON CONFLICT (name) DO UPDATE SET name = \
         excluded.name RETURNING *",
    )
    .bind(name)
    .bind(is_fbe)
    .bind(account)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Vendor '{name}' registered with id {}", vendor.id);
    Ok(vendor)
}

/// The most recent fetch timestamp recorded for an account alias. Both vendor variants of an
/// account (FBE and non-FBE) share the alias, so the newest of their timestamps wins.
pub async fn last_fetch(account: &str, conn: &mut SqliteConnection) -> Result<Option<DateTime<Utc>>, MirrorError> {
    let fetched_at: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT MAX(last_fetch) FROM vendors WHERE account = $1")
            .bind(account)
            .fetch_one(conn)
            .await?;
    Ok(fetched_at)
}

pub async fn update_last_fetch(
    account: &str,
    fetched_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), MirrorError> {
    sqlx::query("UPDATE vendors SET last_fetch = $1 WHERE account = $2")
        .bind(fetched_at)
        .bind(account)
        .execute(conn)
        .await?;
    Ok(())
}
