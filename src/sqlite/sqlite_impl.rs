use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use sqlx::SqlitePool;

use crate::{
    db_types::{LineItemState, OrderId, OrderSnapshot, OrderStatus, Product, ProductGmv, StoredOrder, Task, Vendor},
    helpers::Money,
    sqlite::db::{self, customers, gmv, orders, products, tasks, vendors},
    traits::{GmvStore, GmvWriteStats, MergeOutcome, MirrorError, OrderMirrorDatabase, TaskLedger},
};

/// The SQLite mirror backend. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabase").field("url", &self.url).finish()
    }
}

impl SqliteDatabase {
    /// Creates a new database connection pool using `MIRROR_DATABASE_URL`, or the default URL.
    pub async fn new(max_connections: u32) -> Result<Self, MirrorError> {
        let url = db::db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, MirrorError> {
        let pool = db::new_pool(url, max_connections).await?;
        debug!("🗃️ Connected to database at {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderMirrorDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_or_create_vendor(&self, name: &str, is_fbe: bool, account: &str) -> Result<Vendor, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        vendors::fetch_or_create_vendor(name, is_fbe, account, &mut conn).await
    }

    async fn update_last_fetch(&self, account: &str, fetched_at: DateTime<Utc>) -> Result<(), MirrorError> {
        let mut conn = self.pool.acquire().await?;
        vendors::update_last_fetch(account, fetched_at, &mut conn).await
    }

    async fn last_fetch(&self, account: &str) -> Result<Option<DateTime<Utc>>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        vendors::last_fetch(account, &mut conn).await
    }

    async fn merge_order(&self, snapshot: &OrderSnapshot, vendor_id: i64) -> Result<MergeOutcome, MirrorError> {
        let mut tx = self.pool.begin().await?;
        let outcome = orders::merge_order(snapshot, vendor_id, &mut tx).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn fetch_order(
        &self,
        order_id: &OrderId,
        vendor_id: i64,
        status: OrderStatus,
    ) -> Result<Option<StoredOrder>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, vendor_id, status, &mut conn).await
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), MirrorError> {
        let mut conn = self.pool.acquire().await?;
        products::upsert_product(product, &mut conn).await
    }

    async fn line_item_states(
        &self,
        product_code: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<LineItemState>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        products::line_item_states(product_code, from, until, &mut conn).await
    }
}

impl GmvStore for SqliteDatabase {
    async fn gmv_for_product(&self, product_code: &str) -> Result<HashMap<NaiveDate, Money>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        gmv::gmv_for_product(product_code, &mut conn).await
    }

    async fn gmv_for_month(&self, month: NaiveDate) -> Result<Vec<ProductGmv>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        gmv::gmv_for_month(month, &mut conn).await
    }

    async fn store_gmv(
        &self,
        product_code: &str,
        totals: &HashMap<NaiveDate, Money>,
    ) -> Result<GmvWriteStats, MirrorError> {
        let mut tx = self.pool.begin().await?;
        let stats = gmv::store_gmv(product_code, totals, &mut tx).await?;
        tx.commit().await?;
        Ok(stats)
    }
}

impl TaskLedger for SqliteDatabase {
    async fn start_task(&self, name: &str) -> Result<(), MirrorError> {
        let mut conn = self.pool.acquire().await?;
        tasks::start_task(name, &mut conn).await
    }

    async fn end_task(&self, name: &str, error: &str) -> Result<(), MirrorError> {
        let mut tx = self.pool.begin().await?;
        tasks::end_task(name, error, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn is_running(&self, name: &str) -> Result<bool, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        tasks::is_running(name, &mut conn).await
    }

    async fn all_tasks(&self) -> Result<Vec<Task>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        tasks::all_tasks(&mut conn).await
    }
}

impl SqliteDatabase {
    /// Convenience read used by reporting: the current catalog, sorted by product code.
    pub async fn all_products(&self) -> Result<Vec<Product>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        products::all_products(&mut conn).await
    }

    pub async fn fetch_product(&self, product_code: &str) -> Result<Option<Product>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(product_code, &mut conn).await
    }

    pub async fn fetch_locker(&self, locker_id: &str) -> Result<Option<crate::db_types::LockerDetails>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        let locker = sqlx::query_as("SELECT * FROM lockers WHERE locker_id = $1")
            .bind(locker_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(locker)
    }

    /// All stored status rows for one marketplace order id.
    pub async fn fetch_order_rows(&self, order_id: &OrderId, vendor_id: i64) -> Result<Vec<crate::db_types::Order>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_rows(order_id, vendor_id, &mut conn).await
    }

    /// The stored customer row, if any. Mostly useful in tests and diagnostics.
    pub async fn fetch_customer(&self, id: i64) -> Result<Option<crate::db_types::Customer>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        let customer = sqlx::query_as("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(customer)
    }

    pub async fn fetch_task(&self, name: &str) -> Result<Option<Task>, MirrorError> {
        let mut conn = self.pool.acquire().await?;
        tasks::fetch_task(name, &mut conn).await
    }

    pub async fn upsert_customer(&self, customer: &crate::db_types::Customer) -> Result<(), MirrorError> {
        let mut conn = self.pool.acquire().await?;
        customers::upsert_customer(customer, &mut conn).await
    }
}
