//! The high-level mirror API.
//!
//! [`OrderMirrorApi`] wraps a storage backend and exposes the operations the fetch/reconcile
//! scheduler drives: batch merging of order snapshots, GMV reconciliation, and the task ledger.
//! It is generic over the backend so that tests can substitute one, but in practice the backend is
//! [`crate::SqliteDatabase`].

use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use log::{error, info};
use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderSnapshot, OrderStatus, Product, ProductGmv, StoredOrder, Task, Vendor},
    reconcile,
    traits::{
        GmvStore,
        GmvWriteStats,
        MergeOutcome,
        MirrorError,
        OrderMirrorDatabase,
        TaskLedger,
        UnhandledDifference,
    },
};

#[derive(Debug, Error)]
pub enum MirrorApiError {
    #[error("Mirror error: {0}")]
    Mirror(#[from] MirrorError),
    /// The difference hook asked for the batch to stop.
    #[error("Merge batch halted by the operator after order {0}")]
    HaltedByOperator(OrderId),
}

/// What the difference hook wants done with the rest of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    Continue,
    Halt,
}

/// An order that merged with leftover differences the engine has no handling for. The stored row
/// was updated for all handled fields; the listed differences were NOT applied.
#[derive(Debug, Clone)]
pub struct UnhandledDifferenceEvent {
    pub vendor_name: String,
    pub order_id: OrderId,
    pub differences: Vec<UnhandledDifference>,
}

impl Display for UnhandledDifferenceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Order {} (vendor {}) has unhandled differences:", self.order_id, self.vendor_name)?;
        for diff in &self.differences {
            writeln!(f, "  {diff}")?;
        }
        Ok(())
    }
}

/// Called whenever a merge surfaces unhandled differences, before the batch moves on. The default
/// hook logs the event and continues.
pub type DifferenceHook = Arc<dyn Fn(&UnhandledDifferenceEvent) -> MergeDecision + Send + Sync>;

/// Outcome tally of one [`OrderMirrorApi::merge_batch`] call.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Orders whose merge failed, with the error. A failure never aborts the rest of the batch.
    pub failed: Vec<(OrderId, MirrorError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.unchanged + self.failed.len()
    }
}

pub struct OrderMirrorApi<B> {
    db: B,
    on_unhandled: DifferenceHook,
}

impl<B: Clone> Clone for OrderMirrorApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), on_unhandled: Arc::clone(&self.on_unhandled) }
    }
}

impl<B> OrderMirrorApi<B> {
    pub fn new(db: B) -> Self {
        let on_unhandled: DifferenceHook = Arc::new(|event: &UnhandledDifferenceEvent| {
            info!("🔄️ {event}");
            MergeDecision::Continue
        });
        Self { db, on_unhandled }
    }

    /// Replaces the unhandled-difference hook. The hook runs synchronously inside the batch loop,
    /// so a [`MergeDecision::Halt`] stops before the next order is touched.
    pub fn with_difference_hook(mut self, hook: DifferenceHook) -> Self {
        self.on_unhandled = hook;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderMirrorApi<B>
where B: OrderMirrorDatabase
{
    pub async fn fetch_or_create_vendor(&self, name: &str, is_fbe: bool, account: &str) -> Result<Vendor, MirrorApiError> {
        Ok(self.db.fetch_or_create_vendor(name, is_fbe, account).await?)
    }

    pub async fn update_last_fetch(&self, account: &str, fetched_at: DateTime<Utc>) -> Result<(), MirrorApiError> {
        Ok(self.db.update_last_fetch(account, fetched_at).await?)
    }

    pub async fn last_fetch(&self, account: &str) -> Result<Option<DateTime<Utc>>, MirrorApiError> {
        Ok(self.db.last_fetch(account).await?)
    }

    pub async fn upsert_product(&self, product: &Product) -> Result<(), MirrorApiError> {
        Ok(self.db.upsert_product(product).await?)
    }

    pub async fn merge_order(&self, snapshot: &OrderSnapshot, vendor_id: i64) -> Result<MergeOutcome, MirrorApiError> {
        Ok(self.db.merge_order(snapshot, vendor_id).await?)
    }

    pub async fn fetch_order(
        &self,
        order_id: &OrderId,
        vendor_id: i64,
        status: OrderStatus,
    ) -> Result<Option<StoredOrder>, MirrorApiError> {
        Ok(self.db.fetch_order(order_id, vendor_id, status).await?)
    }

    /// Merges a fetched batch of snapshots for one vendor.
    ///
    /// Each order is merged in its own transaction; a failed order is recorded in the report and
    /// the batch continues. Unhandled differences are passed to the difference hook, which may
    /// halt the batch.
    pub async fn merge_batch(&self, vendor: &Vendor, snapshots: &[OrderSnapshot]) -> Result<BatchReport, MirrorApiError> {
        let mut report = BatchReport::default();
        for snapshot in snapshots {
            match self.db.merge_order(snapshot, vendor.id).await {
                Ok(outcome) => {
                    let unhandled = outcome.unhandled().to_vec();
                    if !unhandled.is_empty() {
                        let event = UnhandledDifferenceEvent {
                            vendor_name: vendor.name.clone(),
                            order_id: snapshot.id.clone(),
                            differences: unhandled,
                        };
                        if (self.on_unhandled)(&event) == MergeDecision::Halt {
                            return Err(MirrorApiError::HaltedByOperator(snapshot.id.clone()));
                        }
                    }
                    match outcome {
                        MergeOutcome::Inserted { .. } => report.inserted += 1,
                        MergeOutcome::Updated { .. } => report.updated += 1,
                        MergeOutcome::Unchanged { .. } => report.unchanged += 1,
                    }
                },
                Err(e) => {
                    error!("🔄️ Order {} of vendor '{}' failed to merge: {e}", snapshot.id, vendor.name);
                    report.failed.push((snapshot.id.clone(), e));
                },
            }
        }
        info!(
            "🔄️ Batch for '{}': {} inserted, {} updated, {} unchanged, {} failed",
            vendor.name,
            report.inserted,
            report.updated,
            report.unchanged,
            report.failed.len()
        );
        Ok(report)
    }
}

impl<B> OrderMirrorApi<B>
where B: OrderMirrorDatabase + GmvStore
{
    /// Recomputes and persists monthly GMV for one product over `[from, until)`.
    ///
    /// Pulls the finalized/storno line-item states from the mirror, pairs and folds them into
    /// monthly totals, and writes the totals back idempotently.
    pub async fn update_gmv(
        &self,
        product_code: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<GmvWriteStats, MirrorApiError> {
        let states = self.db.line_item_states(product_code, from, until).await?;
        let totals = reconcile::gmv_by_month(&states)?;
        let stats = self.db.store_gmv(product_code, &totals).await?;
        info!(
            "📊 GMV for '{product_code}' over [{from}, {until}): {} inserted, {} updated, {} unchanged",
            stats.inserted, stats.updated, stats.skipped
        );
        Ok(stats)
    }

    pub async fn gmv_for_month(&self, month: NaiveDate) -> Result<Vec<ProductGmv>, MirrorApiError> {
        Ok(self.db.gmv_for_month(month).await?)
    }
}

impl<B> OrderMirrorApi<B>
where B: TaskLedger
{
    pub async fn start_task(&self, name: &str) -> Result<(), MirrorApiError> {
        Ok(self.db.start_task(name).await?)
    }

    pub async fn end_task(&self, name: &str, error: &str) -> Result<(), MirrorApiError> {
        Ok(self.db.end_task(name, error).await?)
    }

    pub async fn is_running(&self, name: &str) -> Result<bool, MirrorApiError> {
        Ok(self.db.is_running(name).await?)
    }

    pub async fn all_tasks(&self) -> Result<Vec<Task>, MirrorApiError> {
        Ok(self.db.all_tasks().await?)
    }
}
