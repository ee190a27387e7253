use std::collections::HashMap;

use chrono::NaiveDate;

use crate::{
    db_types::ProductGmv,
    helpers::Money,
    traits::{GmvWriteStats, MirrorError},
};

/// Reads and idempotent writes of the per-(product, month) GMV aggregate.
#[allow(async_fn_in_trait)]
pub trait GmvStore: Clone {
    /// All stored monthly totals for one product.
    async fn gmv_for_product(&self, product_code: &str) -> Result<HashMap<NaiveDate, Money>, MirrorError>;

    /// The stored totals of all products for one month; the shape the reporting layer consumes.
    async fn gmv_for_month(&self, month: NaiveDate) -> Result<Vec<ProductGmv>, MirrorError>;

    /// Persists newly computed monthly totals for a product. Each total is rounded to the 2-decimal
    /// monetary scale (half-to-even) and then compared with the stored aggregate: absent months are
    /// inserted, differing months updated in place, equal months skipped.
    async fn store_gmv(
        &self,
        product_code: &str,
        totals: &HashMap<NaiveDate, Money>,
    ) -> Result<GmvWriteStats, MirrorError>;
}
