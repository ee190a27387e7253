//! The backend contract of the mirror engine.
//!
//! These traits define the behaviour a storage backend must expose in order to drive the engine:
//!
//! * [`OrderMirrorDatabase`] covers vendor/catalog bookkeeping and the per-order merge algorithm.
//! * [`GmvStore`] covers reads and idempotent writes of the monthly GMV aggregate.
//! * [`TaskLedger`] is the persisted state machine that tracks periodic job runs.
//!
//! The concrete SQLite backend in [`crate::SqliteDatabase`] implements all three.
mod data_objects;
mod gmv_store;
mod mirror_database;
mod task_ledger;

pub use data_objects::{GmvWriteStats, MergeOutcome, UnhandledDifference};
pub use gmv_store::GmvStore;
pub use mirror_database::{MirrorError, OrderMirrorDatabase};
pub use task_ledger::TaskLedger;
