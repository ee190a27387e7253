//! Market Mirror Engine
//!
//! A library that maintains a local, queryable mirror of the orders held by a remote marketplace and
//! derives a monthly Gross Merchandise Value (GMV) aggregate from that mirror. The marketplace is the
//! source of truth: the mirror converges towards it through repeated, idempotent merge passes over
//! order snapshots delivered by an external fetcher.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should
//!    never need to access the database directly; use the public API instead. The exception is the
//!    data types used in the database, which are defined in the `db_types` module and are public.
//! 2. The backend contract ([`mod@traits`]). Backends implement [`OrderMirrorDatabase`],
//!    [`GmvStore`] and [`TaskLedger`] in order to drive the engine.
//! 3. The public API ([`OrderMirrorApi`]). It orchestrates batch merges (with per-order failure
//!    isolation and the unhandled-difference decision hook), GMV recomputation and the task ledger.
//!
//! The reconciliation algorithm itself lives in [`mod@reconcile`] and is a pure function over
//! line-item states, so it can be tested without any storage.
mod api;

pub mod db_types;
pub mod helpers;
pub mod reconcile;
pub mod traits;

#[cfg(feature = "test_utils")]
pub mod test_utils;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use api::{BatchReport, DifferenceHook, MergeDecision, MirrorApiError, OrderMirrorApi, UnhandledDifferenceEvent};
pub use traits::{GmvStore, GmvWriteStats, MergeOutcome, MirrorError, OrderMirrorDatabase, TaskLedger, UnhandledDifference};
