use crate::{db_types::Task, traits::MirrorError};

/// Persisted per-task state machine consulted by the external scheduler loop.
///
/// This is not a distributed lock: `start_task` on a task that is already running simply resets its
/// start time. A single scheduler process is assumed.
#[allow(async_fn_in_trait)]
pub trait TaskLedger: Clone {
    /// Marks the named task as started now. Upserts by name; clears the previous termination and
    /// duration.
    async fn start_task(&self, name: &str) -> Result<(), MirrorError>;

    /// Marks the named task as terminated now and records the run duration. An empty `error` counts
    /// as success: the failure counter resets and `last_successful_run` is stamped. A non-empty
    /// `error` increments the failure counter and leaves `last_successful_run` untouched.
    async fn end_task(&self, name: &str, error: &str) -> Result<(), MirrorError>;

    /// True iff the task has started and not yet terminated.
    async fn is_running(&self, name: &str) -> Result<bool, MirrorError>;

    async fn all_tasks(&self) -> Result<Vec<Task>, MirrorError>;
}
