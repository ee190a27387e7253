use chrono::Utc;
use log::{debug, warn};
use sqlx::SqliteConnection;

use crate::{db_types::Task, traits::MirrorError};

/// Marks the start of a run. Re-starting an already-running task resets its started timestamp; the
/// termination fields are cleared so that [`is_running`] reports the task as live.
pub async fn start_task(name: &str, conn: &mut SqliteConnection) -> Result<(), MirrorError> {
    sqlx::query(
        "INSERT INTO tasks (name, started) VALUES ($1, $2) ON CONFLICT (name) DO UPDATE SET started = \
         excluded.started, terminated = NULL, duration_of_last_run = NULL",
    )
    .bind(name)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    debug!("📝️ Task '{name}' started");
    Ok(())
}

/// Marks the end of a run. An empty `error` records success, resetting the failure counter and
/// stamping `last_successful_run`; a non-empty `error` increments the counter and stores the
/// message.
pub async fn end_task(name: &str, error: &str, conn: &mut SqliteConnection) -> Result<(), MirrorError> {
    let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| MirrorError::TaskNotFound(name.to_string()))?;
    let now = Utc::now();
    let duration = task.started.map(|started| (now - started).num_seconds());
    if error.is_empty() {
        sqlx::query(
            "UPDATE tasks SET terminated = $2, duration_of_last_run = $3, last_successful_run = $2, \
             consecutive_failures = 0, last_error = NULL WHERE name = $1",
        )
        .bind(name)
        .bind(now)
        .bind(duration)
        .execute(conn)
        .await?;
        debug!("📝️ Task '{name}' completed in {}s", duration.unwrap_or_default());
    } else {
        sqlx::query(
            "UPDATE tasks SET terminated = $2, duration_of_last_run = $3, consecutive_failures = \
             consecutive_failures + 1, last_error = $4 WHERE name = $1",
        )
        .bind(name)
        .bind(now)
        .bind(duration)
        .bind(error)
        .execute(conn)
        .await?;
        warn!("📝️ Task '{name}' failed: {error}");
    }
    Ok(())
}

pub async fn is_running(name: &str, conn: &mut SqliteConnection) -> Result<bool, MirrorError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE name = $1 AND started IS NOT NULL AND terminated IS NULL",
    )
    .bind(name)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

pub async fn fetch_task(name: &str, conn: &mut SqliteConnection) -> Result<Option<Task>, MirrorError> {
    let task = sqlx::query_as("SELECT * FROM tasks WHERE name = $1").bind(name).fetch_optional(conn).await?;
    Ok(task)
}

pub async fn all_tasks(conn: &mut SqliteConnection) -> Result<Vec<Task>, MirrorError> {
    let tasks = sqlx::query_as("SELECT * FROM tasks ORDER BY name").fetch_all(conn).await?;
    Ok(tasks)
}
