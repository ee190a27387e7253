mod support;

use market_mirror_engine::{MirrorApiError, MirrorError, OrderMirrorApi};
use support::prepare_test_env;

#[tokio::test]
async fn a_successful_run_round_trips() {
    let api = OrderMirrorApi::new(prepare_test_env().await);
    api.start_task("fetch-orders").await.unwrap();
    assert!(api.is_running("fetch-orders").await.unwrap());

    api.end_task("fetch-orders", "").await.unwrap();
    assert!(!api.is_running("fetch-orders").await.unwrap());
    let task = api.db().fetch_task("fetch-orders").await.unwrap().unwrap();
    assert!(task.terminated.is_some());
    assert!(task.last_successful_run.is_some());
    assert!(task.duration_of_last_run.unwrap() >= 0);
    assert_eq!(task.consecutive_failures, 0);
    assert_eq!(task.last_error, None);
}

#[tokio::test]
async fn failures_accumulate_until_a_success() {
    let api = OrderMirrorApi::new(prepare_test_env().await);
    for _ in 0..2 {
        api.start_task("update-gmv").await.unwrap();
        api.end_task("update-gmv", "marketplace timed out").await.unwrap();
    }
    let task = api.db().fetch_task("update-gmv").await.unwrap().unwrap();
    assert_eq!(task.consecutive_failures, 2);
    assert_eq!(task.last_error.as_deref(), Some("marketplace timed out"));
    assert_eq!(task.last_successful_run, None);

    api.start_task("update-gmv").await.unwrap();
    api.end_task("update-gmv", "").await.unwrap();
    let task = api.db().fetch_task("update-gmv").await.unwrap().unwrap();
    assert_eq!(task.consecutive_failures, 0);
    assert_eq!(task.last_error, None);
    assert!(task.last_successful_run.is_some());
}

#[tokio::test]
async fn restarting_a_task_clears_its_termination() {
    let api = OrderMirrorApi::new(prepare_test_env().await);
    api.start_task("fetch-orders").await.unwrap();
    api.end_task("fetch-orders", "").await.unwrap();

    api.start_task("fetch-orders").await.unwrap();
    assert!(api.is_running("fetch-orders").await.unwrap());
    let task = api.db().fetch_task("fetch-orders").await.unwrap().unwrap();
    assert_eq!(task.terminated, None);
    assert_eq!(task.duration_of_last_run, None);
}

#[tokio::test]
async fn ending_an_unknown_task_is_an_error() {
    let api = OrderMirrorApi::new(prepare_test_env().await);
    let err = api.end_task("no-such-task", "").await.unwrap_err();
    assert!(matches!(err, MirrorApiError::Mirror(MirrorError::TaskNotFound(_))));
}

#[tokio::test]
async fn all_tasks_lists_every_registered_task() {
    let api = OrderMirrorApi::new(prepare_test_env().await);
    api.start_task("fetch-orders").await.unwrap();
    api.start_task("update-gmv").await.unwrap();
    let tasks = api.all_tasks().await.unwrap();
    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["fetch-orders", "update-gmv"]);
}
