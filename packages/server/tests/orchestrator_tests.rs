//! Integration tests for the task orchestrator.
//!
//! Exercises the public orchestrator surface with mock dependencies:
//! - manual triggers run the task body and write the ledger
//! - failures are recorded and isolated from other tasks
//! - a task never runs concurrently with itself
//! - startup catches up tasks that missed their schedule

use chrono::{Duration, Utc};
use radar_core::kernel::test_dependencies::MockJobIngestor;
use radar_core::kernel::{TaskName, TaskOrchestrator, TaskRun, TaskState, TestDependencies};

// =============================================================================
// Test Helpers
// =============================================================================

/// A ledger row whose last run started and succeeded `age` ago.
fn ledger_row(task: TaskName, age: Duration) -> TaskRun {
    let at = Utc::now() - age;
    TaskRun {
        task,
        last_started_at: Some(at),
        last_succeeded_at: Some(at),
        last_error: None,
        updated_at: at,
    }
}

// =============================================================================
// Manual triggers
// =============================================================================

#[tokio::test]
async fn trigger_now_runs_the_task_and_records_success() {
    let deps = TestDependencies::new().mock_ingestor(MockJobIngestor::new().with_jobs_found(5));
    let orchestrator = TaskOrchestrator::new(deps.deps());

    for (_, state) in orchestrator.task_states() {
        assert_eq!(state, TaskState::Scheduled);
    }

    orchestrator
        .trigger_now(TaskName::Ingest)
        .await
        .expect("manual ingest trigger failed");

    assert_eq!(deps.ingestor.collection_runs(), 1);

    let run = deps
        .store
        .ledger_entry(TaskName::Ingest)
        .expect("ledger row missing after run");
    assert!(run.last_started_at.is_some());
    assert!(run.last_succeeded_at.is_some());
    assert!(run.last_error.is_none());

    let states: Vec<TaskState> = orchestrator
        .task_states()
        .into_iter()
        .filter(|(task, _)| *task == TaskName::Ingest)
        .map(|(_, state)| state)
        .collect();
    assert_eq!(states, vec![TaskState::Succeeded]);
}

#[tokio::test]
async fn trigger_now_ignores_the_pause_flag() {
    let deps = TestDependencies::new();
    let orchestrator = TaskOrchestrator::new(deps.deps());

    orchestrator.pause(TaskName::Ingest);
    orchestrator
        .trigger_now(TaskName::Ingest)
        .await
        .expect("manual trigger of a paused task failed");

    assert_eq!(deps.ingestor.collection_runs(), 1);
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn failing_task_records_error_and_leaves_other_tasks_untouched() {
    let deps = TestDependencies::new().mock_ingestor(MockJobIngestor::failing());
    let orchestrator = TaskOrchestrator::new(deps.deps());

    let err = orchestrator
        .trigger_now(TaskName::Ingest)
        .await
        .expect_err("failing ingestor must surface an error");
    assert!(err.to_string().contains("mock ingestion service unavailable"));

    let run = deps
        .store
        .ledger_entry(TaskName::Ingest)
        .expect("ledger row missing after failed run");
    assert!(run.last_started_at.is_some());
    assert!(run.last_succeeded_at.is_none());
    let error = run.last_error.expect("failed run must record its error");
    assert!(error.contains("mock ingestion service unavailable"));

    let ingest_state = orchestrator
        .task_states()
        .into_iter()
        .find(|(task, _)| *task == TaskName::Ingest)
        .map(|(_, state)| state);
    assert_eq!(ingest_state, Some(TaskState::Failed));

    // A broken ingestor has no bearing on the enrichment task.
    orchestrator
        .trigger_now(TaskName::Enrich)
        .await
        .expect("enrich trigger failed");
    assert_eq!(deps.enricher.enrichment_runs(), 1);
}

// =============================================================================
// Single-flight
// =============================================================================

#[tokio::test]
async fn concurrent_triggers_of_the_same_task_fail_fast() {
    let deps = TestDependencies::new().mock_ingestor(MockJobIngestor::new().with_delay_ms(100));
    let orchestrator = TaskOrchestrator::new(deps.deps());

    let (first, second) = tokio::join!(
        orchestrator.trigger_now(TaskName::Ingest),
        orchestrator.trigger_now(TaskName::Ingest),
    );

    let failures: Vec<String> = [&first, &second]
        .iter()
        .filter_map(|r| r.as_ref().err().map(|e| e.to_string()))
        .collect();
    assert_eq!(failures.len(), 1, "exactly one trigger must lose the race");
    assert!(failures[0].contains("already running"));
    assert_eq!(deps.ingestor.collection_runs(), 1);
}

// =============================================================================
// Startup catch-up
// =============================================================================

#[tokio::test]
async fn start_catches_up_tasks_that_missed_their_schedule() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    // Alert check is two cadences overdue; everything else ran recently.
    store.seed_task_run(ledger_row(TaskName::AlertCheck, Duration::hours(2)));
    store.seed_task_run(ledger_row(TaskName::Ingest, Duration::minutes(1)));
    store.seed_task_run(ledger_row(TaskName::Enrich, Duration::minutes(1)));
    store.seed_task_run(ledger_row(TaskName::Dispatch, Duration::minutes(1)));
    store.seed_task_run(ledger_row(TaskName::Cleanup, Duration::minutes(1)));
    store.seed_task_run(ledger_row(TaskName::Report, Duration::minutes(1)));

    let orchestrator = TaskOrchestrator::new(deps.deps());
    orchestrator.start().await.expect("orchestrator start failed");

    let run = store
        .ledger_entry(TaskName::AlertCheck)
        .expect("alert check ledger row missing");
    let succeeded_at = run
        .last_succeeded_at
        .expect("catch-up run must record success");
    assert!(
        Utc::now() - succeeded_at < Duration::minutes(1),
        "alert check must have re-run during startup"
    );

    // On-schedule tasks were not re-run.
    assert_eq!(deps.ingestor.collection_runs(), 0);
    assert_eq!(deps.enricher.enrichment_runs(), 0);

    orchestrator.stop().await.expect("orchestrator stop failed");
}
