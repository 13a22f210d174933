//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Six tasks run on fixed UTC cadences:
//! - Ingest (every 6h) and enrich (every 6h, offset 15m) poke the
//!   external pipeline services
//! - Alert check (hourly) runs the detection engine over the last hour
//! - Dispatch (every 15m) drains the notification backlog
//! - Cleanup (daily 03:00) and report (daily 09:00) do housekeeping
//!
//! # Architecture
//!
//! The [`TaskOrchestrator`] owns the cron scheduler and one guard slot
//! per task. A slot enforces single-flight (a firing that catches the
//! previous run still going is skipped, not queued) and tracks the
//! task's state machine. Every run is recorded in the `task_runs`
//! ledger; at startup the ledger drives one coalesced catch-up run for
//! each task whose schedule was missed while the process was down.
//!
//! ```text
//! Orchestrator
//!     │ start() ──► catch-up pass ──► cron jobs registered
//!     │                                   │ (every firing)
//!     │                                   ▼
//!     │                         paused? in flight? ──► skip
//!     │                                   │
//!     │                                   ▼
//!     │                     ledger start ► task body ► ledger finish
//!     └ stop() ──► halt cron, wait for in-flight runs
//! ```

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::domains::alerts::AlertEngine;
use crate::domains::delivery::{send_pending_notifications, NotificationDispatcher};
use crate::kernel::deps::ServerDeps;
use crate::kernel::task_ledger::{TaskName, TaskRun};

/// Window the engine scans on each hourly alert check.
const ALERT_LOOKBACK_HOURS: i64 = 1;

/// Rows drained per dispatch cycle.
const DISPATCH_BATCH_SIZE: i64 = 100;

/// Delivered notifications older than this are deleted by cleanup.
const RETENTION_DAYS: i64 = 30;

/// A start this much later than cadence allows is still on time; beyond
/// it the run counts as missed and triggers a catch-up.
const MISFIRE_GRACE_MINUTES: i64 = 5;

/// Observable lifecycle of one scheduled task. `Succeeded` / `Failed`
/// describe the most recent run and last until the next firing flips
/// the slot back to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    Scheduled = 0,
    Running = 1,
    Succeeded = 2,
    Failed = 3,
}

impl TaskState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => TaskState::Running,
            2 => TaskState::Succeeded,
            3 => TaskState::Failed,
            _ => TaskState::Scheduled,
        }
    }
}

/// Guard slot for one task: single-flight gate, pause flag, and state.
struct TaskSlot {
    gate: tokio::sync::Mutex<()>,
    paused: AtomicBool,
    state: AtomicU8,
}

impl Default for TaskSlot {
    fn default() -> Self {
        Self {
            gate: tokio::sync::Mutex::new(()),
            paused: AtomicBool::new(false),
            state: AtomicU8::new(TaskState::Scheduled as u8),
        }
    }
}

/// One slot per task, indexed by declaration order.
struct TaskRegistry {
    slots: [TaskSlot; 6],
}

impl TaskRegistry {
    fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| TaskSlot::default()),
        }
    }

    fn slot(&self, task: TaskName) -> &TaskSlot {
        &self.slots[task as usize]
    }

    fn set_state(&self, task: TaskName, state: TaskState) {
        self.slot(task).state.store(state as u8, Ordering::Relaxed);
    }

    fn state(&self, task: TaskName) -> TaskState {
        TaskState::from_u8(self.slot(task).state.load(Ordering::Relaxed))
    }

    fn is_paused(&self, task: TaskName) -> bool {
        self.slot(task).paused.load(Ordering::Relaxed)
    }
}

/// Owns the cron scheduler and the six pipeline tasks.
///
/// Constructed by the process entry point and passed by reference to
/// anything that needs to trigger or pause tasks; there is no global
/// scheduler state.
pub struct TaskOrchestrator {
    deps: ServerDeps,
    dispatcher: Arc<NotificationDispatcher>,
    tasks: Arc<TaskRegistry>,
    scheduler: tokio::sync::Mutex<Option<JobScheduler>>,
}

impl TaskOrchestrator {
    pub fn new(deps: ServerDeps) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            deps.email.clone(),
            deps.chat.clone(),
            deps.email_template_dir.clone(),
        ));

        Self {
            deps,
            dispatcher,
            tasks: Arc::new(TaskRegistry::new()),
            scheduler: tokio::sync::Mutex::new(None),
        }
    }

    /// Runs the catch-up pass, then registers and starts the cron jobs.
    pub async fn start(&self) -> Result<()> {
        self.run_catch_up().await;

        let scheduler = JobScheduler::new().await?;
        for task in TaskName::ALL {
            let deps = self.deps.clone();
            let dispatcher = self.dispatcher.clone();
            let tasks = self.tasks.clone();
            let job = Job::new_async(task.cron(), move |_uuid, _lock| {
                let deps = deps.clone();
                let dispatcher = dispatcher.clone();
                let tasks = tasks.clone();
                Box::pin(async move {
                    run_scheduled(&tasks, &deps, &dispatcher, task).await;
                })
            })?;
            scheduler.add(job).await?;
        }
        scheduler.start().await?;
        *self.scheduler.lock().await = Some(scheduler);

        info!("task orchestrator started (6 scheduled tasks)");
        Ok(())
    }

    /// Stops future scheduling and waits for any in-flight run to
    /// finish. Safe to call without a prior `start`.
    pub async fn stop(&self) -> Result<()> {
        if let Some(mut scheduler) = self.scheduler.lock().await.take() {
            scheduler.shutdown().await?;
        }

        for task in TaskName::ALL {
            let _ = self.tasks.slot(task).gate.lock().await;
        }

        info!("task orchestrator stopped");
        Ok(())
    }

    /// Runs one task immediately, outside its schedule, and returns its
    /// outcome. Fails fast when a scheduled run of the same task is in
    /// flight. Manual triggers ignore the pause flag.
    pub async fn trigger_now(&self, task: TaskName) -> Result<()> {
        let slot = self.tasks.slot(task);
        let _guard = slot
            .gate
            .try_lock()
            .map_err(|_| anyhow!("task {} is already running", task))?;

        info!(task = %task, "manual task trigger");
        execute_task(&self.tasks, &self.deps, &self.dispatcher, task).await
    }

    /// Skips future scheduled runs of the task until resumed.
    pub fn pause(&self, task: TaskName) {
        self.tasks.slot(task).paused.store(true, Ordering::Relaxed);
        info!(task = %task, "task paused");
    }

    pub fn resume(&self, task: TaskName) {
        self.tasks.slot(task).paused.store(false, Ordering::Relaxed);
        info!(task = %task, "task resumed");
    }

    /// Snapshot of every task's lifecycle state.
    pub fn task_states(&self) -> Vec<(TaskName, TaskState)> {
        TaskName::ALL
            .iter()
            .map(|&task| (task, self.tasks.state(task)))
            .collect()
    }

    /// One coalesced run for every task whose schedule was missed while
    /// the process was down. Runs in pipeline order so ingest output is
    /// visible to the passes behind it.
    async fn run_catch_up(&self) {
        let now = Utc::now();
        for task in TaskName::ALL {
            let run = match self.deps.store.task_run(task).await {
                Ok(run) => run,
                Err(e) => {
                    warn!(task = %task, "failed to read task ledger: {e:#}");
                    continue;
                }
            };

            if needs_catch_up(run.as_ref(), task, now) {
                info!(task = %task, "missed run detected, executing catch-up");
                run_scheduled(&self.tasks, &self.deps, &self.dispatcher, task).await;
            }
        }
    }
}

/// Whether the task's last activity is older than one cadence plus the
/// grace window. Tasks with no ledger history never need catching up;
/// their first cron firing covers them.
fn needs_catch_up(run: Option<&TaskRun>, task: TaskName, now: DateTime<Utc>) -> bool {
    let Some(run) = run else {
        return false;
    };
    let last_activity = match (run.last_started_at, run.last_succeeded_at) {
        (Some(started), Some(succeeded)) => started.max(succeeded),
        (Some(started), None) => started,
        (None, Some(succeeded)) => succeeded,
        (None, None) => return false,
    };

    now - last_activity > task.cadence() + Duration::minutes(MISFIRE_GRACE_MINUTES)
}

/// Cron entry point: honors the pause flag and the single-flight gate,
/// then records and logs the run.
async fn run_scheduled(
    tasks: &TaskRegistry,
    deps: &ServerDeps,
    dispatcher: &NotificationDispatcher,
    task: TaskName,
) {
    if tasks.is_paused(task) {
        info!(task = %task, "task is paused, skipping run");
        return;
    }

    let Ok(_guard) = tasks.slot(task).gate.try_lock() else {
        info!(task = %task, "previous run still in flight, skipping");
        return;
    };

    if let Err(e) = execute_task(tasks, deps, dispatcher, task).await {
        error!(task = %task, "scheduled task failed: {e:#}");
    }
}

/// Runs one task body with ledger and state bookkeeping. The caller
/// must hold the task's gate.
async fn execute_task(
    tasks: &TaskRegistry,
    deps: &ServerDeps,
    dispatcher: &NotificationDispatcher,
    task: TaskName,
) -> Result<()> {
    tasks.set_state(task, TaskState::Running);
    info!(task = %task, "task run started");

    if let Err(e) = deps.store.record_task_started(task, Utc::now()).await {
        warn!(task = %task, "failed to record task start: {e:#}");
    }

    let result = run_task_body(deps, dispatcher, task).await;

    let (state, error) = match &result {
        Ok(()) => (TaskState::Succeeded, None),
        Err(e) => (TaskState::Failed, Some(format!("{e:#}"))),
    };
    tasks.set_state(task, state);

    if let Err(e) = deps
        .store
        .record_task_finished(task, error.as_deref(), Utc::now())
        .await
    {
        warn!(task = %task, "failed to record task finish: {e:#}");
    }

    result
}

async fn run_task_body(
    deps: &ServerDeps,
    dispatcher: &NotificationDispatcher,
    task: TaskName,
) -> Result<()> {
    match task {
        TaskName::Ingest => {
            let jobs_found = deps.ingestor.run_collection().await?;
            info!(jobs_found, "job collection finished");
        }
        TaskName::Enrich => {
            let jobs_processed = deps.enricher.enrich_pending().await?;
            info!(jobs_processed, "job enrichment finished");
        }
        TaskName::AlertCheck => {
            AlertEngine::new(deps.store.clone())
                .run(ALERT_LOOKBACK_HOURS)
                .await?;
        }
        TaskName::Dispatch => {
            send_pending_notifications(deps.store.as_ref(), dispatcher, DISPATCH_BATCH_SIZE)
                .await?;
        }
        TaskName::Cleanup => {
            let cutoff = Utc::now() - Duration::days(RETENTION_DAYS);
            let deleted = deps.store.delete_sent_before(cutoff).await?;
            info!(deleted, "old notifications cleaned up");
        }
        TaskName::Report => {
            run_daily_report(deps).await?;
        }
    }

    Ok(())
}

/// Read-only summary of the previous day, for the daily log.
async fn run_daily_report(deps: &ServerDeps) -> Result<()> {
    let since = Utc::now() - Duration::days(1);

    let new_jobs = deps.store.count_jobs_scraped_since(since).await?;
    let notifications_sent = deps.store.count_sent_since(since).await?;
    let golden_leads = deps.store.count_golden_leads_since(since).await?;
    let active_users = deps.store.count_active_users().await?;

    info!(
        new_jobs,
        notifications_sent,
        golden_leads,
        active_users,
        "📊 daily activity report"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::TestDependencies;

    fn ledger_row(
        started: Option<DateTime<Utc>>,
        succeeded: Option<DateTime<Utc>>,
    ) -> TaskRun {
        TaskRun {
            task: TaskName::Dispatch,
            last_started_at: started,
            last_succeeded_at: succeeded,
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn no_history_never_needs_catch_up() {
        let now = Utc::now();
        assert!(!needs_catch_up(None, TaskName::Dispatch, now));
        assert!(!needs_catch_up(
            Some(&ledger_row(None, None)),
            TaskName::Dispatch,
            now
        ));
    }

    #[test]
    fn recent_run_needs_no_catch_up() {
        let now = Utc::now();
        let run = ledger_row(Some(now - Duration::minutes(10)), Some(now - Duration::minutes(10)));
        assert!(!needs_catch_up(Some(&run), TaskName::Dispatch, now));
    }

    #[test]
    fn run_inside_grace_window_is_still_on_time() {
        let now = Utc::now();
        // 15m cadence + 5m grace: 18 minutes ago is within bounds.
        let run = ledger_row(Some(now - Duration::minutes(18)), Some(now - Duration::minutes(18)));
        assert!(!needs_catch_up(Some(&run), TaskName::Dispatch, now));
    }

    #[test]
    fn stale_run_needs_catch_up() {
        let now = Utc::now();
        let run = ledger_row(Some(now - Duration::hours(2)), Some(now - Duration::hours(2)));
        assert!(needs_catch_up(Some(&run), TaskName::Dispatch, now));
    }

    #[test]
    fn crashed_run_counts_from_its_start() {
        let now = Utc::now();
        // Started long ago, never succeeded: overdue.
        let run = ledger_row(Some(now - Duration::hours(3)), None);
        assert!(needs_catch_up(Some(&run), TaskName::Dispatch, now));
    }

    #[tokio::test]
    async fn paused_task_skips_scheduled_runs() {
        let test_deps = TestDependencies::new();
        let orchestrator = TaskOrchestrator::new(test_deps.deps());

        orchestrator.pause(TaskName::Ingest);
        run_scheduled(
            &orchestrator.tasks,
            &orchestrator.deps,
            &orchestrator.dispatcher,
            TaskName::Ingest,
        )
        .await;

        assert_eq!(test_deps.ingestor.collection_runs(), 0);

        orchestrator.resume(TaskName::Ingest);
        run_scheduled(
            &orchestrator.tasks,
            &orchestrator.deps,
            &orchestrator.dispatcher,
            TaskName::Ingest,
        )
        .await;

        assert_eq!(test_deps.ingestor.collection_runs(), 1);
    }

    #[tokio::test]
    async fn busy_task_is_skipped_not_queued() {
        let test_deps = TestDependencies::new();
        let orchestrator = TaskOrchestrator::new(test_deps.deps());

        let slot = orchestrator.tasks.slot(TaskName::Ingest);
        let _held = slot.gate.lock().await;

        run_scheduled(
            &orchestrator.tasks,
            &orchestrator.deps,
            &orchestrator.dispatcher,
            TaskName::Ingest,
        )
        .await;

        assert_eq!(test_deps.ingestor.collection_runs(), 0);
    }
}
