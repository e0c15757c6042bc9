//! Job executor: plans work units and drives the drivers
//!
//! One executor task per job. Planning fixes the `(file, analyzer)` unit
//! list up front; dispatch runs one worker task per analyzer, each walking
//! its batches in submission order so issue order within an analyzer is
//! deterministic. A counting semaphore bounds concurrent batches across
//! analyzers. Between batches every worker observes the control signal:
//! pause is a condition wait, cancel stops dispatch and interrupts in-flight
//! subprocesses through the shared token.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};
use uuid::Uuid;

use revana_analyzers::{AnalyzerDriver, DriverSet};
use revana_core::domain::DriverWarning;

use crate::classifier::classify;
use crate::domain::job::{JobState, JobTransitionError};
use crate::registry::JobHandle;

#[derive(Debug, thiserror::Error)]
enum ExecutionError {
    #[error(transparent)]
    Transition(#[from] JobTransitionError),

    #[error("analysis worker crashed: {0}")]
    Worker(String),
}

pub(crate) struct JobExecutor {
    handle: Arc<JobHandle>,
    drivers: Arc<DriverSet>,
    max_concurrent_batches: usize,
}

impl JobExecutor {
    pub(crate) fn new(
        handle: Arc<JobHandle>,
        drivers: Arc<DriverSet>,
        max_concurrent_batches: usize,
    ) -> Self {
        Self {
            handle,
            drivers,
            max_concurrent_batches,
        }
    }

    /// Drive the job to a terminal state. Any fault escaping the control
    /// loop marks the job `failed`; everything recoverable has already been
    /// recorded as a warning further down.
    pub(crate) async fn run(self) {
        let job_id = self.handle.job().job_id;
        if let Err(e) = self.execute(job_id).await {
            let mut job = self.handle.job();
            if !job.state.is_terminal() {
                job.error = Some(e.to_string());
                let _ = job.transition(JobState::Failed);
            }
            error!(job_id = %job_id, error = %e, "analysis job failed");
        }
    }

    async fn execute(&self, job_id: Uuid) -> Result<(), ExecutionError> {
        if self.handle.cancel.is_cancelled() {
            self.finish_cancelled();
            return Ok(());
        }

        let (project_root, plan, total_units) = self.commit_plan()?;

        if total_units == 0 {
            return self.finish(job_id).await;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_batches.max(1)));
        let mut workers = JoinSet::new();
        for (name, files) in plan {
            let driver = match self.drivers.get(&name) {
                Some(driver) => driver.clone(),
                None => continue,
            };
            let handle = self.handle.clone();
            let semaphore = semaphore.clone();
            let project_root = project_root.clone();
            workers.spawn(run_analyzer(handle, driver, project_root, files, semaphore));
        }

        while let Some(joined) = workers.join_next().await {
            joined.map_err(|e| ExecutionError::Worker(e.to_string()))?;
        }

        self.finish(job_id).await
    }

    /// Transition to `running`, fix the effective analyzer set, and build
    /// the ordered unit plan. Nonexistent fileset entries are skipped with a
    /// warning.
    fn commit_plan(
        &self,
    ) -> Result<(PathBuf, Vec<(String, Vec<String>)>, usize), ExecutionError> {
        let mut guard = self.handle.job();
        let job = &mut *guard;
        job.transition(JobState::Running)?;

        // An analyzer none of whose categories were selected can only
        // produce issues that would be filtered out, so it is not planned.
        let selected = &job.input.categories;
        let mut seen = HashSet::new();
        let effective: Vec<String> = job
            .input
            .analyzers
            .iter()
            .filter(|name| seen.insert(name.to_string()))
            .filter(|name| {
                self.drivers
                    .get(name)
                    .map(|driver| {
                        driver
                            .descriptor()
                            .categories
                            .iter()
                            .any(|category| selected.contains(category))
                    })
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        let mut plan: Vec<(String, Vec<String>)> = effective
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect();
        let mut warnings: Vec<DriverWarning> = Vec::new();

        for file in &job.input.files {
            if !job.input.project_root.join(file).exists() {
                warnings.push(DriverWarning::missing_file(file.clone()));
                continue;
            }
            for name in classify(file, &effective, &self.drivers) {
                if let Some((_, files)) = plan.iter_mut().find(|(n, _)| n == name) {
                    files.push(file.clone());
                }
            }
        }
        plan.retain(|(_, files)| !files.is_empty());

        let total_units: usize = plan.iter().map(|(_, files)| files.len()).sum();
        job.warnings.extend(warnings);
        job.progress.start(total_units);

        info!(
            job_id = %job.job_id,
            total_units,
            analyzers = plan.len(),
            "analysis plan committed"
        );
        Ok((job.input.project_root.clone(), plan, total_units))
    }

    /// All units are accounted for: wait out any pending pause, then
    /// transition to `completed`.
    async fn finish(&self, job_id: Uuid) -> Result<(), ExecutionError> {
        loop {
            if !wait_for_dispatch(&self.handle).await {
                self.finish_cancelled();
                return Ok(());
            }
            let mut job = self.handle.job();
            match job.state {
                JobState::Running => {
                    debug_assert_eq!(job.progress.completed_units(), job.progress.total_units());
                    job.transition(JobState::Completed)?;
                    info!(
                        job_id = %job_id,
                        issues = job.issues.len(),
                        warnings = job.warnings.len(),
                        "analysis job completed"
                    );
                    return Ok(());
                }
                // Paused again between the wait and the lock; go back to waiting
                JobState::Paused => continue,
                // Cancelled (or failed) under our feet; nothing left to do
                _ => return Ok(()),
            }
        }
    }

    fn finish_cancelled(&self) {
        let mut job = self.handle.job();
        if job.state.is_terminal() {
            return;
        }
        let _ = job.transition(JobState::Cancelled);
        info!(
            job_id = %job.job_id,
            issues = job.issues.len(),
            "analysis job cancelled"
        );
    }
}

/// Walk one analyzer's batches in submission order.
async fn run_analyzer(
    handle: Arc<JobHandle>,
    driver: Arc<dyn AnalyzerDriver>,
    project_root: PathBuf,
    files: Vec<String>,
    semaphore: Arc<Semaphore>,
) {
    let descriptor = driver.descriptor();
    let name = descriptor.name;
    let batch_size = descriptor.batch_size.max(1);

    for batch in files.chunks(batch_size) {
        if !wait_for_dispatch(&handle).await {
            return;
        }
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };
        if handle.cancel.is_cancelled() {
            return;
        }

        handle
            .job()
            .progress
            .record_unit_start(format!("[{name}] {}", batch[0]));

        debug!(analyzer = name, files = batch.len(), "dispatching batch");
        let outcome = driver.analyze(&project_root, batch, &handle.cancel).await;
        drop(permit);

        if handle.cancel.is_cancelled() {
            // The batch was interrupted mid-run; its partial output is not
            // trustworthy and is discarded with the cancellation.
            return;
        }

        let mut guard = handle.job();
        let job = &mut *guard;
        let start = job.issues.len();
        for mut issue in outcome.issues {
            if !job.input.categories.contains(&issue.category) {
                continue;
            }
            issue.id = format!("{}-{}", job.job_id, job.issues.len());
            job.issues.push(issue);
        }
        job.warnings.extend(outcome.warnings);
        job.progress
            .record_finished(batch.len(), &job.issues[start..]);
    }
}

/// Block until dispatching is allowed again. Returns `false` on cancel.
async fn wait_for_dispatch(handle: &JobHandle) -> bool {
    let mut paused = handle.pause.subscribe();
    loop {
        if handle.cancel.is_cancelled() {
            return false;
        }
        if !*paused.borrow_and_update() {
            return true;
        }
        tokio::select! {
            _ = handle.cancel.cancelled() => return false,
            changed = paused.changed() => {
                if changed.is_err() {
                    // Registry dropped the sender; nothing can resume us
                    return true;
                }
            }
        }
    }
}
