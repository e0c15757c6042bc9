//! Process-wide job registry
//!
//! The registry owns every job for the lifetime of the process: it validates
//! inputs, spawns the executor task, and answers status/control/result
//! queries. The registry map has its own lock and is never held while
//! executor code runs; each job carries its own guard.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use revana_analyzers::DriverSet;
use revana_core::config::AnalysisConfig;
use revana_core::Config;

use crate::domain::job::{AnalysisJob, JobInput, JobState};
use crate::executor::JobExecutor;
use crate::snapshot::{AnalysisReport, JobOutcome, JobStatusSnapshot};

/// Registry operation errors, surfaced synchronously to the caller
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("illegal input: {0}")]
    IllegalInput(String),

    #[error("illegal state: {operation} requires a {expected} job, this one is {actual}")]
    IllegalState {
        operation: &'static str,
        expected: &'static str,
        actual: JobState,
    },
}

/// Shared per-job state: the record itself plus the control signal
pub(crate) struct JobHandle {
    pub(crate) job: Mutex<AnalysisJob>,
    /// Latched pause flag; the executor condition-waits on changes
    pub(crate) pause: watch::Sender<bool>,
    pub(crate) cancel: CancellationToken,
}

impl JobHandle {
    /// The job guard. Never held across an await or a subprocess.
    pub(crate) fn job(&self) -> MutexGuard<'_, AnalysisJob> {
        self.job.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Owns all jobs; the caller owns the registry (no process globals)
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, Arc<JobHandle>>>,
    drivers: Arc<DriverSet>,
    analysis: AnalysisConfig,
}

impl JobRegistry {
    pub fn new(drivers: DriverSet, config: &Config) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            drivers: Arc::new(drivers),
            analysis: config.analysis.clone(),
        }
    }

    /// Validate the input, store a `pending` job, and start its executor in
    /// the background. Returns immediately with the job id.
    ///
    /// Must be called within a tokio runtime.
    pub fn create(&self, input: JobInput) -> Result<Uuid, RegistryError> {
        self.validate(&input)?;

        let job = AnalysisJob::new(input);
        let job_id = job.job_id;
        let (pause, _) = watch::channel(false);
        let handle = Arc::new(JobHandle {
            job: Mutex::new(job),
            pause,
            cancel: CancellationToken::new(),
        });

        self.jobs_write().insert(job_id, handle.clone());

        let executor = JobExecutor::new(
            handle,
            self.drivers.clone(),
            self.analysis.max_concurrent_batches,
        );
        tokio::spawn(executor.run());

        info!(job_id = %job_id, "analysis job created");
        Ok(job_id)
    }

    pub fn status(&self, job_id: Uuid) -> Result<JobStatusSnapshot, RegistryError> {
        let handle = self.handle(job_id)?;
        let job = handle.job();
        Ok(JobStatusSnapshot::from_job(&job))
    }

    /// Pause a running job. Takes effect between work units; the in-flight
    /// batch finishes first.
    pub fn pause(&self, job_id: Uuid) -> Result<(), RegistryError> {
        let handle = self.handle(job_id)?;
        let mut job = handle.job();
        job.transition(JobState::Paused)
            .map_err(|e| RegistryError::IllegalState {
                operation: "pause",
                expected: "running",
                actual: e.from,
            })?;
        handle.pause.send_replace(true);
        Ok(())
    }

    pub fn resume(&self, job_id: Uuid) -> Result<(), RegistryError> {
        let handle = self.handle(job_id)?;
        let mut job = handle.job();
        if job.state != JobState::Paused {
            return Err(RegistryError::IllegalState {
                operation: "resume",
                expected: "paused",
                actual: job.state,
            });
        }
        job.transition(JobState::Running)
            .map_err(|e| RegistryError::IllegalState {
                operation: "resume",
                expected: "paused",
                actual: e.from,
            })?;
        handle.pause.send_replace(false);
        Ok(())
    }

    /// Request cancellation of any non-terminal job. The executor performs
    /// the actual transition once in-flight subprocesses are down.
    pub fn cancel(&self, job_id: Uuid) -> Result<(), RegistryError> {
        let handle = self.handle(job_id)?;
        {
            let job = handle.job();
            if job.state.is_terminal() {
                return Err(RegistryError::IllegalState {
                    operation: "cancel",
                    expected: "non-terminal",
                    actual: job.state,
                });
            }
        }
        handle.cancel.cancel();
        Ok(())
    }

    /// The full report for a terminal job, or a `pending` marker.
    pub fn result(&self, job_id: Uuid) -> Result<JobOutcome, RegistryError> {
        let handle = self.handle(job_id)?;
        let job = handle.job();
        if job.state.is_terminal() {
            Ok(JobOutcome::Finished {
                report: Box::new(AnalysisReport::from_job(&job)),
            })
        } else {
            Ok(JobOutcome::Pending { state: job.state })
        }
    }

    /// All known jobs with their current states.
    pub fn jobs(&self) -> Vec<(Uuid, JobState)> {
        self.jobs_read()
            .iter()
            .map(|(id, handle)| (*id, handle.job().state))
            .collect()
    }

    fn validate(&self, input: &JobInput) -> Result<(), RegistryError> {
        let root = &input.project_root;
        let metadata = std::fs::metadata(root).map_err(|e| {
            RegistryError::IllegalInput(format!("project root {}: {e}", root.display()))
        })?;
        if !metadata.is_dir() {
            return Err(RegistryError::IllegalInput(format!(
                "project root {} is not a directory",
                root.display()
            )));
        }

        if input.analyzers.is_empty() {
            return Err(RegistryError::IllegalInput(
                "at least one analyzer must be enabled".to_string(),
            ));
        }
        for name in &input.analyzers {
            if !self.drivers.contains(name) {
                return Err(RegistryError::IllegalInput(format!(
                    "unknown analyzer '{name}'"
                )));
            }
        }

        if input.categories.is_empty() {
            return Err(RegistryError::IllegalInput(
                "category selection must not be empty".to_string(),
            ));
        }

        if input.files.len() > self.analysis.max_files {
            return Err(RegistryError::IllegalInput(format!(
                "fileset of {} files exceeds the configured limit of {}",
                input.files.len(),
                self.analysis.max_files
            )));
        }

        Ok(())
    }

    fn handle(&self, job_id: Uuid) -> Result<Arc<JobHandle>, RegistryError> {
        self.jobs_read()
            .get(&job_id)
            .cloned()
            .ok_or(RegistryError::NotFound(job_id))
    }

    fn jobs_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Arc<JobHandle>>> {
        self.jobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn jobs_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Arc<JobHandle>>> {
        self.jobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
