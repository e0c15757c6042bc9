//! Job entity and state machine
//!
//! Every state change goes through [`AnalysisJob::transition`], which
//! validates the move against the machine below and stamps timestamps:
//!
//! ```text
//!            ┌──────────► cancelled
//!            │                ▲
//! pending ─► running ◄─► paused
//!            │     │          │
//!            │     └────────► failed ◄┘
//!            ▼
//!        completed
//! ```
//!
//! Terminal states (`completed`, `failed`, `cancelled`) are absorbing.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use revana_core::domain::{Category, DriverWarning, Issue};

use super::progress::ProgressTracker;

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Cancelled)
                | (Pending, Failed)
                | (Running, Paused)
                | (Running, Completed)
                | (Running, Cancelled)
                | (Running, Failed)
                | (Paused, Running)
                | (Paused, Cancelled)
                | (Paused, Failed)
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Paused => "paused",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Rejected state change
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("illegal job state transition: {from} -> {to}")]
pub struct JobTransitionError {
    pub from: JobState,
    pub to: JobState,
}

/// What a caller submits to start a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInput {
    /// Absolute project root; analyzers run with this as working directory
    pub project_root: PathBuf,
    /// Project-relative file paths, in the caller's order
    pub files: Vec<String>,
    /// Names of analyzers to run, from the registered driver set
    pub analyzers: Vec<String>,
    /// Only issues in these categories are emitted
    pub categories: Vec<Category>,
}

/// One analysis job owned by the registry
#[derive(Debug)]
pub struct AnalysisJob {
    pub job_id: Uuid,
    pub input: JobInput,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub progress: ProgressTracker,
    pub issues: Vec<Issue>,
    pub warnings: Vec<DriverWarning>,
    /// Terminal error message when `failed`
    pub error: Option<String>,
}

impl AnalysisJob {
    pub fn new(input: JobInput) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            input,
            state: JobState::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            progress: ProgressTracker::default(),
            issues: Vec::new(),
            warnings: Vec::new(),
            error: None,
        }
    }

    /// Validated state change; stamps `started_at` / `finished_at`.
    pub fn transition(&mut self, next: JobState) -> Result<(), JobTransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(JobTransitionError {
                from: self.state,
                to: next,
            });
        }

        if next == JobState::Running && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
            self.progress.freeze();
        }

        self.state = next;
        Ok(())
    }
}
