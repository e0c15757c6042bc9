//! Caller-facing snapshots of a job: live status and final report

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use revana_core::domain::{Category, DriverWarning, Issue, IssueTally};

use crate::domain::job::{AnalysisJob, JobState};

/// Point-in-time view of a job for a `status` query
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusSnapshot {
    pub job_id: Uuid,
    pub state: JobState,
    /// Fraction in [0, 1]
    pub progress: f64,
    /// `"[<analyzer>] <file>"` while a unit is in flight
    pub current_unit: Option<String>,
    pub completed_units: usize,
    pub total_units: usize,
    pub elapsed_secs: u64,
    pub estimated_remaining_secs: Option<u64>,
    pub live_tally: IssueTally,
    /// Populated once the job is terminal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<Issue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl JobStatusSnapshot {
    pub fn from_job(job: &AnalysisJob) -> Self {
        let progress = job.progress.snapshot();
        Self {
            job_id: job.job_id,
            state: job.state,
            progress: if job.state == JobState::Completed {
                1.0
            } else {
                progress.fraction
            },
            current_unit: progress.current_unit,
            completed_units: progress.completed_units,
            total_units: progress.total_units,
            elapsed_secs: progress.elapsed_secs,
            estimated_remaining_secs: progress.estimated_remaining_secs,
            live_tally: progress.tally,
            issues: job.state.is_terminal().then(|| job.issues.clone()),
            error: job.error.clone(),
            updated_at: Utc::now(),
        }
    }
}

/// Issue counts per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub security: usize,
    pub performance: usize,
    pub quality: usize,
}

impl CategoryTally {
    fn record(&mut self, category: Category) {
        match category {
            Category::Security => self.security += 1,
            Category::Performance => self.performance += 1,
            Category::Quality => self.quality += 1,
        }
    }
}

/// Aggregated counts for a final report
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub by_category: CategoryTally,
    /// Distinct files with at least one issue
    pub affected_files: usize,
}

impl ReportSummary {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let tally = IssueTally::from_issues(issues);
        let mut by_category = CategoryTally::default();
        let mut files = HashSet::new();
        for issue in issues {
            by_category.record(issue.category);
            files.insert(issue.file.as_str());
        }
        Self {
            total: tally.total,
            critical: tally.critical,
            high: tally.high,
            medium: tally.medium,
            low: tally.low,
            by_category,
            affected_files: files.len(),
        }
    }
}

/// Full result of a terminal job
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub job_id: Uuid,
    /// `completed`, `failed`, or `cancelled`
    pub state: JobState,
    /// Absolute root, so callers can resolve relative paths for editors
    pub project_root: PathBuf,
    pub summary: ReportSummary,
    /// In production order: within one analyzer, caller's file order
    pub issues: Vec<Issue>,
    pub warnings: Vec<DriverWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_secs: u64,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AnalysisReport {
    pub fn from_job(job: &AnalysisJob) -> Self {
        let progress = job.progress.snapshot();
        Self {
            job_id: job.job_id,
            state: job.state,
            project_root: job.input.project_root.clone(),
            summary: ReportSummary::from_issues(&job.issues),
            issues: job.issues.clone(),
            warnings: job.warnings.clone(),
            error: job.error.clone(),
            elapsed_secs: progress.elapsed_secs,
            finished_at: job.finished_at,
        }
    }
}

/// Outcome of a `result` query
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutcome {
    /// Job is not terminal yet
    Pending { state: JobState },
    /// Terminal job with its full report
    Finished {
        #[serde(flatten)]
        report: Box<AnalysisReport>,
    },
}
