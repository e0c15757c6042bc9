//! Per-job progress tracking
//!
//! A work unit is one `(file, analyzer)` pair; `total_units` is fixed when
//! the executor commits to its plan. The tracker is a plain value mutated
//! under the job's guard, so [`ProgressTracker::snapshot`] can never observe
//! a torn state.

use std::time::{Duration, Instant};

use serde::Serialize;

use revana_core::domain::{Issue, IssueTally};

/// Mutable progress state owned by the job
#[derive(Debug, Default)]
pub struct ProgressTracker {
    total_units: usize,
    completed_units: usize,
    current_unit: Option<String>,
    tally: IssueTally,
    started: Option<Instant>,
    /// Elapsed time frozen at the terminal transition
    frozen_elapsed: Option<Duration>,
}

/// Stable copy of the progress state for a `status` query
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub total_units: usize,
    pub completed_units: usize,
    /// Fraction in [0, 1]; 0 for an empty plan
    pub fraction: f64,
    pub current_unit: Option<String>,
    pub elapsed_secs: u64,
    /// Unknown until at least one unit has completed
    pub estimated_remaining_secs: Option<u64>,
    pub tally: IssueTally,
}

impl ProgressTracker {
    /// Commit to a plan: fixes `total_units` and starts the clock.
    pub fn start(&mut self, total_units: usize) {
        self.total_units = total_units;
        self.completed_units = 0;
        self.started = Some(Instant::now());
    }

    pub fn record_unit_start(&mut self, label: String) {
        self.current_unit = Some(label);
    }

    /// Finish `units` work units at once and fold their issues into the
    /// live tally. Single-unit drivers pass `units = 1`; batching drivers
    /// account for the whole batch when it returns.
    pub fn record_finished(&mut self, units: usize, issues: &[Issue]) {
        self.completed_units = (self.completed_units + units).min(self.total_units);
        for issue in issues {
            self.tally.record(issue.severity);
        }
    }

    /// Stop the clock; further snapshots report a fixed elapsed time.
    pub fn freeze(&mut self) {
        if self.frozen_elapsed.is_none() {
            self.frozen_elapsed = Some(self.elapsed());
        }
        self.current_unit = None;
    }

    pub fn completed_units(&self) -> usize {
        self.completed_units
    }

    pub fn total_units(&self) -> usize {
        self.total_units
    }

    pub fn tally(&self) -> IssueTally {
        self.tally
    }

    fn elapsed(&self) -> Duration {
        match (self.frozen_elapsed, self.started) {
            (Some(frozen), _) => frozen,
            (None, Some(started)) => started.elapsed(),
            (None, None) => Duration::ZERO,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let elapsed = self.elapsed();

        let estimated_remaining_secs = if self.completed_units > 0 {
            let avg = elapsed.as_secs_f64() / self.completed_units as f64;
            let remaining = self.total_units.saturating_sub(self.completed_units);
            Some((avg * remaining as f64).max(0.0).round() as u64)
        } else {
            None
        };

        ProgressSnapshot {
            total_units: self.total_units,
            completed_units: self.completed_units,
            fraction: if self.total_units == 0 {
                0.0
            } else {
                self.completed_units as f64 / self.total_units as f64
            },
            current_unit: self.current_unit.clone(),
            elapsed_secs: elapsed.as_secs(),
            estimated_remaining_secs,
            tally: self.tally,
        }
    }
}
