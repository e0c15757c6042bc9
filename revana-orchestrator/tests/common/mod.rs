//! Shared fixtures for orchestrator integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use revana_analyzers::patterns::PatternDriver;
use revana_analyzers::{AnalyzerDescriptor, AnalyzerDriver, DriverOutcome, DriverSet, FileAcceptance};
use revana_core::domain::{Category, Issue, Severity};
use revana_core::Config;
use revana_orchestrator::{JobInput, JobRegistry, JobState};

/// Write a throwaway project with the given files.
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(path, content).expect("write fixture");
    }
    dir
}

pub fn input(root: &Path, files: &[&str], analyzers: &[&str]) -> JobInput {
    JobInput {
        project_root: root.to_path_buf(),
        files: files.iter().map(|f| f.to_string()).collect(),
        analyzers: analyzers.iter().map(|a| a.to_string()).collect(),
        categories: Category::ALL.to_vec(),
    }
}

/// Registry backed only by the in-process pattern driver, so no external
/// tool is required.
pub fn pattern_registry() -> JobRegistry {
    let config = Config::default();
    JobRegistry::new(
        DriverSet::new(vec![Arc::new(PatternDriver::new())]),
        &config,
    )
}

/// Poll until the job reaches `target` or the deadline passes.
pub async fn await_state(registry: &JobRegistry, job_id: Uuid, target: JobState) -> JobState {
    let deadline = Duration::from_secs(30);
    let start = std::time::Instant::now();
    loop {
        let state = registry.status(job_id).expect("status").state;
        if state == target || state.is_terminal() {
            return state;
        }
        if start.elapsed() > deadline {
            panic!("job {job_id} did not reach {target} within {deadline:?}, stuck at {state}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Poll until `completed_units >= floor` (useful to land control ops
/// mid-flight), returning the observed count.
pub async fn await_progress(registry: &JobRegistry, job_id: Uuid, floor: usize) -> usize {
    let deadline = Duration::from_secs(30);
    let start = std::time::Instant::now();
    loop {
        let status = registry.status(job_id).expect("status");
        if status.completed_units >= floor {
            return status.completed_units;
        }
        if status.state.is_terminal() {
            panic!(
                "job {job_id} finished as {} before reaching {floor} units",
                status.state
            );
        }
        if start.elapsed() > deadline {
            panic!("job {job_id} never reached {floor} completed units");
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

/// Test driver: accepts every file, sleeps per batch, and reports one fixed
/// issue per file. Gives control-flow tests something slow and
/// deterministic to steer.
pub struct SlowDriver {
    descriptor: AnalyzerDescriptor,
    delay: Duration,
    severity: Severity,
}

impl SlowDriver {
    pub fn new(delay: Duration) -> Self {
        Self {
            descriptor: AnalyzerDescriptor {
                name: "slowpoke",
                acceptance: FileAcceptance::AnyFile,
                categories: &[Category::Quality],
                batch_size: 1,
                deadline: Duration::from_secs(60),
                tolerated_exit_codes: &[],
            },
            delay,
            severity: Severity::Medium,
        }
    }
}

#[async_trait]
impl AnalyzerDriver for SlowDriver {
    fn descriptor(&self) -> &AnalyzerDescriptor {
        &self.descriptor
    }

    async fn analyze(
        &self,
        _project_root: &Path,
        files: &[String],
        cancel: &CancellationToken,
    ) -> DriverOutcome {
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {}
            _ = cancel.cancelled() => return DriverOutcome::empty(),
        }
        DriverOutcome {
            issues: files
                .iter()
                .map(|file| Issue {
                    id: String::new(),
                    file: file.clone(),
                    line: 1,
                    column: 1,
                    severity: self.severity,
                    category: Category::Quality,
                    rule: "slow/fixed".to_string(),
                    message: "fixed test finding".to_string(),
                    snippet: None,
                    analyzer: "slowpoke".to_string(),
                })
                .collect(),
            warnings: Vec::new(),
        }
    }
}

/// Registry backed by the slow test driver.
pub fn slow_registry(delay: Duration) -> JobRegistry {
    let config = Config::default();
    JobRegistry::new(DriverSet::new(vec![Arc::new(SlowDriver::new(delay))]), &config)
}
