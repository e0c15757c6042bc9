//! Driver trait, descriptor, and the driver registry
//!
//! The orchestrator talks to analyzers exclusively through
//! [`AnalyzerDriver`]; third-party drivers plug in by implementing the trait
//! and registering with [`DriverSet::new`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use revana_core::domain::{Category, DriverWarning, Issue};

/// Which files a driver accepts, decided from the path alone
#[derive(Debug, Clone, Copy)]
pub enum FileAcceptance {
    /// Lowercase extensions without the leading dot
    Extensions(&'static [&'static str]),
    /// Every file in the fileset
    AnyFile,
}

impl FileAcceptance {
    pub fn accepts(&self, path: &str) -> bool {
        match self {
            FileAcceptance::AnyFile => true,
            FileAcceptance::Extensions(exts) => match Path::new(path).extension() {
                Some(ext) => {
                    let ext = ext.to_string_lossy().to_lowercase();
                    exts.contains(&ext.as_str())
                }
                None => false,
            },
        }
    }
}

/// Static metadata describing one analyzer
#[derive(Debug, Clone)]
pub struct AnalyzerDescriptor {
    /// Registry name; also the `analyzer` field on produced issues
    pub name: &'static str,
    pub acceptance: FileAcceptance,
    /// Categories this analyzer can produce; an analyzer whose categories do
    /// not intersect a job's selection is skipped at plan time
    pub categories: &'static [Category],
    /// Files handed to one subprocess invocation
    pub batch_size: usize,
    /// Deadline for one batch invocation
    pub deadline: Duration,
    /// Non-zero exit codes that still mean "report produced"; most tools
    /// exit non-zero when they find issues
    pub tolerated_exit_codes: &'static [i32],
}

impl AnalyzerDescriptor {
    pub fn accepts_file(&self, path: &str) -> bool {
        self.acceptance.accepts(path)
    }

    /// Whether an exit status counts as a usable run. `None` means the
    /// process died on a signal, which is never tolerated.
    pub fn tolerates_exit(&self, code: Option<i32>) -> bool {
        match code {
            Some(0) => true,
            Some(code) => self.tolerated_exit_codes.contains(&code),
            None => false,
        }
    }
}

/// What one batch produced
#[derive(Debug, Default)]
pub struct DriverOutcome {
    pub issues: Vec<Issue>,
    pub warnings: Vec<DriverWarning>,
}

impl DriverOutcome {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn warning(warning: DriverWarning) -> Self {
        Self {
            issues: Vec::new(),
            warnings: vec![warning],
        }
    }
}

/// Trait implemented by every analyzer driver
///
/// `analyze` receives a non-empty batch of project-relative paths already
/// filtered to files the driver accepts, and the project root to run the
/// tool in. It must not fail: recoverable faults become warnings on the
/// outcome. The cancellation token aborts an in-flight subprocess; a
/// cancelled batch may return a partial or empty outcome, which the caller
/// discards.
#[async_trait]
pub trait AnalyzerDriver: Send + Sync {
    fn descriptor(&self) -> &AnalyzerDescriptor;

    async fn analyze(
        &self,
        project_root: &Path,
        files: &[String],
        cancel: &CancellationToken,
    ) -> DriverOutcome;
}

/// Name-keyed registry of available drivers
///
/// Insertion order is preserved so unit planning stays deterministic.
#[derive(Clone)]
pub struct DriverSet {
    drivers: Vec<Arc<dyn AnalyzerDriver>>,
}

impl DriverSet {
    pub fn new(drivers: Vec<Arc<dyn AnalyzerDriver>>) -> Self {
        Self { drivers }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn AnalyzerDriver>> {
        self.drivers
            .iter()
            .find(|driver| driver.descriptor().name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.drivers.iter().map(|driver| driver.descriptor().name)
    }
}

/// Make a tool-reported path project-relative.
///
/// Tools run with the project root as working directory but some report
/// absolute paths anyway.
pub(crate) fn relative_to_root(project_root: &Path, reported: &str) -> String {
    let path = Path::new(reported);
    if path.is_absolute() {
        if let Ok(stripped) = path.strip_prefix(project_root) {
            return stripped.to_string_lossy().into_owned();
        }
    }
    reported.to_string()
}
