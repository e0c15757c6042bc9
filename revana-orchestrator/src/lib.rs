//! Revana orchestrator - controllable analysis jobs over a driver set
//!
//! The orchestrator turns a fileset and a driver selection into a
//! long-lived, observable job:
//!
//! ```text
//! caller ──► JobRegistry::create ──► JobExecutor (background task)
//!                 │                        │
//!                 │   classify files ──► (file, analyzer) work units
//!                 │   dispatch batches, bounded by a semaphore
//!                 │   pause / resume / cancel via the control signal
//!                 ▼                        ▼
//!            status() / result()     issues + warnings + progress
//! ```
//!
//! All state lives behind the [`JobRegistry`] value; there are no process
//! globals. Jobs are in-memory only and vanish with the registry.
//!
//! ```rust,ignore
//! use revana_analyzers::default_driver_set;
//! use revana_core::Config;
//! use revana_orchestrator::{JobInput, JobRegistry};
//!
//! let config = Config::load()?;
//! let registry = JobRegistry::new(default_driver_set(&config), &config);
//! let job_id = registry.create(JobInput { /* ... */ })?;
//! let status = registry.status(job_id)?;
//! ```

pub mod classifier;
pub mod domain;
pub mod registry;
pub mod reporting;
pub mod snapshot;

mod executor;

pub use domain::job::{AnalysisJob, JobInput, JobState, JobTransitionError};
pub use domain::progress::{ProgressSnapshot, ProgressTracker};
pub use registry::{JobRegistry, RegistryError};
pub use snapshot::{AnalysisReport, CategoryTally, JobOutcome, JobStatusSnapshot, ReportSummary};
