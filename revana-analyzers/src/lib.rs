//! Revana analyzer drivers
//!
//! Each driver wraps one external static-analysis tool: it builds the
//! command line, spawns the tool with a deadline, parses its structured
//! report, and maps native findings into the normalized [`Issue`] model of
//! `revana-core`. Drivers are deliberately forgiving: a missing binary, a
//! timed-out batch, or unparseable output yields an empty result plus a
//! [`DriverWarning`], never an error.
//!
//! [`Issue`]: revana_core::domain::Issue
//! [`DriverWarning`]: revana_core::domain::DriverWarning

pub mod bandit;
pub mod driver;
pub mod eslint;
pub mod patterns;
pub mod process;
pub mod semgrep;

use std::sync::Arc;

use revana_core::Config;

pub use driver::{AnalyzerDescriptor, AnalyzerDriver, DriverOutcome, DriverSet, FileAcceptance};

/// Build the stock driver set from configuration.
pub fn default_driver_set(config: &Config) -> DriverSet {
    let grace = config.analysis.termination_grace();
    DriverSet::new(vec![
        Arc::new(eslint::EslintDriver::new(&config.drivers.eslint, grace)),
        Arc::new(bandit::BanditDriver::new(&config.drivers.bandit, grace)),
        Arc::new(patterns::PatternDriver::new()),
        Arc::new(semgrep::SemgrepDriver::new(&config.drivers.semgrep, grace)),
    ])
}
