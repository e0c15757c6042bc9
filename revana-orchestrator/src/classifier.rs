//! File-to-analyzer routing
//!
//! A pure function over the path and the driver descriptors: it never opens
//! the file. Used at plan time to fix `total_units` and again at dispatch
//! time to route files.

use revana_analyzers::DriverSet;

/// Analyzers among `enabled` that accept `path`, in `enabled` order.
pub fn classify(path: &str, enabled: &[String], drivers: &DriverSet) -> Vec<&'static str> {
    enabled
        .iter()
        .filter_map(|name| drivers.get(name))
        .map(|driver| driver.descriptor())
        .filter(|descriptor| descriptor.accepts_file(path))
        .map(|descriptor| descriptor.name)
        .collect()
}
