//! Semgrep JSON output types
//!
//! These types match the JSON output format of the Semgrep CLI.

use serde::Deserialize;

/// Root Semgrep JSON output
#[derive(Debug, Clone, Deserialize)]
pub struct SemgrepOutput {
    #[serde(default)]
    pub results: Vec<SemgrepResult>,
}

/// A single Semgrep result (finding)
#[derive(Debug, Clone, Deserialize)]
pub struct SemgrepResult {
    pub check_id: String,
    pub path: String,
    pub start: SemgrepPosition,
    pub extra: SemgrepResultExtra,
}

/// Position in file (1-based)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemgrepPosition {
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub col: u32,
}

/// Extra information in a result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemgrepResultExtra {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub severity: String,
    /// Matched source lines
    #[serde(default)]
    pub lines: String,
}
