//! Bandit JSON report types

use serde::Deserialize;

/// Root of `bandit -f json` output
#[derive(Debug, Clone, Deserialize)]
pub struct BanditReport {
    #[serde(default)]
    pub results: Vec<BanditFinding>,
}

/// One Bandit finding
#[derive(Debug, Clone, Deserialize)]
pub struct BanditFinding {
    #[serde(default)]
    pub line_number: u32,
    #[serde(default)]
    pub col_offset: u32,
    #[serde(default)]
    pub issue_severity: String,
    #[serde(default)]
    pub test_id: String,
    #[serde(default)]
    pub issue_text: String,
    /// Offending code snippet as reported by the tool
    #[serde(default)]
    pub code: Option<String>,
}
