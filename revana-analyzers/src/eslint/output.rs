//! ESLint JSON report types
//!
//! These types match the output of `eslint --format json`: an array of
//! per-file reports, each carrying its messages.

use serde::Deserialize;

/// Report for one linted file
#[derive(Debug, Clone, Deserialize)]
pub struct EslintFileReport {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(default)]
    pub messages: Vec<EslintMessage>,
}

/// One lint message
#[derive(Debug, Clone, Deserialize)]
pub struct EslintMessage {
    /// `None` for parse errors and other non-rule messages
    #[serde(rename = "ruleId")]
    pub rule_id: Option<String>,
    /// 1 = warning, 2 = error
    #[serde(default)]
    pub severity: u8,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    #[serde(default)]
    pub message: String,
}
