//! Non-fatal driver and planning warnings
//!
//! Warnings accumulate on the job and never affect its state: a missing
//! analyzer binary or a timed-out batch degrades the result, it does not
//! fail the run.

use serde::{Deserialize, Serialize};

/// What went wrong, without failing the job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The analyzer executable could not be spawned
    MissingBinary,
    /// A batch exceeded its deadline and was terminated
    Timeout,
    /// The tool produced output the driver could not parse
    ParseFailure,
    /// A fileset entry does not exist under the project root
    MissingFile,
    /// A file exists but could not be read
    UnreadableFile,
    /// The tool exited with a code outside its tolerated set
    ToolError,
}

/// A recoverable fault recorded against a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverWarning {
    /// Analyzer that produced the warning; `None` for plan-time warnings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    pub kind: WarningKind,
    /// File the warning is about, when it concerns a single file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub message: String,
}

impl DriverWarning {
    pub fn missing_binary(analyzer: &str, message: impl Into<String>) -> Self {
        Self {
            analyzer: Some(analyzer.to_string()),
            kind: WarningKind::MissingBinary,
            file: None,
            message: message.into(),
        }
    }

    pub fn timeout(analyzer: &str, message: impl Into<String>) -> Self {
        Self {
            analyzer: Some(analyzer.to_string()),
            kind: WarningKind::Timeout,
            file: None,
            message: message.into(),
        }
    }

    pub fn parse_failure(analyzer: &str, message: impl Into<String>) -> Self {
        Self {
            analyzer: Some(analyzer.to_string()),
            kind: WarningKind::ParseFailure,
            file: None,
            message: message.into(),
        }
    }

    pub fn missing_file(file: impl Into<String>) -> Self {
        let file = file.into();
        Self {
            analyzer: None,
            kind: WarningKind::MissingFile,
            message: format!("{file}: not found under the project root, skipped"),
            file: Some(file),
        }
    }

    pub fn unreadable_file(analyzer: &str, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            analyzer: Some(analyzer.to_string()),
            kind: WarningKind::UnreadableFile,
            file: Some(file.into()),
            message: message.into(),
        }
    }

    pub fn tool_error(analyzer: &str, message: impl Into<String>) -> Self {
        Self {
            analyzer: Some(analyzer.to_string()),
            kind: WarningKind::ToolError,
            file: None,
            message: message.into(),
        }
    }
}
