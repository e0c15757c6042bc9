//! The normalized issue model
//!
//! Every analyzer driver maps its tool's native findings into this unified
//! format, allowing the orchestrator to aggregate results from heterogeneous
//! tools into a single stream.

use serde::{Deserialize, Serialize};

/// Issue severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        };
        f.write_str(s)
    }
}

/// Issue category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Security,
    Performance,
    Quality,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Security, Category::Performance, Category::Quality];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Security => "security",
            Category::Performance => "performance",
            Category::Quality => "quality",
        };
        f.write_str(s)
    }
}

/// A single normalized finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Unique within a job; assigned by the engine when the issue is
    /// appended, not by the driver that produced it
    pub id: String,
    /// Project-relative file path
    pub file: String,
    /// 1-based line number
    pub line: u32,
    /// 1-based column; 0 when the tool reports none
    pub column: u32,
    pub severity: Severity,
    pub category: Category,
    /// Analyzer-specific rule identifier
    pub rule: String,
    /// Human-readable description
    pub message: String,
    /// The offending line or a few lines of context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Name of the analyzer that produced the finding
    pub analyzer: String,
}

/// Live severity counters for a job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTally {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl IssueTally {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
        self.total += 1;
    }

    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut tally = Self::default();
        for issue in issues {
            tally.record(issue.severity);
        }
        tally
    }
}
