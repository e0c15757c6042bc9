//! In-process regex pattern driver
//!
//! A fixed rule table evaluated line by line, case-insensitively. This is
//! the one driver with no subprocess, so it also serves as the always
//! available baseline when no external tool is installed.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;

use revana_core::domain::{Category, DriverWarning, Issue, Severity};

use crate::driver::{AnalyzerDescriptor, AnalyzerDriver, DriverOutcome, FileAcceptance};

pub const PATTERN_NAME: &str = "pattern";

struct PatternRule {
    id: &'static str,
    regex: Regex,
    severity: Severity,
    category: Category,
    message: &'static str,
    /// Extensions the rule applies to; `None` applies everywhere
    extensions: Option<&'static [&'static str]>,
}

const JS_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];
const CODE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "py", "java", "go"];
const SECRET_EXTENSIONS: &[&str] = &["js", "ts", "py", "java", "go", "php"];

static RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule {
            id: "console-log",
            regex: Regex::new(r"(?i)console\.(log|debug|info|warn|error)").unwrap(),
            severity: Severity::Low,
            category: Category::Quality,
            message: "Remove console.log statements before production",
            extensions: Some(JS_EXTENSIONS),
        },
        PatternRule {
            id: "todo-comment",
            regex: Regex::new(r"(?i)(TODO|FIXME|XXX|HACK)[\s:]+").unwrap(),
            severity: Severity::Low,
            category: Category::Quality,
            message: "TODO/FIXME comment found - resolve before production",
            extensions: Some(CODE_EXTENSIONS),
        },
        PatternRule {
            id: "hardcoded-password",
            regex: Regex::new(r#"(?i)(password|passwd|pwd)\s*=\s*["'][^"']{3,}["']"#).unwrap(),
            severity: Severity::Critical,
            category: Category::Security,
            message: "Possible hardcoded password detected",
            extensions: Some(SECRET_EXTENSIONS),
        },
        PatternRule {
            id: "hardcoded-api-key",
            regex: Regex::new(r#"(?i)(api[_-]?key|apikey|access[_-]?key)\s*=\s*["'][^"']{10,}["']"#)
                .unwrap(),
            severity: Severity::Critical,
            category: Category::Security,
            message: "Possible hardcoded API key detected",
            extensions: Some(SECRET_EXTENSIONS),
        },
        PatternRule {
            id: "hardcoded-secret",
            regex: Regex::new(r#"(?i)(secret|token)\s*=\s*["'][^"']{10,}["']"#).unwrap(),
            severity: Severity::Critical,
            category: Category::Security,
            message: "Possible hardcoded secret/token detected",
            extensions: Some(SECRET_EXTENSIONS),
        },
        PatternRule {
            id: "debugger-statement",
            regex: Regex::new(r"(?i)\bdebugger\b").unwrap(),
            severity: Severity::Medium,
            category: Category::Quality,
            message: "Debugger statement found - remove before production",
            extensions: Some(JS_EXTENSIONS),
        },
    ]
});

pub struct PatternDriver {
    descriptor: AnalyzerDescriptor,
}

impl PatternDriver {
    pub fn new() -> Self {
        Self {
            descriptor: AnalyzerDescriptor {
                name: PATTERN_NAME,
                acceptance: FileAcceptance::AnyFile,
                categories: &[Category::Security, Category::Quality],
                batch_size: 1,
                // No subprocess; the deadline is nominal
                deadline: Duration::from_secs(60),
                tolerated_exit_codes: &[],
            },
        }
    }

    async fn analyze_file(&self, project_root: &Path, file: &str) -> DriverOutcome {
        let applicable: Vec<&PatternRule> = RULES
            .iter()
            .filter(|rule| rule_applies(rule, file))
            .collect();
        if applicable.is_empty() {
            return DriverOutcome::empty();
        }

        // Tolerate invalid UTF-8 rather than skipping the file
        let content = match tokio::fs::read(project_root.join(file)).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                return DriverOutcome::warning(DriverWarning::unreadable_file(
                    PATTERN_NAME,
                    file,
                    format!("{file}: {e}"),
                ));
            }
        };

        let mut issues = Vec::new();
        for (line_idx, line) in content.lines().enumerate() {
            for rule in &applicable {
                for found in rule.regex.find_iter(line) {
                    issues.push(Issue {
                        id: String::new(),
                        file: file.to_string(),
                        line: (line_idx + 1) as u32,
                        column: (found.start() + 1) as u32,
                        severity: rule.severity,
                        category: rule.category,
                        rule: format!("custom/{}", rule.id),
                        message: rule.message.to_string(),
                        snippet: Some(line.trim().to_string()),
                        analyzer: PATTERN_NAME.to_string(),
                    });
                }
            }
        }

        DriverOutcome {
            issues,
            warnings: Vec::new(),
        }
    }
}

impl Default for PatternDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalyzerDriver for PatternDriver {
    fn descriptor(&self) -> &AnalyzerDescriptor {
        &self.descriptor
    }

    async fn analyze(
        &self,
        project_root: &Path,
        files: &[String],
        cancel: &CancellationToken,
    ) -> DriverOutcome {
        let mut outcome = DriverOutcome::empty();
        for file in files {
            if cancel.is_cancelled() {
                break;
            }
            let file_outcome = self.analyze_file(project_root, file).await;
            outcome.issues.extend(file_outcome.issues);
            outcome.warnings.extend(file_outcome.warnings);
        }
        outcome
    }
}

fn rule_applies(rule: &PatternRule, file: &str) -> bool {
    match rule.extensions {
        None => true,
        Some(exts) => FileAcceptance::Extensions(exts).accepts(file),
    }
}
