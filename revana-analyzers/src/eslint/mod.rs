//! JavaScript/TypeScript lint driver backed by ESLint
//!
//! Invokes ESLint through `npx` with a bundled flat-free JSON config so the
//! target project's own lint setup never interferes with review results.

mod output;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use revana_core::config::DriverConfig;
use revana_core::domain::{Category, DriverWarning, Issue, Severity};

use crate::driver::{
    relative_to_root, AnalyzerDescriptor, AnalyzerDriver, DriverOutcome, FileAcceptance,
};
use crate::process::{ProcessError, ProcessRunner};

pub const ESLINT_NAME: &str = "eslint";

const EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

/// Rules mapped to the security category; `security/`-prefixed rules come
/// from the eslint-plugin-security plug-in
const SECURITY_RULES: &[&str] = &[
    "no-eval",
    "no-implied-eval",
    "no-new-func",
    "security/detect-sql-injection",
    "security/detect-unsafe-regex",
    "security/detect-buffer-noassert",
    "security/detect-child-process",
    "security/detect-disable-mustache-escape",
    "security/detect-eval-with-expression",
    "security/detect-no-csrf-before-method-override",
    "security/detect-non-literal-fs-filename",
    "security/detect-non-literal-regexp",
    "security/detect-non-literal-require",
    "security/detect-object-injection",
    "security/detect-possible-timing-attacks",
    "security/detect-pseudoRandomBytes",
];

const PERFORMANCE_RULES: &[&str] = &["no-loop-func", "no-await-in-loop"];

/// Bundled ESLint configuration, staged to a temp file per invocation so the
/// project's own `.eslintrc` never applies
const ESLINT_CONFIG: &str = r#"{
  "env": { "browser": true, "node": true, "es2022": true },
  "parserOptions": { "ecmaVersion": "latest", "sourceType": "module", "ecmaFeatures": { "jsx": true } },
  "rules": {
    "no-eval": "error",
    "no-implied-eval": "error",
    "no-new-func": "error",
    "no-loop-func": "warn",
    "no-await-in-loop": "warn",
    "no-unused-vars": "warn",
    "no-undef": "warn",
    "no-debugger": "error",
    "eqeqeq": "warn",
    "no-var": "warn"
  }
}
"#;

pub struct EslintDriver {
    descriptor: AnalyzerDescriptor,
    executable: String,
    runner: ProcessRunner,
}

impl EslintDriver {
    pub fn new(config: &DriverConfig, grace: Duration) -> Self {
        Self {
            descriptor: AnalyzerDescriptor {
                name: ESLINT_NAME,
                acceptance: FileAcceptance::Extensions(EXTENSIONS),
                categories: &[Category::Security, Category::Performance, Category::Quality],
                // Batches keep command lines short
                batch_size: 10,
                deadline: config.timeout(),
                // ESLint exits 1 when it reports problems
                tolerated_exit_codes: &[1],
            },
            executable: config.executable.clone(),
            runner: ProcessRunner::new(grace),
        }
    }

    fn parse_report(&self, project_root: &Path, stdout: &str) -> Result<Vec<Issue>, serde_json::Error> {
        let reports: Vec<output::EslintFileReport> = serde_json::from_str(stdout)?;

        let mut issues = Vec::new();
        for report in reports {
            let file = relative_to_root(project_root, &report.file_path);
            for message in report.messages {
                let rule = message.rule_id.unwrap_or_else(|| "unknown".to_string());
                issues.push(Issue {
                    id: String::new(),
                    file: file.clone(),
                    line: message.line,
                    column: message.column,
                    severity: map_severity(message.severity),
                    category: map_category(&rule),
                    rule,
                    message: message.message,
                    snippet: None,
                    analyzer: ESLINT_NAME.to_string(),
                });
            }
        }
        Ok(issues)
    }
}

#[async_trait]
impl AnalyzerDriver for EslintDriver {
    fn descriptor(&self) -> &AnalyzerDescriptor {
        &self.descriptor
    }

    async fn analyze(
        &self,
        project_root: &Path,
        files: &[String],
        cancel: &CancellationToken,
    ) -> DriverOutcome {
        let staging = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                return DriverOutcome::warning(DriverWarning::tool_error(
                    ESLINT_NAME,
                    format!("failed to stage lint config: {e}"),
                ));
            }
        };
        let config_path = staging.path().join("eslintrc.json");
        if let Err(e) = std::fs::write(&config_path, ESLINT_CONFIG) {
            return DriverOutcome::warning(DriverWarning::tool_error(
                ESLINT_NAME,
                format!("failed to stage lint config: {e}"),
            ));
        }

        let mut cmd = Command::new(&self.executable);
        cmd.arg("eslint")
            .arg("--format")
            .arg("json")
            .arg("--no-eslintrc")
            .arg("--config")
            .arg(&config_path)
            .args(files)
            .current_dir(project_root);

        let output = match self
            .runner
            .run(&self.executable, cmd, self.descriptor.deadline, cancel)
            .await
        {
            Ok(output) => output,
            Err(ProcessError::Spawn { command, source }) => {
                return DriverOutcome::warning(DriverWarning::missing_binary(
                    ESLINT_NAME,
                    format!("could not run `{command}`: {source}"),
                ));
            }
            Err(e @ ProcessError::DeadlineExceeded { .. }) => {
                return DriverOutcome::warning(DriverWarning::timeout(ESLINT_NAME, e.to_string()));
            }
            Err(ProcessError::Cancelled { .. }) => return DriverOutcome::empty(),
        };

        if !self.descriptor.tolerates_exit(output.status_code) {
            return DriverOutcome::warning(DriverWarning::tool_error(
                ESLINT_NAME,
                format!(
                    "eslint exited with {:?}: {}",
                    output.status_code,
                    output.stderr.trim()
                ),
            ));
        }

        // A JSON report is always expected, even with zero findings
        if output.stdout.trim().is_empty() {
            return DriverOutcome::warning(DriverWarning::parse_failure(
                ESLINT_NAME,
                "eslint produced no report output",
            ));
        }

        match self.parse_report(project_root, &output.stdout) {
            Ok(issues) => {
                debug!(count = issues.len(), "eslint batch parsed");
                DriverOutcome {
                    issues,
                    warnings: Vec::new(),
                }
            }
            Err(e) => DriverOutcome::warning(DriverWarning::parse_failure(
                ESLINT_NAME,
                format!("failed to parse eslint report: {e}"),
            )),
        }
    }
}

/// ESLint severity: 2 = error, 1 = warning
fn map_severity(eslint_severity: u8) -> Severity {
    if eslint_severity == 2 {
        Severity::High
    } else {
        Severity::Medium
    }
}

fn map_category(rule_id: &str) -> Category {
    if SECURITY_RULES.contains(&rule_id) || rule_id.starts_with("security/") {
        Category::Security
    } else if PERFORMANCE_RULES.contains(&rule_id) {
        Category::Performance
    } else {
        Category::Quality
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_REPORT: &str = r#"[
        {
            "filePath": "/proj/src/app.js",
            "messages": [
                { "ruleId": "no-eval", "severity": 2, "line": 3, "column": 5, "message": "eval can be harmful." },
                { "ruleId": "no-unused-vars", "severity": 1, "line": 7, "column": 9, "message": "'x' is defined but never used." },
                { "ruleId": null, "severity": 2, "line": 1, "column": 1, "message": "Parsing error." }
            ]
        },
        { "filePath": "/proj/src/ok.js", "messages": [] }
    ]"#;

    fn driver() -> EslintDriver {
        EslintDriver::new(&DriverConfig::default(), Duration::from_secs(1))
    }

    #[test]
    fn parses_report_and_normalizes_paths() {
        let issues = driver()
            .parse_report(Path::new("/proj"), SAMPLE_REPORT)
            .unwrap();
        assert_eq!(issues.len(), 3);

        assert_eq!(issues[0].file, "src/app.js");
        assert_eq!(issues[0].line, 3);
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[0].category, Category::Security);
        assert_eq!(issues[0].rule, "no-eval");

        assert_eq!(issues[1].severity, Severity::Medium);
        assert_eq!(issues[1].category, Category::Quality);

        // Rule-less parse errors fall back to "unknown" / quality
        assert_eq!(issues[2].rule, "unknown");
        assert_eq!(issues[2].category, Category::Quality);
    }

    #[test]
    fn category_mapping() {
        assert_eq!(map_category("security/detect-object-injection"), Category::Security);
        assert_eq!(map_category("security/some-future-rule"), Category::Security);
        assert_eq!(map_category("no-await-in-loop"), Category::Performance);
        assert_eq!(map_category("eqeqeq"), Category::Quality);
    }

    #[test]
    fn garbage_output_is_a_parse_error() {
        assert!(driver()
            .parse_report(Path::new("/proj"), "npm WARN deprecated")
            .is_err());
    }

    #[tokio::test]
    async fn missing_binary_yields_warning_not_issues() {
        let config = DriverConfig {
            executable: "revana-missing-eslint".to_string(),
            timeout_secs: 5,
        };
        let driver = EslintDriver::new(&config, Duration::from_millis(100));
        let outcome = driver
            .analyze(
                Path::new("/tmp"),
                &["a.js".to_string()],
                &CancellationToken::new(),
            )
            .await;
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(
            outcome.warnings[0].kind,
            revana_core::domain::WarningKind::MissingBinary
        );
    }
}
