//! Semgrep driver with bundled rules
//!
//! Runs Semgrep over a self-contained rule file staged to a temp directory,
//! so results do not depend on a rules checkout. Semgrep's exit codes are
//! famously noisy: 1 means findings, 2 and 7 are fatal-but-partial modes
//! whose JSON is still usable, so all of them are tolerated.

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

pub const SEMGREP_NAME: &str = "semgrep";

const SECURITY_KEYWORDS: &[&str] = &[
    "security",
    "crypto",
    "injection",
    "xss",
    "csrf",
    "auth",
    "password",
    "secret",
    "token",
    "key",
    "sql",
    "command",
    "xxe",
    "deserialization",
];

const PERFORMANCE_KEYWORDS: &[&str] = &[
    "performance",
    "inefficient",
    "slow",
    "optimization",
    "memory",
    "leak",
    "blocking",
    "synchronous",
];

/// Bundled rule pack staged to a temp file per invocation
const RULES_YAML: &str = r#"rules:
  - id: python-eval-injection
    languages: [python]
    message: "Avoid eval() on dynamic input; it executes arbitrary code"
    severity: ERROR
    pattern: eval(...)
  - id: python-exec-injection
    languages: [python]
    message: "Avoid exec() on dynamic input; it executes arbitrary code"
    severity: ERROR
    pattern: exec(...)
  - id: python-subprocess-shell-injection
    languages: [python]
    message: "subprocess with shell=True enables command injection"
    severity: ERROR
    patterns:
      - pattern: subprocess.$FUNC(..., shell=True, ...)
  - id: python-sql-string-concat
    languages: [python]
    message: "SQL query built by string concatenation; use parameterized queries"
    severity: WARNING
    patterns:
      - pattern: $CURSOR.execute($QUERY + $VAR, ...)
  - id: js-eval-injection
    languages: [javascript, typescript]
    message: "Avoid eval(); it executes arbitrary code"
    severity: ERROR
    pattern: eval(...)
  - id: js-innerhtml-xss
    languages: [javascript, typescript]
    message: "Assignment to innerHTML can lead to XSS; prefer textContent"
    severity: WARNING
    patterns:
      - pattern: $EL.innerHTML = $VAL
  - id: js-settimeout-string
    languages: [javascript, typescript]
    message: "setTimeout with a string argument is implied eval"
    severity: WARNING
    patterns:
      - pattern: setTimeout("...", ...)
  - id: generic-blocking-sleep-in-loop
    languages: [python]
    message: "Blocking sleep inside a loop; consider batching or async waits"
    severity: INFO
    patterns:
      - pattern: |
          while ...:
              ...
              time.sleep(...)
"#;

pub struct SemgrepDriver {
    descriptor: AnalyzerDescriptor,
    executable: String,
    runner: ProcessRunner,
}

impl SemgrepDriver {
    pub fn new(config: &DriverConfig, grace: Duration) -> Self {
        Self {
            descriptor: AnalyzerDescriptor {
                name: SEMGREP_NAME,
                acceptance: FileAcceptance::AnyFile,
                categories: &[Category::Security, Category::Performance, Category::Quality],
                // Semgrep amortizes startup cost well over large batches
                batch_size: 50,
                deadline: config.timeout(),
                tolerated_exit_codes: &[1, 2, 7],
            },
            executable: config.executable.clone(),
            runner: ProcessRunner::new(grace),
        }
    }

    fn parse_report(&self, project_root: &Path, stdout: &str) -> Result<Vec<Issue>, String> {
        // The status bar and warnings may wrap the JSON document; cut it out
        let json = extract_json(stdout).ok_or_else(|| "no JSON document in output".to_string())?;
        let report: output::SemgrepOutput =
            serde_json::from_str(json).map_err(|e| e.to_string())?;

        Ok(report
            .results
            .into_iter()
            .map(|result| {
                let snippet = result.extra.lines.trim();
                Issue {
                    id: String::new(),
                    file: relative_to_root(project_root, &result.path),
                    line: result.start.line,
                    column: result.start.col,
                    severity: map_severity(&result.extra.severity),
                    category: map_category(&result.check_id),
                    message: if result.extra.message.is_empty() {
                        "Security/Quality issue detected".to_string()
                    } else {
                        result.extra.message
                    },
                    snippet: if snippet.is_empty() {
                        None
                    } else {
                        Some(snippet.to_string())
                    },
                    rule: result.check_id,
                    analyzer: SEMGREP_NAME.to_string(),
                }
            })
            .collect())
    }
}

#[async_trait]
impl AnalyzerDriver for SemgrepDriver {
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
                    SEMGREP_NAME,
                    format!("failed to stage rules: {e}"),
                ));
            }
        };
        let rules_path = staging.path().join("rules.yaml");
        if let Err(e) = std::fs::write(&rules_path, RULES_YAML) {
            return DriverOutcome::warning(DriverWarning::tool_error(
                SEMGREP_NAME,
                format!("failed to stage rules: {e}"),
            ));
        }

        let mut cmd = Command::new(&self.executable);
        cmd.arg("--json")
            // The fileset was already filtered upstream
            .arg("--no-git-ignore")
            .arg("--metrics=off")
            .arg("--disable-version-check")
            .arg("--config")
            .arg(&rules_path)
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
                    SEMGREP_NAME,
                    format!("could not run `{command}`: {source}"),
                ));
            }
            Err(e @ ProcessError::DeadlineExceeded { .. }) => {
                return DriverOutcome::warning(DriverWarning::timeout(SEMGREP_NAME, e.to_string()));
            }
            Err(ProcessError::Cancelled { .. }) => return DriverOutcome::empty(),
        };

        if !self.descriptor.tolerates_exit(output.status_code) {
            return DriverOutcome::warning(DriverWarning::tool_error(
                SEMGREP_NAME,
                format!(
                    "semgrep exited with {:?}: {}",
                    output.status_code,
                    output.stderr.trim()
                ),
            ));
        }

        // A JSON document is always expected, even with zero findings
        if output.stdout.trim().is_empty() {
            return DriverOutcome::warning(DriverWarning::parse_failure(
                SEMGREP_NAME,
                "semgrep produced no report output",
            ));
        }

        match self.parse_report(project_root, &output.stdout) {
            Ok(issues) => {
                debug!(count = issues.len(), "semgrep batch parsed");
                DriverOutcome {
                    issues,
                    warnings: Vec::new(),
                }
            }
            Err(e) => DriverOutcome::warning(DriverWarning::parse_failure(
                SEMGREP_NAME,
                format!("failed to parse semgrep report: {e}"),
            )),
        }
    }
}

fn extract_json(stdout: &str) -> Option<&str> {
    let start = stdout.find('{')?;
    let end = stdout.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&stdout[start..=end])
}

fn map_severity(semgrep_severity: &str) -> Severity {
    match semgrep_severity.to_uppercase().as_str() {
        "ERROR" => Severity::Critical,
        "WARNING" => Severity::High,
        "INFO" => Severity::Medium,
        _ => Severity::Low,
    }
}

fn map_category(check_id: &str) -> Category {
    let check_id = check_id.to_lowercase();
    if SECURITY_KEYWORDS.iter().any(|kw| check_id.contains(kw)) {
        Category::Security
    } else if PERFORMANCE_KEYWORDS.iter().any(|kw| check_id.contains(kw)) {
        Category::Performance
    } else {
        Category::Quality
    }
}
