//! Python security driver backed by Bandit
//!
//! Bandit is invoked one file at a time (`-f json -ll`), which keeps
//! progress granular and isolates a pathological file to its own deadline.
//! Every Bandit finding is a security issue.

mod output;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use revana_core::config::DriverConfig;
use revana_core::domain::{Category, DriverWarning, Issue, Severity};

use crate::driver::{AnalyzerDescriptor, AnalyzerDriver, DriverOutcome, FileAcceptance};
use crate::process::{ProcessError, ProcessRunner};

pub const BANDIT_NAME: &str = "bandit";

pub struct BanditDriver {
    descriptor: AnalyzerDescriptor,
    executable: String,
    runner: ProcessRunner,
}

impl BanditDriver {
    pub fn new(config: &DriverConfig, grace: Duration) -> Self {
        Self {
            descriptor: AnalyzerDescriptor {
                name: BANDIT_NAME,
                acceptance: FileAcceptance::Extensions(&["py"]),
                categories: &[Category::Security],
                batch_size: 1,
                deadline: config.timeout(),
                // Bandit exits 1 when it reports findings
                tolerated_exit_codes: &[1],
            },
            executable: config.executable.clone(),
            runner: ProcessRunner::new(grace),
        }
    }

    async fn analyze_file(
        &self,
        project_root: &Path,
        file: &str,
        cancel: &CancellationToken,
    ) -> DriverOutcome {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("-f")
            .arg("json")
            // Report low severity and above
            .arg("-ll")
            .arg(file)
            .current_dir(project_root);

        let output = match self
            .runner
            .run(&self.executable, cmd, self.descriptor.deadline, cancel)
            .await
        {
            Ok(output) => output,
            Err(ProcessError::Spawn { command, source }) => {
                return DriverOutcome::warning(DriverWarning::missing_binary(
                    BANDIT_NAME,
                    format!("could not run `{command}`: {source}"),
                ));
            }
            Err(e @ ProcessError::DeadlineExceeded { .. }) => {
                let mut warning = DriverWarning::timeout(BANDIT_NAME, e.to_string());
                warning.file = Some(file.to_string());
                return DriverOutcome::warning(warning);
            }
            Err(ProcessError::Cancelled { .. }) => return DriverOutcome::empty(),
        };

        if !self.descriptor.tolerates_exit(output.status_code) {
            return DriverOutcome::warning(DriverWarning::tool_error(
                BANDIT_NAME,
                format!(
                    "bandit exited with {:?} on {}: {}",
                    output.status_code,
                    file,
                    output.stderr.trim()
                ),
            ));
        }

        // A JSON report is always expected, even with zero findings
        if output.stdout.trim().is_empty() {
            return DriverOutcome::warning(DriverWarning::parse_failure(
                BANDIT_NAME,
                format!("bandit produced no report output for {file}"),
            ));
        }

        match parse_report(file, &output.stdout) {
            Ok(issues) => DriverOutcome {
                issues,
                warnings: Vec::new(),
            },
            Err(e) => DriverOutcome::warning(DriverWarning::parse_failure(
                BANDIT_NAME,
                format!("failed to parse bandit report for {file}: {e}"),
            )),
        }
    }
}

#[async_trait]
impl AnalyzerDriver for BanditDriver {
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
            let file_outcome = self.analyze_file(project_root, file, cancel).await;
            outcome.issues.extend(file_outcome.issues);
            outcome.warnings.extend(file_outcome.warnings);
        }
        outcome
    }
}

fn parse_report(file: &str, stdout: &str) -> Result<Vec<Issue>, serde_json::Error> {
    let report: output::BanditReport = serde_json::from_str(stdout)?;

    Ok(report
        .results
        .into_iter()
        .map(|finding| Issue {
            id: String::new(),
            file: file.to_string(),
            line: finding.line_number,
            column: finding.col_offset,
            severity: map_severity(&finding.issue_severity),
            category: Category::Security,
            rule: if finding.test_id.is_empty() {
                "unknown".to_string()
            } else {
                finding.test_id
            },
            message: if finding.issue_text.is_empty() {
                "Security issue detected".to_string()
            } else {
                finding.issue_text
            },
            snippet: finding.code,
            analyzer: BANDIT_NAME.to_string(),
        })
        .collect())
}

/// Bandit's scale tops out at HIGH; shift it up so its worst findings land
/// on `critical`
fn map_severity(bandit_severity: &str) -> Severity {
    match bandit_severity.to_uppercase().as_str() {
        "HIGH" => Severity::Critical,
        "MEDIUM" => Severity::High,
        "LOW" => Severity::Medium,
        _ => Severity::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_REPORT: &str = r#"{
        "results": [
            {
                "line_number": 12,
                "col_offset": 4,
                "issue_severity": "HIGH",
                "test_id": "B602",
                "issue_text": "subprocess call with shell=True identified.",
                "code": "subprocess.call(cmd, shell=True)"
            },
            {
                "line_number": 30,
                "col_offset": 0,
                "issue_severity": "LOW",
                "test_id": "B404",
                "issue_text": "Consider possible security implications.",
                "code": null
            }
        ]
    }"#;

    #[test]
    fn parses_findings() {
        let issues = parse_report("app/main.py", SAMPLE_REPORT).unwrap();
        assert_eq!(issues.len(), 2);

        assert_eq!(issues[0].file, "app/main.py");
        assert_eq!(issues[0].line, 12);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].category, Category::Security);
        assert_eq!(issues[0].rule, "B602");
        assert!(issues[0].snippet.is_some());

        assert_eq!(issues[1].severity, Severity::Medium);
        assert!(issues[1].snippet.is_none());
    }

    #[test]
    fn severity_mapping_shifts_up() {
        assert_eq!(map_severity("HIGH"), Severity::Critical);
        assert_eq!(map_severity("medium"), Severity::High);
        assert_eq!(map_severity("LOW"), Severity::Medium);
        assert_eq!(map_severity("UNDEFINED"), Severity::Low);
    }

    #[tokio::test]
    async fn missing_binary_yields_warning() {
        let config = DriverConfig {
            executable: "revana-missing-bandit".to_string(),
            timeout_secs: 5,
        };
        let driver = BanditDriver::new(&config, Duration::from_millis(100));
        let outcome = driver
            .analyze(
                Path::new("/tmp"),
                &["x.py".to_string()],
                &CancellationToken::new(),
            )
            .await;
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].message.contains("revana-missing-bandit"));
    }
}
