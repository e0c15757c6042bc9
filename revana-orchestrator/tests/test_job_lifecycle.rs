//! Integration tests for the job lifecycle: planning, execution,
//! aggregation, and the final report

mod common;

use common::{await_state, input, pattern_registry, project};

use revana_core::domain::{Category, Severity, WarningKind};
use revana_orchestrator::{reporting, JobOutcome, JobState, RegistryError};

#[tokio::test]
async fn happy_path_produces_normalized_issues() {
    // a.js: two quality findings (lines 3 and 8); b.py: one security
    // finding (line 12); c.md: nothing
    let dir = project(&[
        (
            "a.js",
            "const x = 1;\n\nconsole.log(x);\nfunction f() {\n  return x;\n}\n\ndebugger;\n",
        ),
        (
            "b.py",
            &format!("{}password = \"hunter42\"\n", "# filler\n".repeat(11)),
        ),
        ("c.md", "# docs\nnothing suspicious here\n"),
    ]);
    let registry = pattern_registry();

    let job_id = registry
        .create(input(dir.path(), &["a.js", "b.py", "c.md"], &["pattern"]))
        .unwrap();

    let state = await_state(&registry, job_id, JobState::Completed).await;
    assert_eq!(state, JobState::Completed);

    let status = registry.status(job_id).unwrap();
    assert_eq!(status.completed_units, 3);
    assert_eq!(status.total_units, 3);
    assert_eq!(status.progress, 1.0);
    assert_eq!(status.live_tally.total, 3);
    assert_eq!(
        status.live_tally.total,
        status.live_tally.critical
            + status.live_tally.high
            + status.live_tally.medium
            + status.live_tally.low
    );

    let JobOutcome::Finished { report } = registry.result(job_id).unwrap() else {
        panic!("job is terminal, result must be ready");
    };
    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.affected_files, 2);
    assert_eq!(report.summary.critical, 1);
    assert_eq!(report.project_root, dir.path());
    assert!(report.finished_at.is_some());

    // a.js findings at lines 3 and 7, in file order
    let a_issues: Vec<_> = report.issues.iter().filter(|i| i.file == "a.js").collect();
    assert_eq!(a_issues.len(), 2);
    assert_eq!(a_issues[0].line, 3);
    assert_eq!(a_issues[1].line, 8);

    let b_issue = report.issues.iter().find(|i| i.file == "b.py").unwrap();
    assert_eq!(b_issue.line, 12);
    assert_eq!(b_issue.severity, Severity::Critical);
    assert_eq!(b_issue.category, Category::Security);
}

#[tokio::test]
async fn issue_ids_are_unique_within_a_job() {
    let dir = project(&[
        ("a.js", "console.log(1);\nconsole.log(2);\ndebugger;\n"),
        ("b.js", "console.log(3);\n"),
    ]);
    let registry = pattern_registry();
    let job_id = registry
        .create(input(dir.path(), &["a.js", "b.js"], &["pattern"]))
        .unwrap();
    await_state(&registry, job_id, JobState::Completed).await;

    let JobOutcome::Finished { report } = registry.result(job_id).unwrap() else {
        panic!("result must be ready");
    };
    let mut ids: Vec<&str> = report.issues.iter().map(|i| i.id.as_str()).collect();
    assert!(!ids.is_empty());
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), report.issues.len());
}

#[tokio::test]
async fn within_one_analyzer_issue_order_follows_file_submission_order() {
    let files: Vec<String> = (0..12).map(|i| format!("f{i:02}.go")).collect();
    let fixture: Vec<(&str, &str)> = files
        .iter()
        .map(|name| (name.as_str(), "// TODO: fill in\n"))
        .collect();
    let dir = project(&fixture);
    let registry = pattern_registry();

    let file_refs: Vec<&str> = files.iter().map(String::as_str).collect();
    let job_id = registry
        .create(input(dir.path(), &file_refs, &["pattern"]))
        .unwrap();
    await_state(&registry, job_id, JobState::Completed).await;

    let JobOutcome::Finished { report } = registry.result(job_id).unwrap() else {
        panic!("result must be ready");
    };
    let observed: Vec<&str> = report.issues.iter().map(|i| i.file.as_str()).collect();
    assert_eq!(observed, file_refs);
}

#[tokio::test]
async fn empty_fileset_completes_immediately() {
    let dir = project(&[]);
    let registry = pattern_registry();
    let job_id = registry.create(input(dir.path(), &[], &["pattern"])).unwrap();

    let state = await_state(&registry, job_id, JobState::Completed).await;
    assert_eq!(state, JobState::Completed);

    let status = registry.status(job_id).unwrap();
    assert_eq!(status.total_units, 0);
    assert_eq!(status.completed_units, 0);
    assert_eq!(status.live_tally.total, 0);
}

#[tokio::test]
async fn unmatched_categories_skip_the_analyzer_entirely() {
    let dir = project(&[("a.js", "console.log(1);\n")]);
    let registry = pattern_registry();

    // The pattern driver declares security+quality only
    let mut job_input = input(dir.path(), &["a.js"], &["pattern"]);
    job_input.categories = vec![Category::Performance];
    let job_id = registry.create(job_input).unwrap();

    let state = await_state(&registry, job_id, JobState::Completed).await;
    assert_eq!(state, JobState::Completed);
    let status = registry.status(job_id).unwrap();
    assert_eq!(status.total_units, 0);
    assert!(status.issues.unwrap().is_empty());
}

#[tokio::test]
async fn category_filter_drops_mapped_issues() {
    let dir = project(&[(
        "app.js",
        "console.log(1);\nconst password = \"hunter42\";\n",
    )]);
    let registry = pattern_registry();

    let mut job_input = input(dir.path(), &["app.js"], &["pattern"]);
    job_input.categories = vec![Category::Security];
    let job_id = registry.create(job_input).unwrap();
    await_state(&registry, job_id, JobState::Completed).await;

    let JobOutcome::Finished { report } = registry.result(job_id).unwrap() else {
        panic!("result must be ready");
    };
    assert_eq!(report.summary.total, 1);
    assert!(report
        .issues
        .iter()
        .all(|i| i.category == Category::Security));
}

#[tokio::test]
async fn nonexistent_fileset_entries_are_skipped_with_a_warning() {
    let dir = project(&[("real.js", "console.log(1);\n")]);
    let registry = pattern_registry();
    let job_id = registry
        .create(input(dir.path(), &["real.js", "ghost.js"], &["pattern"]))
        .unwrap();
    await_state(&registry, job_id, JobState::Completed).await;

    let JobOutcome::Finished { report } = registry.result(job_id).unwrap() else {
        panic!("result must be ready");
    };
    assert_eq!(report.summary.total, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::MissingFile);
    assert_eq!(report.warnings[0].file.as_deref(), Some("ghost.js"));
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let dir = project(&[]);
    let registry = pattern_registry();

    // Unknown analyzer
    let err = registry
        .create(input(dir.path(), &[], &["clippy"]))
        .unwrap_err();
    assert!(matches!(err, RegistryError::IllegalInput(_)));

    // Empty analyzer set
    let err = registry.create(input(dir.path(), &[], &[])).unwrap_err();
    assert!(matches!(err, RegistryError::IllegalInput(_)));

    // Empty category selection
    let mut job_input = input(dir.path(), &[], &["pattern"]);
    job_input.categories.clear();
    let err = registry.create(job_input).unwrap_err();
    assert!(matches!(err, RegistryError::IllegalInput(_)));

    // Root is not a directory
    let file_root = dir.path().join("not-a-dir.txt");
    std::fs::write(&file_root, "x").unwrap();
    let mut job_input = input(dir.path(), &[], &["pattern"]);
    job_input.project_root = file_root;
    let err = registry.create(job_input).unwrap_err();
    assert!(matches!(err, RegistryError::IllegalInput(_)));

    // Nothing was registered
    assert!(registry.jobs().is_empty());
}

#[tokio::test]
async fn status_of_unknown_job_is_not_found() {
    let registry = pattern_registry();
    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        registry.status(missing),
        Err(RegistryError::NotFound(_))
    ));
    assert!(matches!(
        registry.result(missing),
        Err(RegistryError::NotFound(_))
    ));
}

#[tokio::test]
async fn report_exports_render() {
    let dir = project(&[("a.js", "debugger;\n")]);
    let registry = pattern_registry();
    let job_id = registry
        .create(input(dir.path(), &["a.js"], &["pattern"]))
        .unwrap();
    await_state(&registry, job_id, JobState::Completed).await;

    let JobOutcome::Finished { report } = registry.result(job_id).unwrap() else {
        panic!("result must be ready");
    };

    let json = reporting::render_json(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["summary"]["total"], 1);

    let html = reporting::render_html(&report);
    assert!(html.contains("custom/debugger-statement"));
}
