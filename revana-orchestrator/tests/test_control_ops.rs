//! Integration tests for pause/resume/cancel semantics

mod common;

use std::time::{Duration, Instant};

use common::{await_progress, await_state, input, project, slow_registry};

use revana_orchestrator::{JobOutcome, JobState, RegistryError};

fn many_files(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("file{i:03}.txt")).collect()
}

fn fixture(files: &[String]) -> Vec<(&str, &str)> {
    files.iter().map(|name| (name.as_str(), "content\n")).collect()
}

#[tokio::test]
async fn pause_freezes_progress_and_resume_completes() {
    let files = many_files(40);
    let dir = project(&fixture(&files));
    let registry = slow_registry(Duration::from_millis(15));

    let file_refs: Vec<&str> = files.iter().map(String::as_str).collect();
    let job_id = registry
        .create(input(dir.path(), &file_refs, &["slowpoke"]))
        .unwrap();

    await_progress(&registry, job_id, 5).await;
    registry.pause(job_id).unwrap();
    assert_eq!(registry.status(job_id).unwrap().state, JobState::Paused);

    // Give the in-flight batch time to drain, then take two spaced
    // snapshots: completed_units must not grow while paused.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let first = registry.status(job_id).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    let second = registry.status(job_id).unwrap();
    assert_eq!(first.completed_units, second.completed_units);
    assert_eq!(second.state, JobState::Paused);
    assert!(second.completed_units < 40);

    registry.resume(job_id).unwrap();
    let state = await_state(&registry, job_id, JobState::Completed).await;
    assert_eq!(state, JobState::Completed);

    let status = registry.status(job_id).unwrap();
    assert_eq!(status.completed_units, 40);
    assert_eq!(status.live_tally.total, 40);
}

#[tokio::test]
async fn cancel_mid_flight_preserves_partial_issues() {
    let files = many_files(60);
    let dir = project(&fixture(&files));
    let registry = slow_registry(Duration::from_millis(10));

    let file_refs: Vec<&str> = files.iter().map(String::as_str).collect();
    let job_id = registry
        .create(input(dir.path(), &file_refs, &["slowpoke"]))
        .unwrap();

    let seen = await_progress(&registry, job_id, 5).await;
    let cancelled_at = Instant::now();
    registry.cancel(job_id).unwrap();

    let state = await_state(&registry, job_id, JobState::Cancelled).await;
    assert_eq!(state, JobState::Cancelled);
    // Well within the grace-plus-deadline bound
    assert!(cancelled_at.elapsed() < Duration::from_secs(10));

    let JobOutcome::Finished { report } = registry.result(job_id).unwrap() else {
        panic!("cancelled job must expose its partial result");
    };
    assert_eq!(report.state, JobState::Cancelled);
    assert!(report.summary.total >= seen.min(5));
    assert!(report.summary.total < 60);
    assert!(report.finished_at.is_some());

    // Terminal state is absorbing: no further progress after cancel settles
    let first = registry.status(job_id).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = registry.status(job_id).unwrap();
    assert_eq!(first.completed_units, second.completed_units);
}

#[tokio::test]
async fn cancel_while_paused_still_cancels() {
    let files = many_files(30);
    let dir = project(&fixture(&files));
    let registry = slow_registry(Duration::from_millis(10));

    let file_refs: Vec<&str> = files.iter().map(String::as_str).collect();
    let job_id = registry
        .create(input(dir.path(), &file_refs, &["slowpoke"]))
        .unwrap();

    await_progress(&registry, job_id, 3).await;
    registry.pause(job_id).unwrap();
    registry.cancel(job_id).unwrap();

    let state = await_state(&registry, job_id, JobState::Cancelled).await;
    assert_eq!(state, JobState::Cancelled);
}

#[tokio::test]
async fn resume_on_a_running_job_is_illegal_and_harmless() {
    let files = many_files(20);
    let dir = project(&fixture(&files));
    let registry = slow_registry(Duration::from_millis(10));

    let file_refs: Vec<&str> = files.iter().map(String::as_str).collect();
    let job_id = registry
        .create(input(dir.path(), &file_refs, &["slowpoke"]))
        .unwrap();
    await_progress(&registry, job_id, 1).await;

    let err = registry.resume(job_id).unwrap_err();
    assert!(matches!(err, RegistryError::IllegalState { .. }));
    assert_eq!(registry.status(job_id).unwrap().state, JobState::Running);

    // The job is unaffected and still completes
    let state = await_state(&registry, job_id, JobState::Completed).await;
    assert_eq!(state, JobState::Completed);
}

#[tokio::test]
async fn control_ops_on_terminal_jobs_are_illegal() {
    let dir = project(&[("a.txt", "x\n")]);
    let registry = slow_registry(Duration::from_millis(1));
    let job_id = registry
        .create(input(dir.path(), &["a.txt"], &["slowpoke"]))
        .unwrap();
    await_state(&registry, job_id, JobState::Completed).await;

    assert!(matches!(
        registry.pause(job_id),
        Err(RegistryError::IllegalState { .. })
    ));
    assert!(matches!(
        registry.resume(job_id),
        Err(RegistryError::IllegalState { .. })
    ));
    assert!(matches!(
        registry.cancel(job_id),
        Err(RegistryError::IllegalState { .. })
    ));
    assert_eq!(registry.status(job_id).unwrap().state, JobState::Completed);
}

#[tokio::test]
async fn control_ops_on_unknown_jobs_are_not_found() {
    let registry = slow_registry(Duration::from_millis(1));
    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        registry.pause(missing),
        Err(RegistryError::NotFound(_))
    ));
    assert!(matches!(
        registry.cancel(missing),
        Err(RegistryError::NotFound(_))
    ));
}

#[tokio::test]
async fn multiple_jobs_run_independently() {
    let files = many_files(15);
    let dir_a = project(&fixture(&files));
    let dir_b = project(&fixture(&files));
    let registry = slow_registry(Duration::from_millis(10));

    let file_refs: Vec<&str> = files.iter().map(String::as_str).collect();
    let job_a = registry
        .create(input(dir_a.path(), &file_refs, &["slowpoke"]))
        .unwrap();
    let job_b = registry
        .create(input(dir_b.path(), &file_refs, &["slowpoke"]))
        .unwrap();

    await_progress(&registry, job_a, 2).await;
    registry.cancel(job_a).unwrap();

    assert_eq!(
        await_state(&registry, job_a, JobState::Cancelled).await,
        JobState::Cancelled
    );
    assert_eq!(
        await_state(&registry, job_b, JobState::Completed).await,
        JobState::Completed
    );
    assert_eq!(registry.status(job_b).unwrap().completed_units, 15);
}
