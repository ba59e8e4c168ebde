//! Worker pool tests over the seeded mock backend.

use super::helpers::{Stack, fast_policy, green_png};
use canopy::analysis::services::InferenceBackend;
use canopy::task::domain::{ImageRef, TaskFailureKind, TaskStatus};
use canopy::task::ports::WorkQueue;
use canopy::worker::WorkerStats;
use eyre::{OptionExt, ensure};
use rstest::{fixture, rstest};
use std::time::Duration;

#[fixture]
fn mock_stack() -> Stack {
    Stack::new(InferenceBackend::mock(Some(11)), fast_policy(3))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pool_completes_every_submission(mock_stack: Stack) -> eyre::Result<()> {
    let pool = mock_stack.spawn_pool(3);
    let source = green_png(320, 240)?;

    let mut submitted = Vec::new();
    for index in 0..6 {
        let task = mock_stack
            .submit(&format!("tree-{index}.png"), Some(&source))
            .await?;
        submitted.push(task.id());
    }

    for task_id in &submitted {
        let task = mock_stack.wait_until_terminal(*task_id).await?;
        ensure!(
            task.status() == TaskStatus::Completed,
            "task {task_id} ended as {}",
            task.status()
        );
        let score = task.health_score().ok_or_eyre("completed task has no score")?;
        ensure!((0.0..=1.0).contains(&score), "score {score} outside [0, 1]");
        ensure!(task.primary_label().is_some(), "mock always finds a tree");
        let processed = task
            .processed_image_ref()
            .ok_or_eyre("completed task has no processed image")?;
        ensure!(
            *processed == ImageRef::processed_for(*task_id),
            "unexpected processed ref {processed}"
        );
        ensure!(mock_stack.images.contains(processed), "processed image not stored");
    }

    pool.shutdown();
    let stats = pool.join().await?;
    ensure!(stats.completed == 6, "expected 6 completions, got {stats:?}");
    ensure!(stats.failed == 0 && stats.retried == 0, "unexpected stats {stats:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bad_sources_fail_without_retry(mock_stack: Stack) -> eyre::Result<()> {
    let pool = mock_stack.spawn_pool(2);

    let garbled = mock_stack
        .submit("garbled.png", Some(b"definitely not an image"))
        .await?;
    let missing = mock_stack.submit("never-uploaded.png", None).await?;

    let garbled = mock_stack.wait_until_terminal(garbled.id()).await?;
    let missing = mock_stack.wait_until_terminal(missing.id()).await?;

    for (task, kind) in [
        (&garbled, TaskFailureKind::InputDecode),
        (&missing, TaskFailureKind::SourceMissing),
    ] {
        ensure!(task.status() == TaskStatus::Failed, "expected failed task");
        let failure = task.error().ok_or_eyre("failed task has no error")?;
        ensure!(failure.kind == kind, "expected {kind}, got {}", failure.kind);
        ensure!(task.attempts() == 0, "source failures never start an attempt");
        ensure!(task.health_score().is_none(), "failed task carries a score");
    }

    pool.shutdown();
    let stats = pool.join().await?;
    ensure!(stats.failed == 2, "expected 2 failures, got {stats:?}");
    ensure!(stats.retried == 0, "source failures are not retried");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn owner_listing_reflects_terminal_reports(mock_stack: Stack) -> eyre::Result<()> {
    let pool = mock_stack.spawn_pool(2);
    let source = green_png(64, 64)?;
    let first = mock_stack.submit("first.png", Some(&source)).await?;
    let second = mock_stack.submit("second.png", None).await?;
    mock_stack.wait_until_terminal(first.id()).await?;
    mock_stack.wait_until_terminal(second.id()).await?;

    let reports = mock_stack.submissions.list_for_owner("user-42").await?;
    ensure!(reports.len() == 2, "expected two reports, got {}", reports.len());
    let statuses: Vec<_> = reports.iter().map(|report| report.status).collect();
    ensure!(statuses.contains(&TaskStatus::Completed), "missing completed report");
    ensure!(statuses.contains(&TaskStatus::Failed), "missing failed report");

    pool.shutdown();
    pool.join().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_workers_still_spawns_one() -> eyre::Result<()> {
    let stack = Stack::new(InferenceBackend::mock(None), fast_policy(0));
    let pool = stack.spawn_pool(0);
    ensure!(pool.len() == 1, "expected one worker, got {}", pool.len());

    pool.shutdown();
    let stats = pool.join().await?;
    ensure!(stats == WorkerStats::default(), "idle pool did work: {stats:?}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn closed_and_drained_queue_stops_workers() -> eyre::Result<()> {
    let stack = Stack::new(InferenceBackend::mock(Some(3)), fast_policy(0));
    let pool = stack.spawn_pool(2);
    let task = stack.submit("last.png", Some(&green_png(32, 32)?)).await?;
    stack.wait_until_terminal(task.id()).await?;

    stack.queue.close();
    let stats = tokio::time::timeout(Duration::from_secs(5), pool.join()).await??;
    ensure!(stats.completed == 1, "expected one completion, got {stats:?}");
    Ok(())
}
