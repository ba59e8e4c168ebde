//! Retries travelling back through the queue with short backoff.

use std::sync::Arc;

use super::helpers::{FlakySegmenter, Stack, fast_policy, green_png};
use canopy::analysis::{
    adapters::{StubDefectModel, StubSegmenter},
    domain::{RawDefect, TreeSpecies},
    ports::{DefectModel, InferenceError, SegmentationModel},
    services::InferenceBackend,
};
use canopy::task::domain::{TaskFailureKind, TaskStatus};
use eyre::{OptionExt, ensure};

fn backend(segmenter: Arc<dyn SegmentationModel>) -> InferenceBackend {
    let defects: Arc<dyn DefectModel> =
        Arc::new(StubDefectModel::returning(vec![RawDefect::new("crack", Some(0.9))]));
    InferenceBackend::real(segmenter, defects)
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_failures_recover() -> eyre::Result<()> {
    let segmenter = Arc::new(FlakySegmenter::new(2));
    let stack = Stack::new(
        backend(Arc::clone(&segmenter) as Arc<dyn SegmentationModel>),
        fast_policy(3),
    );
    let pool = stack.spawn_pool(2);

    let task = stack.submit("flaky.png", Some(&green_png(100, 80)?)).await?;
    let task = stack.wait_until_terminal(task.id()).await?;

    ensure!(task.status() == TaskStatus::Completed, "ended as {}", task.status());
    ensure!(task.attempts() == 3, "expected 3 attempts, got {}", task.attempts());
    ensure!(segmenter.calls() == 3, "segmenter called {} times", segmenter.calls());
    ensure!(task.primary_label() == Some(TreeSpecies::Oak), "unexpected species");
    let score = task.health_score().ok_or_eyre("missing score")?;
    ensure!((score - 0.56).abs() < 1e-9, "expected 0.56, got {score}");

    pool.shutdown();
    let stats = pool.join().await?;
    ensure!(stats.retried == 2, "expected 2 retries, got {stats:?}");
    ensure!(stats.completed == 1, "expected 1 completion, got {stats:?}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_budget_fails_as_transient_backend() -> eyre::Result<()> {
    let segmenter = Arc::new(StubSegmenter::failing(InferenceError::Transient(
        "accelerator busy".to_owned(),
    )));
    let stack = Stack::new(
        backend(Arc::clone(&segmenter) as Arc<dyn SegmentationModel>),
        fast_policy(2),
    );
    let pool = stack.spawn_pool(1);

    let task = stack.submit("busy.png", Some(&green_png(48, 48)?)).await?;
    let task = stack.wait_until_terminal(task.id()).await?;

    ensure!(task.status() == TaskStatus::Failed, "ended as {}", task.status());
    let failure = task.error().ok_or_eyre("failed task has no error")?;
    ensure!(
        failure.kind == TaskFailureKind::TransientBackend,
        "unexpected kind {}",
        failure.kind
    );
    ensure!(failure.attempts == 3, "expected 3 attempts, got {}", failure.attempts);
    ensure!(segmenter.calls() == 3, "segmenter called {} times", segmenter.calls());

    pool.shutdown();
    let stats = pool.join().await?;
    ensure!(stats.retried == 2 && stats.failed == 1, "unexpected stats {stats:?}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unavailable_model_fails_immediately() -> eyre::Result<()> {
    let segmenter = Arc::new(StubSegmenter::failing(InferenceError::Unavailable(
        "weights missing".to_owned(),
    )));
    let stack = Stack::new(
        backend(Arc::clone(&segmenter) as Arc<dyn SegmentationModel>),
        fast_policy(3),
    );
    let pool = stack.spawn_pool(1);

    let task = stack.submit("offline.png", Some(&green_png(48, 48)?)).await?;
    let task = stack.wait_until_terminal(task.id()).await?;

    let failure = task.error().ok_or_eyre("failed task has no error")?;
    ensure!(
        failure.kind == TaskFailureKind::ModelUnavailable,
        "unexpected kind {}",
        failure.kind
    );
    ensure!(task.attempts() == 1, "expected a single attempt");

    pool.shutdown();
    let stats = pool.join().await?;
    ensure!(stats.retried == 0, "unavailable models are not retried");
    Ok(())
}
