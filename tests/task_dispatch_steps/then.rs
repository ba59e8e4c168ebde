//! Then steps for task dispatch BDD scenarios.

use std::time::Duration;

use super::world::DispatchWorld;
use canopy::analysis::domain::TreeSpecies;
use canopy::task::{
    domain::TaskStatus,
    services::{DispatchOutcome, SkipReason},
};
use rstest_bdd_macros::then;

const SCORE_TOLERANCE: f64 = 1e-9;

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &DispatchWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world.task()?;
    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            task.status()
        ));
    }
    Ok(())
}

#[then(r#"the task failed with kind "{kind}""#)]
fn task_failed_with_kind(world: &DispatchWorld, kind: String) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let failure = task
        .error()
        .ok_or_else(|| eyre::eyre!("task has no failure payload"))?;
    if failure.kind.as_str() != kind {
        return Err(eyre::eyre!("expected failure kind {kind}, found {}", failure.kind));
    }
    Ok(())
}

#[then("the task has {attempts:u32} attempts")]
fn task_has_attempts(world: &DispatchWorld, attempts: u32) -> Result<(), eyre::Report> {
    let task = world.task()?;
    if task.attempts() != attempts {
        return Err(eyre::eyre!(
            "expected {attempts} attempts, found {}",
            task.attempts()
        ));
    }
    Ok(())
}

#[then(r#"the primary label is "{label}""#)]
fn primary_label_is(world: &DispatchWorld, label: String) -> Result<(), eyre::Report> {
    let expected = TreeSpecies::try_from(label.as_str())
        .map_err(|err| eyre::eyre!("invalid expected label in scenario: {err}"))?;
    let task = world.task()?;
    if task.primary_label() != Some(expected) {
        return Err(eyre::eyre!(
            "expected primary label {expected}, found {:?}",
            task.primary_label()
        ));
    }
    Ok(())
}

#[then("the health score is {score:f64}")]
fn health_score_is(world: &DispatchWorld, score: f64) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let actual = task
        .health_score()
        .ok_or_else(|| eyre::eyre!("task has no health score"))?;
    if (actual - score).abs() > SCORE_TOLERANCE {
        return Err(eyre::eyre!("expected health score {score}, found {actual}"));
    }
    Ok(())
}

#[then("the task has no findings")]
fn task_has_no_findings(world: &DispatchWorld) -> Result<(), eyre::Report> {
    let task = world.task()?;
    if !task.findings().is_empty() {
        return Err(eyre::eyre!("expected no findings, found {:?}", task.findings()));
    }
    Ok(())
}

#[then("the processed image is {width:u32}x{height:u32}")]
fn processed_image_is(world: &DispatchWorld, width: u32, height: u32) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let metadata = task
        .image_metadata()
        .ok_or_else(|| eyre::eyre!("task has no image metadata"))?;
    if metadata.processed_dimensions != [width, height] {
        return Err(eyre::eyre!(
            "expected {width}x{height}, found {:?}",
            metadata.processed_dimensions
        ));
    }
    let processed = task
        .processed_image_ref()
        .ok_or_else(|| eyre::eyre!("task has no processed image"))?;
    if !world.images.contains(processed) {
        return Err(eyre::eyre!("processed image {processed} was not stored"));
    }
    Ok(())
}

#[then("a retry was scheduled after {seconds:u64} seconds")]
fn retry_scheduled_after(world: &DispatchWorld, seconds: u64) -> Result<(), eyre::Report> {
    let expected = DispatchOutcome::RetryScheduled {
        delay: Duration::from_secs(seconds),
    };
    match world.outcomes.last() {
        Some(outcome) if *outcome == expected => Ok(()),
        other => Err(eyre::eyre!("expected {expected:?}, found {other:?}")),
    }
}

#[then("the last delivery was skipped")]
fn last_delivery_skipped(world: &DispatchWorld) -> Result<(), eyre::Report> {
    match world.outcomes.last() {
        Some(DispatchOutcome::Skipped(SkipReason::AlreadyTerminal)) => Ok(()),
        other => Err(eyre::eyre!("expected an already-terminal skip, found {other:?}")),
    }
}
