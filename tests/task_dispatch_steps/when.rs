//! When steps for task dispatch BDD scenarios.

use super::world::{DispatchWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when("the task is dispatched")]
fn dispatch_once(world: &mut DispatchWorld) -> Result<(), eyre::Report> {
    dispatch(world, 1)
}

#[when("the task is dispatched {times:usize} times")]
fn dispatch_repeatedly(world: &mut DispatchWorld, times: usize) -> Result<(), eyre::Report> {
    dispatch(world, times)
}

fn dispatch(world: &mut DispatchWorld, times: usize) -> Result<(), eyre::Report> {
    let task_id = world
        .task_id
        .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;
    let dispatcher = world.dispatcher()?;
    for _ in 0..times {
        let outcome = run_async(dispatcher.dispatch(task_id)).wrap_err("dispatch task")?;
        world.outcomes.push(outcome);
    }
    Ok(())
}
