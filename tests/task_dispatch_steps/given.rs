//! Given steps for task dispatch BDD scenarios.

use std::io::Cursor;

use super::world::{DispatchWorld, run_async};
use canopy::analysis::{
    adapters::{StubDefectModel, StubSegmenter},
    domain::{BoundingBox, Instance, RawDefect},
    ports::InferenceError,
};
use canopy::task::{
    domain::{ImageRef, OwnerRef, Task, TaskId},
    ports::{ImageStore, TaskRepository},
};
use eyre::WrapErr;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mockable::DefaultClock;
use rstest_bdd_macros::given;

#[given("a segmentation model that finds an oak with confidence {confidence:f64}")]
fn segmenter_finds_oak(world: &mut DispatchWorld, confidence: f64) {
    world.segmenter = Some(StubSegmenter::returning(vec![Instance::rectangular(
        "oak",
        confidence,
        BoundingBox::new(0, 0, 200, 150),
    )]));
}

#[given("a segmentation model that finds nothing")]
fn segmenter_finds_nothing(world: &mut DispatchWorld) {
    world.segmenter = Some(StubSegmenter::returning(Vec::new()));
}

#[given("a segmentation model that is temporarily unavailable")]
fn segmenter_unavailable(world: &mut DispatchWorld) {
    world.segmenter = Some(StubSegmenter::failing(InferenceError::Transient(
        "accelerator busy".to_owned(),
    )));
}

#[given(r#"a defect model reporting a "{label}" with confidence {confidence:f64}"#)]
fn defect_model_reports(world: &mut DispatchWorld, label: String, confidence: f64) {
    world.defects = Some(StubDefectModel::returning(vec![RawDefect::new(
        label,
        Some(confidence),
    )]));
}

#[given("a defect model that fails")]
fn defect_model_fails(world: &mut DispatchWorld) {
    world.defects = Some(StubDefectModel::failing(InferenceError::Failed(
        "tensor shape mismatch".to_owned(),
    )));
}

#[given("a retry budget of {retries:u32}")]
fn retry_budget(world: &mut DispatchWorld, retries: u32) {
    world.policy.retry.max_retries = retries;
}

#[given("a pending task whose source is a {width:u32}x{height:u32} photo")]
fn pending_task_with_photo(
    world: &mut DispatchWorld,
    width: u32,
    height: u32,
) -> Result<(), eyre::Report> {
    let pixels = RgbImage::from_pixel(width, height, Rgb([34, 139, 34]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(pixels)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .wrap_err("encode scenario photo")?;
    store_pending_task(world, &bytes)
}

#[given("a pending task whose source cannot be decoded")]
fn pending_task_with_garbage(world: &mut DispatchWorld) -> Result<(), eyre::Report> {
    store_pending_task(world, b"GIF89a but not really")
}

fn store_pending_task(world: &mut DispatchWorld, bytes: &[u8]) -> Result<(), eyre::Report> {
    let image_ref = ImageRef::new(format!("uploads/{}.png", TaskId::new()))?;
    run_async(world.images.write(&image_ref, bytes)).wrap_err("upload scenario source")?;
    let task = Task::new(OwnerRef::new("user-7")?, image_ref, &DefaultClock);
    run_async(world.repository.insert(&task)).wrap_err("insert scenario task")?;
    world.task_id = Some(task.id());
    Ok(())
}
