//! Shared fixtures for task context tests.

use crate::analysis::{
    adapters::{StubDefectModel, StubSegmenter},
    domain::ImageMetadata,
    services::{AnalysisPipeline, ImageNormalizer, InferenceBackend, PipelineConfig},
};
use crate::task::{
    adapters::memory::{InMemoryImageStore, InMemoryTaskRepository},
    domain::{ImageRef, OwnerRef, Task, TaskId},
    ports::{ImageStore, TaskRepository},
    services::{DispatchPolicy, TaskDispatcher},
};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use eyre::OptionExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mockable::Clock;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
            .single()
            .unwrap_or_default();
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

pub type TestDispatcher = TaskDispatcher<InMemoryTaskRepository, InMemoryImageStore, ManualClock>;

/// Dispatcher wired to in-memory stores and scripted models.
pub struct Harness {
    pub repository: Arc<InMemoryTaskRepository>,
    pub images: Arc<InMemoryImageStore>,
    pub clock: Arc<ManualClock>,
    pub segmenter: Arc<StubSegmenter>,
    pub defects: Arc<StubDefectModel>,
    pub dispatcher: TestDispatcher,
}

impl Harness {
    pub fn new(segmenter: StubSegmenter, defects: StubDefectModel, policy: DispatchPolicy) -> Self {
        let repository = Arc::new(InMemoryTaskRepository::new());
        let images = Arc::new(InMemoryImageStore::new());
        let clock = Arc::new(ManualClock::new());
        let segmenter = Arc::new(segmenter);
        let defects = Arc::new(defects);
        let backend = InferenceBackend::real(
            Arc::clone(&segmenter) as Arc<dyn crate::analysis::ports::SegmentationModel>,
            Arc::clone(&defects) as Arc<dyn crate::analysis::ports::DefectModel>,
        );
        let pipeline = Arc::new(AnalysisPipeline::new(backend, PipelineConfig::default()));
        let dispatcher = TaskDispatcher::new(
            Arc::clone(&repository),
            Arc::clone(&images),
            pipeline,
            ImageNormalizer::default(),
            policy,
            Arc::clone(&clock),
        );
        Self {
            repository,
            images,
            clock,
            segmenter,
            defects,
            dispatcher,
        }
    }

    /// Stores a pending task, uploading `bytes` as its source when given.
    pub async fn pending_task(&self, source: Option<Vec<u8>>) -> eyre::Result<Task> {
        let image_ref = ImageRef::new(format!("uploads/{}.png", TaskId::new()))?;
        if let Some(bytes) = source {
            self.images.write(&image_ref, &bytes).await?;
        }
        let task = Task::new(OwnerRef::new("user-7")?, image_ref, &*self.clock);
        self.repository.insert(&task).await?;
        Ok(task)
    }

    pub async fn reload(&self, id: TaskId) -> eyre::Result<Task> {
        self.repository
            .load(id)
            .await?
            .ok_or_eyre("task row disappeared")
    }
}

pub fn green_png(width: u32, height: u32) -> eyre::Result<Vec<u8>> {
    let pixels = RgbImage::from_pixel(width, height, Rgb([34, 139, 34]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(pixels).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub const fn sample_metadata() -> ImageMetadata {
    ImageMetadata {
        original_size_bytes: 2048,
        processed_size_bytes: 1024,
        original_dimensions: [1600, 1200],
        processed_dimensions: [800, 600],
    }
}
