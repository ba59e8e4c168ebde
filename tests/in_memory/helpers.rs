//! Shared wiring for the in-memory end-to-end tests.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use canopy::analysis::{
    domain::{BoundingBox, Instance},
    ports::{InferenceError, InferenceResult, SegmentationModel},
    services::{AnalysisPipeline, ImageNormalizer, InferenceBackend, PipelineConfig},
};
use canopy::task::{
    adapters::memory::{InMemoryImageStore, InMemoryTaskRepository, InMemoryWorkQueue},
    domain::{ImageRef, Task, TaskId},
    ports::{ImageStore, TaskRepository},
    services::{
        DispatchPolicy, RetryPolicy, SubmitTaskRequest, TaskDispatcher, TaskSubmissionService,
    },
};
use canopy::worker::WorkerPool;
use eyre::{OptionExt, WrapErr};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mockable::DefaultClock;

/// Dispatcher type wired to the in-memory adapters.
pub type MemoryDispatcher =
    TaskDispatcher<InMemoryTaskRepository, InMemoryImageStore, DefaultClock>;

/// Submission service type wired to the in-memory adapters.
pub type MemorySubmissions =
    TaskSubmissionService<InMemoryTaskRepository, InMemoryWorkQueue, DefaultClock>;

/// Retry policy with millisecond delays so retries finish inside a test.
pub const fn fast_policy(max_retries: u32) -> DispatchPolicy {
    DispatchPolicy {
        retry: RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(80),
        },
        processing_lease: Duration::from_secs(600),
    }
}

/// Repository, image store, queue and services sharing one backend.
pub struct Stack {
    pub repository: Arc<InMemoryTaskRepository>,
    pub images: Arc<InMemoryImageStore>,
    pub queue: Arc<InMemoryWorkQueue>,
    pub dispatcher: Arc<MemoryDispatcher>,
    pub submissions: MemorySubmissions,
}

impl Stack {
    pub fn new(backend: InferenceBackend, policy: DispatchPolicy) -> Self {
        let repository = Arc::new(InMemoryTaskRepository::new());
        let images = Arc::new(InMemoryImageStore::new());
        let queue = Arc::new(InMemoryWorkQueue::new());
        let clock = Arc::new(DefaultClock);
        let pipeline = Arc::new(AnalysisPipeline::new(backend, PipelineConfig::default()));
        let dispatcher = Arc::new(TaskDispatcher::new(
            Arc::clone(&repository),
            Arc::clone(&images),
            pipeline,
            ImageNormalizer::default(),
            policy,
            Arc::clone(&clock),
        ));
        let submissions =
            TaskSubmissionService::new(Arc::clone(&repository), Arc::clone(&queue), clock);
        Self {
            repository,
            images,
            queue,
            dispatcher,
            submissions,
        }
    }

    /// Starts `workers` workers over this stack's queue.
    pub fn spawn_pool(&self, workers: usize) -> WorkerPool {
        WorkerPool::spawn(workers, Arc::clone(&self.dispatcher), Arc::clone(&self.queue))
    }

    /// Uploads `bytes` under `name` (when given) and submits a task for it.
    pub async fn submit(&self, name: &str, bytes: Option<&[u8]>) -> eyre::Result<Task> {
        let image_ref = ImageRef::new(format!("uploads/{name}"))?;
        if let Some(bytes) = bytes {
            self.images.write(&image_ref, bytes).await?;
        }
        let task = self
            .submissions
            .submit(SubmitTaskRequest::new("user-42", image_ref.as_str()))
            .await
            .wrap_err("submit task")?;
        Ok(task)
    }

    /// Polls the repository until the task reaches a terminal status.
    pub async fn wait_until_terminal(&self, task_id: TaskId) -> eyre::Result<Task> {
        let poll = async {
            loop {
                let task = self
                    .repository
                    .load(task_id)
                    .await?
                    .ok_or_eyre("submitted task disappeared")?;
                if task.status().is_terminal() {
                    return Ok::<_, eyre::Report>(task);
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(10), poll)
            .await
            .wrap_err("task did not reach a terminal status")?
    }
}

/// Segmenter that reports a transient failure a fixed number of times and
/// then finds one oak filling most of the frame.
#[derive(Debug)]
pub struct FlakySegmenter {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakySegmenter {
    pub const fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SegmentationModel for FlakySegmenter {
    fn segment(&self, image: &RgbImage) -> InferenceResult<Vec<Instance>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(InferenceError::Transient(format!("warming up ({call})")));
        }
        Ok(vec![Instance::rectangular(
            "oak",
            0.8,
            BoundingBox::new(0, 0, image.width(), image.height()),
        )])
    }
}

pub fn green_png(width: u32, height: u32) -> eyre::Result<Vec<u8>> {
    let pixels = RgbImage::from_pixel(width, height, Rgb([34, 139, 34]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(pixels).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
