//! Runs the analysis pipeline over images already stored in the upload
//! directory.
//!
//! Usage:
//!
//! ```text
//! canopy-worker <image-ref>...
//! ```
//!
//! Each `image-ref` is a path relative to `CANOPY_UPLOAD_DIR` (default
//! `uploads`). Every reference becomes a task owned by `cli`; once all tasks
//! are terminal their reports are written to stdout as a JSON array. The
//! remaining `CANOPY_*` variables tune the pipeline, and `RUST_LOG` controls
//! log output on stderr.

use canopy::analysis::{
    ports::InferenceError,
    services::{AnalysisPipeline, ImageNormalizer, InferenceBackend},
};
use canopy::config::{CanopyConfig, ConfigError};
use canopy::task::{
    adapters::{
        filesystem::FilesystemImageStore,
        memory::{InMemoryTaskRepository, InMemoryWorkQueue},
    },
    domain::{TaskId, TaskReport},
    ports::{TaskRepository, WorkQueue},
    services::{
        SubmitTaskRequest, TaskDispatcher, TaskSubmissionError, TaskSubmissionService,
    },
};
use canopy::worker::{WorkerPool, WorkerPoolError};
use mockable::{Clock, DefaultClock};
use std::env;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const CLI_OWNER: &str = "cli";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
enum WorkerError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open upload directory: {0}")]
    UploadDir(#[source] io::Error),
    #[error("failed to initialise tokio runtime: {0}")]
    RuntimeInit(#[source] io::Error),
    #[error(transparent)]
    Backend(#[from] InferenceError),
    #[error(transparent)]
    Submission(#[from] TaskSubmissionError),
    #[error(transparent)]
    Pool(#[from] WorkerPoolError),
    #[error("failed to write reports: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() -> Result<(), BoxError> {
    init_tracing();
    let image_refs = collect_args()?;
    let config = CanopyConfig::from_env()?;
    let runtime = build_runtime()?;
    let reports = runtime.block_on(run(config, image_refs))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, &reports).map_err(WorkerError::from)?;
    writeln!(handle)?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn collect_args() -> Result<Vec<String>, WorkerError> {
    let args = env::args_os()
        .skip(1)
        .map(|arg_os| {
            arg_os
                .into_string()
                .map_err(|_| WorkerError::InvalidArgs("argument is not valid UTF-8".into()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if args.is_empty() {
        return Err(WorkerError::InvalidArgs(
            "usage: canopy-worker <image-ref>...".into(),
        ));
    }
    Ok(args)
}

fn build_runtime() -> Result<tokio::runtime::Runtime, WorkerError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(WorkerError::RuntimeInit)
}

async fn run(config: CanopyConfig, image_refs: Vec<String>) -> Result<Vec<TaskReport>, WorkerError> {
    // No real model implementations are linked into this binary.
    let backend = InferenceBackend::from_kind(config.backend, None, config.mock_seed)?;
    info!(backend = %config.backend.as_str(), workers = config.workers, "starting canopy worker");

    let clock = Arc::new(DefaultClock);
    let repository = Arc::new(InMemoryTaskRepository::new());
    let queue = Arc::new(InMemoryWorkQueue::new());
    let images = Arc::new(
        FilesystemImageStore::open(&config.upload_dir).map_err(WorkerError::UploadDir)?,
    );

    let pipeline = Arc::new(AnalysisPipeline::new(backend, config.pipeline));
    let dispatcher = Arc::new(TaskDispatcher::new(
        Arc::clone(&repository),
        images,
        pipeline,
        ImageNormalizer::new(config.normalizer),
        config.dispatch,
        Arc::clone(&clock),
    ));
    let submissions = TaskSubmissionService::new(repository, Arc::clone(&queue), clock);

    let pool = WorkerPool::spawn(config.workers, dispatcher, Arc::clone(&queue));

    let mut task_ids = Vec::with_capacity(image_refs.len());
    for image_ref in image_refs {
        let task = submissions
            .submit(SubmitTaskRequest::new(CLI_OWNER, image_ref))
            .await?;
        task_ids.push(task.id());
    }

    let reports = wait_until_terminal(&submissions, &task_ids).await?;
    queue.close();
    pool.join().await?;
    Ok(reports)
}

async fn wait_until_terminal<R, Q, C>(
    submissions: &TaskSubmissionService<R, Q, C>,
    task_ids: &[TaskId],
) -> Result<Vec<TaskReport>, WorkerError>
where
    R: TaskRepository,
    Q: WorkQueue,
    C: Clock + Send + Sync,
{
    loop {
        let mut reports = Vec::with_capacity(task_ids.len());
        for task_id in task_ids {
            if let Some(report) = submissions.status(*task_id).await? {
                reports.push(report);
            }
        }
        if reports.len() == task_ids.len()
            && reports.iter().all(|report| report.status.is_terminal())
        {
            return Ok(reports);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
