//! Shared world state for task dispatch BDD scenarios.

use std::sync::Arc;

use canopy::analysis::{
    adapters::{StubDefectModel, StubSegmenter},
    ports::{DefectModel, SegmentationModel},
    services::{AnalysisPipeline, ImageNormalizer, InferenceBackend, PipelineConfig},
};
use canopy::task::{
    adapters::memory::{InMemoryImageStore, InMemoryTaskRepository},
    domain::{Task, TaskId},
    ports::TaskRepository,
    services::{DispatchOutcome, DispatchPolicy, TaskDispatcher},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Dispatcher type used by the BDD world.
pub type TestDispatcher = TaskDispatcher<InMemoryTaskRepository, InMemoryImageStore, DefaultClock>;

/// Scenario world for task dispatch behaviour tests.
pub struct DispatchWorld {
    pub repository: Arc<InMemoryTaskRepository>,
    pub images: Arc<InMemoryImageStore>,
    pub segmenter: Option<StubSegmenter>,
    pub defects: Option<StubDefectModel>,
    pub policy: DispatchPolicy,
    pub task_id: Option<TaskId>,
    pub outcomes: Vec<DispatchOutcome>,
    dispatcher: Option<Arc<TestDispatcher>>,
}

impl DispatchWorld {
    /// Creates a world with empty stores and default policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryTaskRepository::new()),
            images: Arc::new(InMemoryImageStore::new()),
            segmenter: None,
            defects: None,
            policy: DispatchPolicy::default(),
            task_id: None,
            outcomes: Vec::new(),
            dispatcher: None,
        }
    }

    /// Returns the dispatcher, wiring it from the configured models on
    /// first use.
    pub fn dispatcher(&mut self) -> eyre::Result<Arc<TestDispatcher>> {
        if let Some(dispatcher) = &self.dispatcher {
            return Ok(Arc::clone(dispatcher));
        }
        let segmenter: Arc<dyn SegmentationModel> = Arc::new(
            self.segmenter
                .take()
                .ok_or_else(|| eyre::eyre!("no segmentation model configured in scenario"))?,
        );
        let defects: Arc<dyn DefectModel> = Arc::new(
            self.defects
                .take()
                .ok_or_else(|| eyre::eyre!("no defect model configured in scenario"))?,
        );
        let pipeline = Arc::new(AnalysisPipeline::new(
            InferenceBackend::real(segmenter, defects),
            PipelineConfig::default(),
        ));
        let dispatcher = Arc::new(TaskDispatcher::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.images),
            pipeline,
            ImageNormalizer::default(),
            self.policy,
            Arc::new(DefaultClock),
        ));
        self.dispatcher = Some(Arc::clone(&dispatcher));
        Ok(dispatcher)
    }

    /// Reloads the scenario's task from the repository.
    pub fn task(&self) -> eyre::Result<Task> {
        let task_id = self
            .task_id
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;
        run_async(self.repository.load(task_id))?
            .ok_or_else(|| eyre::eyre!("task {task_id} is not stored"))
    }
}

impl Default for DispatchWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> DispatchWorld {
    DispatchWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
