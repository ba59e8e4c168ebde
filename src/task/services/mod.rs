//! Application services for task dispatch and submission.

mod dispatcher;
mod retry;
mod submission;

pub use dispatcher::{
    DispatchError, DispatchOutcome, DispatchResult, SkipReason, TaskDispatcher,
};
pub use retry::{DispatchPolicy, RetryPolicy};
pub use submission::{
    SubmitTaskRequest, TaskSubmissionError, TaskSubmissionResult, TaskSubmissionService,
};
