//! In-memory adapter implementations.
//!
//! These adapters back unit tests and the single-process worker binary.

mod image_store;
mod queue;
mod task;

pub use image_store::InMemoryImageStore;
pub use queue::InMemoryWorkQueue;
pub use task::InMemoryTaskRepository;
