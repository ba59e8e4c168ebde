//! Inference backend adapters.
//!
//! - [`mock`]: randomized backend producing statistically plausible results
//! - [`stub`]: scripted deterministic models for tests and local runs

pub mod mock;
pub mod stub;

pub use mock::{MockBackend, mock_statistics};
pub use stub::{StubDefectModel, StubSegmenter};
