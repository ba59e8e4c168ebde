//! Canopy: asynchronous tree-health analysis.
//!
//! A submitted photograph becomes a task that a worker picks up from a
//! queue, normalizes, runs through instance segmentation and per-instance
//! defect detection, and scores. The committed task record is the health
//! report that callers poll.
//!
//! # Architecture
//!
//! Canopy follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (storage, queues, models)
//!
//! # Modules
//!
//! - [`analysis`]: Image normalization, inference backends, and scoring
//! - [`task`]: Task state machine, persistence, and dispatch
//! - [`worker`]: Worker pool running dispatch loops over a shared queue
//! - [`config`]: Environment-driven runtime configuration

pub mod analysis;
pub mod config;
pub mod task;
pub mod worker;
