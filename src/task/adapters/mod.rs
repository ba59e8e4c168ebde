//! Adapters for the task context ports.
//!
//! # Available Adapters
//!
//! - [`memory::InMemoryTaskRepository`], [`memory::InMemoryImageStore`] and
//!   [`memory::InMemoryWorkQueue`]: thread-safe in-process implementations
//! - [`filesystem::FilesystemImageStore`]: capability-scoped image storage
//!   below the upload directory

pub mod filesystem;
pub mod memory;
