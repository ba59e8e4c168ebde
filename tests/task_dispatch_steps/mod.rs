//! Step definitions for task dispatch BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
