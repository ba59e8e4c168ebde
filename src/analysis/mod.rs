//! Tree image analysis for Canopy.
//!
//! This module turns a raw upload into a scored health report: the image is
//! normalized, tree instances are segmented, each instance under
//! consideration is isolated and checked for defects, and the raw model
//! output is mapped onto the public taxonomy and combined into a health
//! score. Nothing here touches persistence or queueing. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Model contracts in [`ports`]
//! - Backend implementations in [`adapters`]
//! - Normalizer, isolation, aggregation, and pipeline services in
//!   [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
