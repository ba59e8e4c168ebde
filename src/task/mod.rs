//! Analysis task lifecycle for Canopy.
//!
//! A submitted image becomes a `pending` task row and an identifier on the
//! work queue. The dispatcher moves it through `processing` to `completed`
//! or `failed`, scheduling bounded retries for transient backend errors.
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
