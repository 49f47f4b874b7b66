//! Archipelagos
//!
//! This module provides the archipelago, which evolves a set of islands
//! concurrently and aggregates their results, and its configuration layer.

#[allow(clippy::module_inception)]
pub mod archipelago;
pub mod builder;

pub mod prelude {
    pub use super::archipelago::*;
    pub use super::builder::*;
}
