//! Optimisation problems
//!
//! This module provides the problem contract consumed by populations and
//! archipelagos, and the bounds that constrain decision vectors.

pub mod bounds;
pub mod traits;

pub mod prelude {
    pub use super::bounds::*;
    pub use super::traits::*;
}
