//! Migration between islands
//!
//! This module provides topologies, emigrant selection and immigrant
//! replacement policies, and the migration scheme that routes individuals
//! between islands at epoch boundaries.

pub mod policy;
pub mod scheme;
pub mod topology;

pub mod prelude {
    pub use super::policy::*;
    pub use super::scheme::*;
    pub use super::topology::*;
}
