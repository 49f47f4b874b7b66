//! Islands
//!
//! This module provides the island type, the algorithm contract it runs, and
//! the hooks and synchronisation primitives that connect a worker thread to
//! whatever drives it.

pub mod algorithm;
pub mod hooks;
#[allow(clippy::module_inception)]
pub mod island;
pub mod sync;

pub mod prelude {
    pub use super::algorithm::*;
    pub use super::hooks::*;
    pub use super::island::*;
    pub use super::sync::*;
}
