//! # evo-archipelago
//!
//! An island-model parallel metaheuristic engine for Rust.
//!
//! Independent populations ("islands") evolve concurrently under a pluggable
//! optimisation algorithm and periodically exchange individuals
//! ("migration") along the routes of a configurable topology.
//!
//! ## Core Concepts
//!
//! - **Population**: decision vectors with fitness, kept inside the problem's bounds
//! - **Island**: a population, an algorithm and a worker thread running epochs
//! - **Archipelago**: islands started together behind a barrier, joined together,
//!   and queried for the global best
//! - **Migration**: emigrants selected at epoch start, delivered through one
//!   channel per destination, merged at the destination's next epoch start
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evo_archipelago::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!
//! let mut archipelago = ArchipelagoBuilder::new()
//!     .num_islands(8)
//!     .population_size(20)
//!     .topology(TopologyKind::Ring)
//!     .selection(SelectionPolicy::Best(MigrationRate::Absolute(2)))
//!     .replacement(ReplacementPolicy::WorstIfBetter)
//!     .build(problem, &my_algorithm, &mut rng)?;
//!
//! archipelago.evolve(100)?;
//! archipelago.join()?;
//! println!("best: {}", archipelago.best()?);
//! ```

pub mod archipelago;
pub mod diagnostics;
pub mod error;
pub mod island;
pub mod migration;
pub mod population;
pub mod problem;

#[cfg(test)]
pub(crate) mod test_utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::archipelago::prelude::*;
    pub use crate::diagnostics::prelude::*;
    pub use crate::error::*;
    pub use crate::island::prelude::*;
    pub use crate::migration::prelude::*;
    pub use crate::population::prelude::*;
    pub use crate::problem::prelude::*;
}
