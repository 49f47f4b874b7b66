//! Epoch hooks
//!
//! The narrow capability an island worker holds on whatever drives it: a
//! start rendezvous, a cancellation check, and the migration callbacks run
//! at each epoch boundary. Islands never see their archipelago directly.

use std::time::Instant;

use crate::error::EvoResult;
use crate::population::population::Population;

/// Callbacks an island worker invokes around every epoch
pub trait EpochHooks: Send + Sync {
    /// Block until all sibling workers are ready; `None` aborts the run
    fn sync_start(&self) -> Option<Instant>;

    /// Whether the worker should stop before its next epoch
    fn is_cancelled(&self) -> bool;

    /// Runs before the algorithm: merge immigrants, then return the emigrants
    /// (if this epoch emigrates) as of the start of the epoch
    fn pre_evolution(
        &self,
        island: usize,
        epoch: usize,
        population: &mut Population,
    ) -> EvoResult<Option<Population>>;

    /// Runs after the algorithm: deliver the emigrants picked at epoch start
    fn post_evolution(&self, island: usize, emigrants: Option<Population>);
}

/// Hooks for an island evolving on its own: no peers, no migration
#[derive(Debug, Default)]
pub struct Detached;

impl EpochHooks for Detached {
    fn sync_start(&self) -> Option<Instant> {
        Some(Instant::now())
    }

    fn is_cancelled(&self) -> bool {
        false
    }

    fn pre_evolution(
        &self,
        _: usize,
        _: usize,
        _: &mut Population,
    ) -> EvoResult<Option<Population>> {
        Ok(None)
    }

    fn post_evolution(&self, _: usize, _: Option<Population>) {}
}
