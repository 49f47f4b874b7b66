//! Algorithm trait
//!
//! The only capability an island needs from an optimiser: evolve a population
//! in place for one epoch.

use crate::error::EvoResult;
use crate::population::population::Population;

/// Optimisation algorithm run by an island once per epoch
pub trait Algorithm: Send {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Evolve the population in place for one epoch
    ///
    /// Errors are captured by the island worker and surfaced from `join`.
    fn evolve(&mut self, population: &mut Population) -> EvoResult<()>;

    /// Clone into a new boxed algorithm, including any internal state
    fn clone_box(&self) -> Box<dyn Algorithm>;
}

impl Clone for Box<dyn Algorithm> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
