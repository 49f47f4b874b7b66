//! Problem traits
//!
//! This module defines the problem abstraction. A problem is an immutable
//! value exposing its dimension, bounds, an equality test and an objective.

use std::fmt::Debug;
use std::sync::Arc;

use crate::problem::bounds::MultiBounds;

/// Optimisation problem (minimisation convention)
///
/// Implementations must be immutable after construction: populations on
/// different threads share one instance.
pub trait Problem: Send + Sync + Debug {
    /// Human-readable identity, used for diagnostics and compatibility checks
    fn name(&self) -> &str;

    /// Per-component box constraints
    fn bounds(&self) -> &MultiBounds;

    /// Decision-vector length
    fn dimension(&self) -> usize {
        self.bounds().dimension()
    }

    /// Evaluate a decision vector (lower = better)
    fn objective(&self, x: &[f64]) -> f64;

    /// Structural equality with another problem
    ///
    /// Two problems are compatible when they share name, dimension and bounds.
    fn is_compatible(&self, other: &dyn Problem) -> bool {
        self.name() == other.name()
            && self.dimension() == other.dimension()
            && self.bounds() == other.bounds()
    }
}

/// Cheaply shareable, immutable problem handle
pub type SharedProblem = Arc<dyn Problem>;

/// Compare two shared problems structurally
pub fn same_problem(a: &SharedProblem, b: &SharedProblem) -> bool {
    Arc::ptr_eq(a, b) || a.is_compatible(b.as_ref())
}
