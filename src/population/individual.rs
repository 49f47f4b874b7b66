//! Individual type
//!
//! This module provides the Individual type: a decision vector with its fitness.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::problem::traits::Problem;

/// A candidate solution
///
/// Individuals carry no reference to their problem; the owning population
/// is responsible for keeping the fitness consistent with the decision vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    decision: Vec<f64>,
    fitness: f64,
}

impl Individual {
    /// Create an individual, evaluating its fitness under the given problem
    pub fn new(problem: &dyn Problem, decision: Vec<f64>) -> Self {
        let fitness = problem.objective(&decision);
        Self { decision, fitness }
    }

    /// Create an individual with a known fitness
    pub fn with_fitness(decision: Vec<f64>, fitness: f64) -> Self {
        Self { decision, fitness }
    }

    /// Create a random individual within the problem's bounds
    pub fn random<R: Rng + ?Sized>(problem: &dyn Problem, rng: &mut R) -> Self {
        Self::new(problem, problem.bounds().sample(rng))
    }

    /// Get the decision vector
    pub fn decision(&self) -> &[f64] {
        &self.decision
    }

    /// Get the fitness value
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Decision-vector length
    pub fn dimension(&self) -> usize {
        self.decision.len()
    }

    /// Re-evaluate the fitness under the given problem
    pub fn evaluate(&mut self, problem: &dyn Problem) {
        self.fitness = problem.objective(&self.decision);
    }

    /// Check if this individual is strictly better (lower fitness) than another
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.fitness < other.fitness
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fitness: {:e}, decision: {:?}", self.fitness, self.decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Sphere;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_individual_new_evaluates() {
        let problem = Sphere::new(3);
        let individual = Individual::new(&problem, vec![1.0, 2.0, 3.0]);
        assert_eq!(individual.fitness(), 14.0);
        assert_eq!(individual.dimension(), 3);
    }

    #[test]
    fn test_individual_is_better_than_minimises() {
        let a = Individual::with_fitness(vec![0.0], 1.0);
        let b = Individual::with_fitness(vec![0.0], 2.0);
        assert!(a.is_better_than(&b));
        assert!(!b.is_better_than(&a));
        assert!(!a.is_better_than(&a.clone()));
    }

    #[test]
    fn test_individual_random_in_bounds() {
        let problem = Sphere::new(5);
        let mut rng = StdRng::seed_from_u64(3);
        let individual = Individual::random(&problem, &mut rng);
        assert!(problem.bounds().contains_vec(individual.decision()));
        assert_eq!(individual.fitness(), problem.objective(individual.decision()));
    }

    #[test]
    fn test_individual_evaluate() {
        let problem = Sphere::new(2);
        let mut individual = Individual::with_fitness(vec![1.0, 1.0], 0.0);
        individual.evaluate(&problem);
        assert_eq!(individual.fitness(), 2.0);
    }
}
