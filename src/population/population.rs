//! Population type
//!
//! This module provides the Population container: an ordered, index-addressable
//! collection of individuals bound to one problem. Every insertion path goes
//! through [`Population::checked_individual`], so stored individuals always
//! have the problem's dimension and lie within its bounds.

use std::fmt;

use rand::seq::index;
use rand::Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{EvoResult, EvolutionError};
use crate::population::individual::Individual;
use crate::problem::traits::SharedProblem;

/// A population of individuals bound to a problem
#[derive(Clone, Debug)]
pub struct Population {
    individuals: Vec<Individual>,
    problem: SharedProblem,
}

impl Population {
    /// Create an empty population associated with the given problem
    pub fn new(problem: SharedProblem) -> Self {
        Self {
            individuals: Vec::new(),
            problem,
        }
    }

    /// Create a population of `size` random individuals
    pub fn random<R: Rng + ?Sized>(problem: SharedProblem, size: usize, rng: &mut R) -> Self {
        let individuals = (0..size)
            .map(|_| Individual::random(problem.as_ref(), rng))
            .collect();
        Self {
            individuals,
            problem,
        }
    }

    /// Create a population from existing individuals, validating each of them
    pub fn from_individuals(problem: SharedProblem, individuals: &[Individual]) -> EvoResult<Self> {
        let mut population = Self::new(problem);
        for individual in individuals {
            population.push(individual)?;
        }
        Ok(population)
    }

    /// Get the problem associated with the population
    pub fn problem(&self) -> &SharedProblem {
        &self.problem
    }

    /// Get the population size
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Check if the population is empty
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Get an individual by index
    pub fn get(&self, index: usize) -> Option<&Individual> {
        self.individuals.get(index)
    }

    /// Get an iterator over the individuals
    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter()
    }

    /// Get the underlying slice of individuals
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Validate an individual against the problem, repairing it if possible
    ///
    /// A decision vector of the wrong length is rejected with `SizeMismatch`.
    /// Components outside the bounds are redrawn uniformly within them and the
    /// fitness is re-evaluated; an in-bounds individual is copied unchanged.
    pub fn checked_individual(&self, individual: &Individual) -> EvoResult<Individual> {
        let bounds = self.problem.bounds();
        if individual.dimension() != bounds.dimension() {
            return Err(EvolutionError::SizeMismatch {
                expected: bounds.dimension(),
                actual: individual.dimension(),
            });
        }
        if bounds.contains_vec(individual.decision()) {
            return Ok(individual.clone());
        }

        let mut rng = rand::thread_rng();
        let decision = individual
            .decision()
            .iter()
            .zip(bounds.iter())
            .map(|(&x, b)| if b.contains(x) { x } else { b.sample(&mut rng) })
            .collect();
        Ok(Individual::new(self.problem.as_ref(), decision))
    }

    /// Append a copy of an individual
    pub fn push(&mut self, individual: &Individual) -> EvoResult<()> {
        let checked = self.checked_individual(individual)?;
        self.individuals.push(checked);
        Ok(())
    }

    /// Insert a copy of an individual at `index`, shifting later ones right
    pub fn insert(&mut self, index: usize, individual: &Individual) -> EvoResult<()> {
        if index > self.len() {
            return Err(self.index_error(index));
        }
        let checked = self.checked_individual(individual)?;
        self.individuals.insert(index, checked);
        Ok(())
    }

    /// Overwrite the individual at `index` with a copy of `individual`
    pub fn set_individual(&mut self, index: usize, individual: &Individual) -> EvoResult<()> {
        if index >= self.len() {
            return Err(self.index_error(index));
        }
        self.individuals[index] = self.checked_individual(individual)?;
        Ok(())
    }

    /// Remove and return the individual at `index`
    pub fn erase(&mut self, index: usize) -> EvoResult<Individual> {
        if index >= self.len() {
            return Err(self.index_error(index));
        }
        Ok(self.individuals.remove(index))
    }

    /// Index of the individual with the lowest fitness (first one on ties)
    pub fn best_index(&self) -> EvoResult<usize> {
        self.extreme_index(|candidate, current| candidate.is_better_than(current))
    }

    /// Index of the individual with the highest fitness (first one on ties)
    pub fn worst_index(&self) -> EvoResult<usize> {
        self.extreme_index(|candidate, current| current.is_better_than(candidate))
    }

    /// Get the best individual
    ///
    /// This is a linear scan, not cached.
    pub fn best_individual(&self) -> EvoResult<&Individual> {
        Ok(&self.individuals[self.best_index()?])
    }

    /// Get the worst individual
    pub fn worst_individual(&self) -> EvoResult<&Individual> {
        Ok(&self.individuals[self.worst_index()?])
    }

    /// Compute mean fitness
    pub fn mean_fitness(&self) -> EvoResult<f64> {
        if self.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }
        let sum: f64 = self.individuals.iter().map(Individual::fitness).sum();
        Ok(sum / self.len() as f64)
    }

    /// Compute the (population) standard deviation of fitness
    pub fn fitness_std(&self) -> EvoResult<f64> {
        let mean = self.mean_fitness()?;
        let variance = self
            .individuals
            .iter()
            .map(|i| (i.fitness() - mean).powi(2))
            .sum::<f64>()
            / self.len() as f64;
        Ok(variance.sqrt())
    }

    /// Replace the best individual with a copy of `individual`
    pub fn replace_best(&mut self, individual: &Individual) -> EvoResult<()> {
        let index = self.best_index()?;
        self.set_individual(index, individual)
    }

    /// Replace the worst individual with a copy of `individual`
    pub fn replace_worst(&mut self, individual: &Individual) -> EvoResult<()> {
        let index = self.worst_index()?;
        self.set_individual(index, individual)
    }

    /// Sort individuals by ascending fitness (best first)
    ///
    /// This breaks index identity: code that treats an index as a stable
    /// individual id must not call it.
    pub fn sort(&mut self) {
        self.individuals.sort_by(|a, b| a.fitness().total_cmp(&b.fitness()));
    }

    /// Indices of the `count` best individuals, best first
    pub fn best_indices(&self, count: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            self.individuals[a]
                .fitness()
                .total_cmp(&self.individuals[b].fitness())
        });
        order.truncate(count);
        order
    }

    /// Indices of the `count` worst individuals, worst first
    pub fn worst_indices(&self, count: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            self.individuals[b]
                .fitness()
                .total_cmp(&self.individuals[a].fitness())
        });
        order.truncate(count);
        order
    }

    /// Copy the individuals at `picks` (in that order) into a new deme
    pub fn extract_deme(&self, picks: &[usize]) -> EvoResult<Population> {
        let mut individuals = Vec::with_capacity(picks.len());
        for &pick in picks {
            let individual = self.get(pick).ok_or_else(|| self.index_error(pick))?;
            individuals.push(individual.clone());
        }
        Ok(Population {
            individuals,
            problem: self.problem.clone(),
        })
    }

    /// Copy `size` distinct, randomly chosen individuals into a new deme
    ///
    /// Returns the deme together with the picked indices in selection order.
    pub fn extract_random_deme<R: Rng + ?Sized>(
        &self,
        size: usize,
        rng: &mut R,
    ) -> EvoResult<(Population, Vec<usize>)> {
        if size > self.len() {
            return Err(self.index_error(size));
        }
        let picks = index::sample(rng, self.len(), size).into_vec();
        let deme = self.extract_deme(&picks)?;
        Ok((deme, picks))
    }

    /// Write deme members back into `picks`, each only if strictly better
    pub fn insert_deme(&mut self, deme: &Population, picks: &[usize]) -> EvoResult<()> {
        self.write_deme::<false>(deme, picks)
    }

    /// Write deme members back into `picks` unconditionally
    pub fn insert_deme_forced(&mut self, deme: &Population, picks: &[usize]) -> EvoResult<()> {
        self.write_deme::<true>(deme, picks)
    }

    /// Put the best deme member in place of the worst individual among `picks`,
    /// if it is strictly better
    pub fn insert_best_in_deme(&mut self, deme: &Population, picks: &[usize]) -> EvoResult<()> {
        self.check_picks(deme, picks)?;
        if picks.is_empty() {
            return Ok(());
        }

        let incoming = deme.best_individual()?;
        let mut target = picks[0];
        for &pick in &picks[1..] {
            if self.individuals[target].is_better_than(&self.individuals[pick]) {
                target = pick;
            }
        }

        if incoming.is_better_than(&self.individuals[target]) {
            self.individuals[target] = self.checked_individual(incoming)?;
        }
        Ok(())
    }

    /// Re-evaluate every individual's fitness under the problem
    pub fn evaluate_all(&mut self) {
        let problem = self.problem.as_ref();

        #[cfg(feature = "parallel")]
        self.individuals
            .par_iter_mut()
            .for_each(|individual| individual.evaluate(problem));

        #[cfg(not(feature = "parallel"))]
        for individual in &mut self.individuals {
            individual.evaluate(problem);
        }
    }

    fn write_deme<const FORCED: bool>(
        &mut self,
        deme: &Population,
        picks: &[usize],
    ) -> EvoResult<()> {
        self.check_picks(deme, picks)?;

        let mut incoming = Vec::with_capacity(picks.len());
        for (individual, &pick) in deme.iter().zip(picks) {
            if FORCED || individual.is_better_than(&self.individuals[pick]) {
                incoming.push((pick, self.checked_individual(individual)?));
            }
        }
        for (pick, individual) in incoming {
            self.individuals[pick] = individual;
        }
        Ok(())
    }

    fn check_picks(&self, deme: &Population, picks: &[usize]) -> EvoResult<()> {
        if deme.len() != picks.len() {
            return Err(EvolutionError::SizeMismatch {
                expected: picks.len(),
                actual: deme.len(),
            });
        }
        match picks.iter().find(|&&pick| pick >= self.len()) {
            Some(&pick) => Err(self.index_error(pick)),
            None => Ok(()),
        }
    }

    fn extreme_index<F>(&self, replaces: F) -> EvoResult<usize>
    where
        F: Fn(&Individual, &Individual) -> bool,
    {
        if self.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }
        let mut index = 0;
        for (i, individual) in self.individuals.iter().enumerate().skip(1) {
            if replaces(individual, &self.individuals[index]) {
                index = i;
            }
        }
        Ok(index)
    }

    fn index_error(&self, index: usize) -> EvolutionError {
        EvolutionError::IndexError {
            index,
            len: self.len(),
        }
    }
}

impl std::ops::Index<usize> for Population {
    type Output = Individual;

    fn index(&self, index: usize) -> &Self::Output {
        &self.individuals[index]
    }
}

impl<'a> IntoIterator for &'a Population {
    type Item = &'a Individual;
    type IntoIter = std::slice::Iter<'a, Individual>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.iter()
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Population: size {}, problem: {} (dimension {})",
            self.len(),
            self.problem.name(),
            self.problem.dimension()
        )?;
        if let Ok(best) = self.best_individual() {
            writeln!(f, "Best: {}", best)?;
        }
        Ok(())
    }
}
