//! Diagnostics and statistics
//!
//! This module provides per-island and archipelago-wide summaries of an
//! evolution run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::population::population::Population;

/// Statistics for a single island
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IslandStats {
    /// Island index in its archipelago
    pub index: usize,
    /// Epochs completed so far
    pub epochs: usize,
    /// Number of individuals
    pub population_size: usize,
    /// Best (lowest) fitness, if the population is not empty
    pub best_fitness: Option<f64>,
    /// Mean fitness, if the population is not empty
    pub mean_fitness: Option<f64>,
    /// Population standard deviation of fitness, if the population is not empty
    pub fitness_std: Option<f64>,
    /// Cumulative evolution time (ms)
    pub evolution_ms: f64,
}

impl IslandStats {
    /// Compute statistics from an island's population and counters
    pub fn new(
        index: usize,
        population: &Population,
        epochs: usize,
        evolution_time: Duration,
    ) -> Self {
        Self {
            index,
            epochs,
            population_size: population.len(),
            best_fitness: population.best_individual().ok().map(|i| i.fitness()),
            mean_fitness: population.mean_fitness().ok(),
            fitness_std: population.fitness_std().ok(),
            evolution_ms: evolution_time.as_secs_f64() * 1000.0,
        }
    }
}

/// Statistics for a whole archipelago
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchipelagoStats {
    /// Statistics per island, in island order
    pub islands: Vec<IslandStats>,
}

impl ArchipelagoStats {
    /// Collect island statistics
    pub fn new(islands: Vec<IslandStats>) -> Self {
        Self { islands }
    }

    /// Number of islands
    pub fn num_islands(&self) -> usize {
        self.islands.len()
    }

    /// Best fitness over all islands
    pub fn best_fitness(&self) -> Option<f64> {
        self.islands
            .iter()
            .filter_map(|s| s.best_fitness)
            .min_by(f64::total_cmp)
    }

    /// Index of the island holding the best individual
    pub fn best_island(&self) -> Option<usize> {
        self.islands
            .iter()
            .filter_map(|s| s.best_fitness.map(|f| (s.index, f)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Longest island evolution time (ms)
    pub fn max_evolution_ms(&self) -> f64 {
        self.islands
            .iter()
            .map(|s| s.evolution_ms)
            .fold(0.0, f64::max)
    }

    /// Sum of island evolution times (ms)
    pub fn total_evolution_ms(&self) -> f64 {
        self.islands.iter().map(|s| s.evolution_ms).sum()
    }

    /// Total epochs completed across islands
    pub fn total_epochs(&self) -> usize {
        self.islands.iter().map(|s| s.epochs).sum()
    }

    /// Get a summary of the run
    pub fn summary(&self) -> String {
        let best = self
            .best_fitness()
            .map_or_else(|| "none".to_string(), |f| format!("{:.6}", f));

        format!(
            "Archipelago Summary:\n\
             - Islands: {}\n\
             - Epochs: {}\n\
             - Best fitness: {}\n\
             - Max evolution time: {:.2}ms\n\
             - Total evolution time: {:.2}ms",
            self.num_islands(),
            self.total_epochs(),
            best,
            self.max_evolution_ms(),
            self.total_evolution_ms()
        )
    }
}

pub mod prelude {
    pub use super::{ArchipelagoStats, IslandStats};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::individual::Individual;
    use crate::test_utils::Sphere;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn create_test_population() -> Population {
        let individuals: Vec<Individual> = [10.0, 20.0, 30.0, 40.0, 50.0]
            .iter()
            .map(|&f| Individual::with_fitness(vec![0.0], f))
            .collect();
        Population::from_individuals(Arc::new(Sphere::new(1)), &individuals).unwrap()
    }

    fn stats(index: usize, best: Option<f64>, ms: u64) -> IslandStats {
        IslandStats {
            index,
            epochs: 2,
            population_size: 5,
            best_fitness: best,
            mean_fitness: best,
            fitness_std: best.map(|_| 0.0),
            evolution_ms: ms as f64,
        }
    }

    #[test]
    fn test_island_stats_from_population() {
        let pop = create_test_population();
        let stats = IslandStats::new(3, &pop, 7, Duration::from_millis(250));

        assert_eq!(stats.index, 3);
        assert_eq!(stats.epochs, 7);
        assert_eq!(stats.population_size, 5);
        assert_eq!(stats.best_fitness, Some(10.0));
        assert_eq!(stats.mean_fitness, Some(30.0));
        assert_relative_eq!(stats.fitness_std.unwrap(), 200.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(stats.evolution_ms, 250.0, epsilon = 1e-9);
    }

    #[test]
    fn test_island_stats_empty_population() {
        let pop = Population::new(Arc::new(Sphere::new(1)));
        let stats = IslandStats::new(0, &pop, 0, Duration::ZERO);

        assert_eq!(stats.population_size, 0);
        assert_eq!(stats.best_fitness, None);
        assert_eq!(stats.mean_fitness, None);
        assert_eq!(stats.fitness_std, None);
    }

    #[test]
    fn test_archipelago_stats_aggregates() {
        let stats = ArchipelagoStats::new(vec![
            stats(0, Some(4.0), 100),
            stats(1, None, 300),
            stats(2, Some(1.5), 50),
        ]);

        assert_eq!(stats.num_islands(), 3);
        assert_eq!(stats.best_fitness(), Some(1.5));
        assert_eq!(stats.best_island(), Some(2));
        assert_eq!(stats.total_epochs(), 6);
        assert_relative_eq!(stats.max_evolution_ms(), 300.0);
        assert_relative_eq!(stats.total_evolution_ms(), 450.0);
    }

    #[test]
    fn test_archipelago_stats_empty() {
        let stats = ArchipelagoStats::default();
        assert_eq!(stats.best_fitness(), None);
        assert_eq!(stats.best_island(), None);
        assert_eq!(stats.max_evolution_ms(), 0.0);
    }

    #[test]
    fn test_archipelago_stats_summary() {
        let stats = ArchipelagoStats::new(vec![stats(0, Some(2.0), 10)]);
        let summary = stats.summary();
        assert!(summary.contains("Islands: 1"));
        assert!(summary.contains("Best fitness: 2.0"));
    }

    #[test]
    fn test_stats_serialize() {
        let stats = ArchipelagoStats::new(vec![stats(0, Some(2.0), 10)]);
        let json = serde_json::to_string(&stats).unwrap();
        let back: ArchipelagoStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
