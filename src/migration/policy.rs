//! Emigrant selection and immigrant replacement policies
//!
//! Both policies move individuals exclusively through deme extraction and
//! deme insertion on [`Population`].

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};
use crate::population::population::Population;

/// How many individuals migrate per event
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MigrationRate {
    /// Fixed number of individuals
    Absolute(usize),
    /// Fraction of the source population, rounded to the nearest integer
    Fraction(f64),
}

impl MigrationRate {
    /// Number of migrants for a population of the given size
    pub fn count(&self, population_size: usize) -> usize {
        let count = match *self {
            Self::Absolute(n) => n,
            Self::Fraction(f) => (f * population_size as f64).round() as usize,
        };
        count.min(population_size)
    }

    /// Check that a fractional rate lies in `[0, 1]`
    pub fn validate(&self) -> EvoResult<()> {
        match *self {
            Self::Fraction(f) if !(0.0..=1.0).contains(&f) => Err(
                EvolutionError::Configuration(format!("migration fraction {} not in [0, 1]", f)),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for MigrationRate {
    fn default() -> Self {
        Self::Absolute(1)
    }
}

/// Which individuals leave an island
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// The best individuals, best first
    Best(MigrationRate),
    /// Individuals drawn uniformly without replacement
    Random(MigrationRate),
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::Best(MigrationRate::default())
    }
}

impl SelectionPolicy {
    /// Get the migration rate
    pub fn rate(&self) -> MigrationRate {
        match *self {
            Self::Best(rate) | Self::Random(rate) => rate,
        }
    }

    /// Copy the emigrants out of a population
    pub fn select<R: Rng + ?Sized>(
        &self,
        population: &Population,
        rng: &mut R,
    ) -> EvoResult<Population> {
        let count = self.rate().count(population.len());
        match self {
            Self::Best(_) => population.extract_deme(&population.best_indices(count)),
            Self::Random(_) => population
                .extract_random_deme(count, rng)
                .map(|(deme, _)| deme),
        }
    }
}

/// How immigrants merge into the destination population
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ReplacementPolicy {
    /// Overwrite randomly chosen individuals
    Random,
    /// Overwrite randomly chosen individuals the immigrant beats
    RandomIfBetter,
    /// Overwrite the worst individuals
    Worst,
    /// Overwrite the worst individuals the immigrants beat
    #[default]
    WorstIfBetter,
    /// Only the best immigrant enters, in place of the worst of a random
    /// deme, if it beats it
    BestIfBetter,
}

impl ReplacementPolicy {
    /// Merge immigrants into a population
    ///
    /// Immigrants are paired best-first with the chosen slots. Returns the
    /// number of immigrants considered (capped at the population size).
    pub fn apply<R: Rng + ?Sized>(
        &self,
        population: &mut Population,
        immigrants: &Population,
        rng: &mut R,
    ) -> EvoResult<usize> {
        let count = immigrants.len().min(population.len());
        if count == 0 {
            return Ok(0);
        }
        let incoming = immigrants.extract_deme(&immigrants.best_indices(count))?;

        match self {
            Self::Random => {
                let picks = index::sample(rng, population.len(), count).into_vec();
                population.insert_deme_forced(&incoming, &picks)?;
            }
            Self::RandomIfBetter => {
                let picks = index::sample(rng, population.len(), count).into_vec();
                population.insert_deme(&incoming, &picks)?;
            }
            Self::Worst => {
                let picks = population.worst_indices(count);
                population.insert_deme_forced(&incoming, &picks)?;
            }
            Self::WorstIfBetter => {
                let picks = population.worst_indices(count);
                population.insert_deme(&incoming, &picks)?;
            }
            Self::BestIfBetter => {
                let picks = index::sample(rng, population.len(), count).into_vec();
                population.insert_best_in_deme(&incoming, &picks)?;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::individual::Individual;
    use crate::test_utils::Sphere;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn with_fitnesses(fitnesses: &[f64]) -> Population {
        let individuals: Vec<Individual> = fitnesses
            .iter()
            .enumerate()
            .map(|(i, &f)| Individual::with_fitness(vec![i as f64 * 0.01], f))
            .collect();
        Population::from_individuals(Arc::new(Sphere::new(1)), &individuals).unwrap()
    }

    fn fitnesses(population: &Population) -> Vec<f64> {
        population.iter().map(Individual::fitness).collect()
    }

    #[test]
    fn test_rate_count() {
        assert_eq!(MigrationRate::Absolute(3).count(10), 3);
        assert_eq!(MigrationRate::Absolute(30).count(10), 10);
        assert_eq!(MigrationRate::Fraction(0.25).count(10), 3);
        assert_eq!(MigrationRate::Fraction(1.0).count(7), 7);
    }

    #[test]
    fn test_rate_validate() {
        assert!(MigrationRate::Fraction(0.5).validate().is_ok());
        assert!(MigrationRate::Fraction(1.5).validate().is_err());
        assert!(MigrationRate::Fraction(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_select_best() {
        let mut rng = StdRng::seed_from_u64(1);
        let population = with_fitnesses(&[4.0, 1.0, 3.0, 2.0]);
        let emigrants = SelectionPolicy::Best(MigrationRate::Absolute(2))
            .select(&population, &mut rng)
            .unwrap();
        assert_eq!(fitnesses(&emigrants), vec![1.0, 2.0]);
    }

    #[test]
    fn test_select_random_distinct() {
        let mut rng = StdRng::seed_from_u64(1);
        let population = with_fitnesses(&[4.0, 1.0, 3.0, 2.0, 5.0]);
        let emigrants = SelectionPolicy::Random(MigrationRate::Absolute(3))
            .select(&population, &mut rng)
            .unwrap();
        let mut seen = fitnesses(&emigrants);
        seen.sort_by(f64::total_cmp);
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_replace_worst_if_better() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut population = with_fitnesses(&[1.0, 9.0, 5.0, 7.0]);
        let immigrants = with_fitnesses(&[8.0, 0.5]);

        let considered = ReplacementPolicy::WorstIfBetter
            .apply(&mut population, &immigrants, &mut rng)
            .unwrap();
        assert_eq!(considered, 2);
        // 0.5 replaces 9.0; 8.0 does not beat 7.0
        assert_eq!(fitnesses(&population), vec![1.0, 0.5, 5.0, 7.0]);
    }

    #[test]
    fn test_replace_worst_unconditional() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut population = with_fitnesses(&[1.0, 9.0, 5.0, 7.0]);
        let immigrants = with_fitnesses(&[8.0, 20.0]);

        ReplacementPolicy::Worst
            .apply(&mut population, &immigrants, &mut rng)
            .unwrap();
        assert_eq!(fitnesses(&population), vec![1.0, 8.0, 5.0, 20.0]);
    }

    #[test]
    fn test_replace_random_keeps_size() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut population = with_fitnesses(&[1.0, 2.0, 3.0]);
        let immigrants = with_fitnesses(&[10.0, 11.0, 12.0, 13.0]);

        let considered = ReplacementPolicy::Random
            .apply(&mut population, &immigrants, &mut rng)
            .unwrap();
        assert_eq!(considered, 3);
        assert_eq!(population.len(), 3);
        assert_eq!(fitnesses(&population).iter().sum::<f64>(), 33.0);
    }

    #[test]
    fn test_replace_random_if_better_rejects_worse() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut population = with_fitnesses(&[1.0, 2.0, 3.0]);
        let immigrants = with_fitnesses(&[10.0, 11.0]);

        ReplacementPolicy::RandomIfBetter
            .apply(&mut population, &immigrants, &mut rng)
            .unwrap();
        assert_eq!(fitnesses(&population), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_best_if_better_inserts_one() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut population = with_fitnesses(&[4.0, 6.0, 8.0]);
        let immigrants = with_fitnesses(&[0.1, 0.2, 0.3]);

        ReplacementPolicy::BestIfBetter
            .apply(&mut population, &immigrants, &mut rng)
            .unwrap();
        let result = fitnesses(&population);
        assert_eq!(result.iter().filter(|&&f| f < 1.0).count(), 1);
        assert!(result.contains(&0.1));
    }

    #[test]
    fn test_apply_to_empty_population() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut population = Population::new(Arc::new(Sphere::new(1)));
        let immigrants = with_fitnesses(&[0.1]);
        let considered = ReplacementPolicy::Worst
            .apply(&mut population, &immigrants, &mut rng)
            .unwrap();
        assert_eq!(considered, 0);
        assert!(population.is_empty());
    }
}
