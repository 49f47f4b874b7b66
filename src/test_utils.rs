//! Problems and algorithms shared by unit tests

use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{EvoResult, EvolutionError};
use crate::island::algorithm::Algorithm;
use crate::population::individual::Individual;
use crate::population::population::Population;
use crate::problem::bounds::MultiBounds;
use crate::problem::traits::{Problem, SharedProblem};

/// f(x) = sum(x_i^2) on [-5.12, 5.12]^n
#[derive(Clone, Debug)]
pub struct Sphere {
    bounds: MultiBounds,
}

impl Sphere {
    pub fn new(dimension: usize) -> Self {
        Self {
            bounds: MultiBounds::symmetric(5.12, dimension),
        }
    }
}

impl Problem for Sphere {
    fn name(&self) -> &str {
        "Sphere"
    }

    fn bounds(&self) -> &MultiBounds {
        &self.bounds
    }

    fn objective(&self, x: &[f64]) -> f64 {
        x.iter().map(|v| v * v).sum()
    }
}

/// f(x) = 10n + sum(x_i^2 - 10 cos(2 pi x_i)) on [-5.12, 5.12]^n
#[derive(Clone, Debug)]
pub struct Rastrigin {
    bounds: MultiBounds,
}

impl Rastrigin {
    pub fn new(dimension: usize) -> Self {
        Self {
            bounds: MultiBounds::symmetric(5.12, dimension),
        }
    }
}

impl Problem for Rastrigin {
    fn name(&self) -> &str {
        "Rastrigin"
    }

    fn bounds(&self) -> &MultiBounds {
        &self.bounds
    }

    fn objective(&self, x: &[f64]) -> f64 {
        let n = x.len() as f64;
        10.0 * n
            + x.iter()
                .map(|&v| v * v - 10.0 * (2.0 * std::f64::consts::PI * v).cos())
                .sum::<f64>()
    }
}

pub fn seeded_population(problem: SharedProblem, size: usize, seed: u64) -> Population {
    Population::random(problem, size, &mut StdRng::seed_from_u64(seed))
}

/// Leaves the population untouched
#[derive(Clone, Debug, Default)]
pub struct Noop;

impl Algorithm for Noop {
    fn name(&self) -> &str {
        "noop"
    }

    fn evolve(&mut self, _: &mut Population) -> EvoResult<()> {
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }
}

/// Halves every decision component, so every individual improves on Sphere
#[derive(Clone, Debug, Default)]
pub struct Shrink {
    delay: Duration,
}

impl Shrink {
    /// Sleep for `delay` before shrinking
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Algorithm for Shrink {
    fn name(&self) -> &str {
        "shrink"
    }

    fn evolve(&mut self, population: &mut Population) -> EvoResult<()> {
        thread::sleep(self.delay);
        let problem = population.problem().clone();
        for i in 0..population.len() {
            let halved: Vec<f64> = population[i].decision().iter().map(|v| v * 0.5).collect();
            population.set_individual(i, &Individual::new(problem.as_ref(), halved))?;
        }
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }
}

/// Sleeps for a fixed time per epoch
#[derive(Clone, Debug)]
pub struct Sleepy {
    duration: Duration,
}

impl Sleepy {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Algorithm for Sleepy {
    fn name(&self) -> &str {
        "sleepy"
    }

    fn evolve(&mut self, _: &mut Population) -> EvoResult<()> {
        thread::sleep(self.duration);
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }
}

/// Fails on every epoch
#[derive(Clone, Debug, Default)]
pub struct Failing;

impl Algorithm for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn evolve(&mut self, _: &mut Population) -> EvoResult<()> {
        Err(EvolutionError::Algorithm("deliberate failure".to_string()))
    }

    fn clone_box(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }
}

/// Panics on every epoch
#[derive(Clone, Debug, Default)]
pub struct Panicking;

impl Algorithm for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn evolve(&mut self, _: &mut Population) -> EvoResult<()> {
        panic!("deliberate panic");
    }

    fn clone_box(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }
}

/// Seeded (1+1) random walk: perturb each individual, keep improvements
#[derive(Clone, Debug)]
pub struct RandomWalk {
    rng: StdRng,
    step: f64,
}

impl RandomWalk {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            step: 0.5,
        }
    }
}

impl Algorithm for RandomWalk {
    fn name(&self) -> &str {
        "random-walk"
    }

    fn evolve(&mut self, population: &mut Population) -> EvoResult<()> {
        let problem = population.problem().clone();
        for i in 0..population.len() {
            let candidate: Vec<f64> = population[i]
                .decision()
                .iter()
                .zip(problem.bounds().iter())
                .map(|(&v, b)| (v + self.rng.gen_range(-self.step..=self.step)).clamp(b.min, b.max))
                .collect();
            let candidate = Individual::new(problem.as_ref(), candidate);
            if candidate.is_better_than(&population[i]) {
                population.set_individual(i, &candidate)?;
            }
        }
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }
}
