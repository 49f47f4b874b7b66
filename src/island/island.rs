//! Island type
//!
//! An island owns one population, one algorithm and, while evolving, one
//! worker thread. The worker holds the island state for the whole evolve
//! call; accessors wait for the worker before reading, so they never observe
//! a population mid-epoch.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::diagnostics::IslandStats;
use crate::error::{EvoResult, EvolutionError};
use crate::island::algorithm::Algorithm;
use crate::island::hooks::{Detached, EpochHooks};
use crate::island::sync::CancellationToken;
use crate::population::population::Population;
use crate::problem::traits::SharedProblem;

/// How long a worker keeps evolving
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schedule {
    /// A fixed number of epochs
    Epochs(usize),
    /// Epochs until the duration has elapsed since the synchronised start
    ///
    /// The deadline is checked between epochs only, and at least one epoch
    /// always runs.
    Timed(Duration),
}

struct IslandState {
    population: Population,
    algorithm: Box<dyn Algorithm>,
    evolution_time: Duration,
    epochs: usize,
}

struct Worker {
    handle: JoinHandle<EvoResult<()>>,
    // disconnects when the worker thread has released everything it captured
    done: Receiver<()>,
    cancel: CancellationToken,
}

/// A population evolving under an algorithm on its own worker thread
pub struct Island {
    index: usize,
    problem: SharedProblem,
    algorithm_name: String,
    state: Arc<Mutex<IslandState>>,
    worker: Mutex<Option<Worker>>,
}

impl Island {
    /// Create an island with `size` random individuals
    pub fn new<A: Algorithm + 'static>(problem: SharedProblem, algorithm: A, size: usize) -> Self {
        let population = Population::random(problem, size, &mut rand::thread_rng());
        Self::with_population(population, algorithm)
    }

    /// Create an island around an existing population
    pub fn with_population<A: Algorithm + 'static>(population: Population, algorithm: A) -> Self {
        Self::from_boxed(population, Box::new(algorithm))
    }

    /// Create an island from an already boxed algorithm
    pub fn from_boxed(population: Population, algorithm: Box<dyn Algorithm>) -> Self {
        Self {
            index: 0,
            problem: population.problem().clone(),
            algorithm_name: algorithm.name().to_string(),
            state: Arc::new(Mutex::new(IslandState {
                population,
                algorithm,
                evolution_time: Duration::ZERO,
                epochs: 0,
            })),
            worker: Mutex::new(None),
        }
    }

    /// Position of the island in its archipelago (0 when standalone)
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Get the problem associated with the island
    pub fn problem(&self) -> &SharedProblem {
        &self.problem
    }

    /// Get the algorithm name
    pub fn algorithm_name(&self) -> &str {
        &self.algorithm_name
    }

    /// Start evolving for `epochs` epochs on a worker thread
    ///
    /// Returns immediately; use [`Island::join`] to wait for completion.
    pub fn evolve(&mut self, epochs: usize) -> EvoResult<()> {
        self.launch(Schedule::Epochs(epochs), Arc::new(Detached))
    }

    /// Start evolving until `duration` has elapsed
    pub fn evolve_t(&mut self, duration: Duration) -> EvoResult<()> {
        self.launch(Schedule::Timed(duration), Arc::new(Detached))
    }

    pub(crate) fn launch(&self, schedule: Schedule, hooks: Arc<dyn EpochHooks>) -> EvoResult<()> {
        let mut slot = self.worker.lock();
        if slot.is_some() {
            return Err(EvolutionError::AlreadyEvolving);
        }

        let index = self.index;
        let state = Arc::clone(&self.state);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let (done_tx, done) = bounded::<()>(0);
        let handle = thread::Builder::new()
            .name(format!("island-{}", index))
            .spawn(move || {
                // declared first so it is released last
                let _done = done_tx;
                let state = state;
                let hooks = hooks;
                run_worker(index, &state, schedule, hooks.as_ref(), &token)
            })?;

        *slot = Some(Worker { handle, done, cancel });
        Ok(())
    }

    /// Ask the worker to stop at its next epoch boundary
    ///
    /// The epoch in progress completes; [`Island::join`] still has to be
    /// called to collect the outcome. Does nothing on an idle island.
    pub fn cancel(&self) {
        if let Some(worker) = self.worker.lock().as_ref() {
            worker.cancel.cancel();
        }
    }

    /// Check whether the worker is still running
    pub fn busy(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map_or(false, |w| !w.handle.is_finished())
    }

    /// Whether a worker was started and not joined yet
    pub(crate) fn has_worker(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Wait for the worker and collect its outcome
    ///
    /// Algorithm failures and worker panics of the last evolve call are
    /// reported here. Joining an idle island succeeds immediately.
    pub fn join(&self) -> EvoResult<()> {
        let worker = self.worker.lock().take();
        let Some(worker) = worker else {
            return Ok(());
        };
        match worker.handle.join() {
            Ok(result) => result,
            Err(_) => Err(EvolutionError::WorkerPanicked { island: self.index }),
        }
    }

    /// Like [`Island::join`], but give up after `timeout`
    ///
    /// On timeout the worker keeps running and a later join still collects it.
    pub fn join_timeout(&self, timeout: Duration) -> EvoResult<()> {
        if !self.wait_until(Instant::now() + timeout) {
            return Err(EvolutionError::JoinTimeout(timeout));
        }
        self.join()
    }

    /// Block until the worker finished or `deadline` passed; true if finished
    pub(crate) fn wait_until(&self, deadline: Instant) -> bool {
        match self.done_signal() {
            Some(done) => !matches!(done.recv_deadline(deadline), Err(RecvTimeoutError::Timeout)),
            None => true,
        }
    }

    /// Block until the worker finished, without collecting its outcome
    pub(crate) fn wait(&self) {
        if let Some(done) = self.done_signal() {
            let _ = done.recv();
        }
    }

    fn done_signal(&self) -> Option<Receiver<()>> {
        self.worker.lock().as_ref().map(|w| w.done.clone())
    }

    /// Run a closure on the population once the worker is idle
    pub fn inspect<R>(&self, f: impl FnOnce(&Population) -> R) -> R {
        self.wait();
        f(&self.state.lock().population)
    }

    /// Copy of the current population (waits for the worker)
    pub fn population(&self) -> Population {
        self.inspect(Population::clone)
    }

    /// Cumulative wall-clock time spent in epochs (waits for the worker)
    pub fn evolution_time(&self) -> Duration {
        self.wait();
        self.state.lock().evolution_time
    }

    /// Total epochs completed (waits for the worker)
    pub fn epochs(&self) -> usize {
        self.wait();
        self.state.lock().epochs
    }

    /// Summary statistics of the island (waits for the worker)
    pub fn statistics(&self) -> IslandStats {
        self.wait();
        let state = self.state.lock();
        IslandStats::new(
            self.index,
            &state.population,
            state.epochs,
            state.evolution_time,
        )
    }

    /// Copy an idle island, including its algorithm state
    ///
    /// Fails with `NotCopyable` while the worker is running.
    pub fn try_clone(&self) -> EvoResult<Island> {
        if self.busy() {
            return Err(EvolutionError::NotCopyable);
        }
        let state = self.state.lock();
        Ok(Island {
            index: self.index,
            problem: self.problem.clone(),
            algorithm_name: self.algorithm_name.clone(),
            state: Arc::new(Mutex::new(IslandState {
                population: state.population.clone(),
                algorithm: state.algorithm.clone_box(),
                evolution_time: state.evolution_time,
                epochs: state.epochs,
            })),
            worker: Mutex::new(None),
        })
    }
}

fn run_worker(
    index: usize,
    state: &Mutex<IslandState>,
    schedule: Schedule,
    hooks: &dyn EpochHooks,
    cancel: &CancellationToken,
) -> EvoResult<()> {
    let mut state = state.lock();
    let Some(start) = hooks.sync_start() else {
        debug!(island = index, "start aborted");
        return Ok(());
    };
    let deadline = match schedule {
        Schedule::Timed(duration) => Some(start + duration),
        Schedule::Epochs(_) => None,
    };

    let mut completed = 0;
    loop {
        if let Schedule::Epochs(epochs) = schedule {
            if completed >= epochs {
                break;
            }
        }
        if cancel.is_cancelled() || hooks.is_cancelled() {
            debug!(island = index, completed, "cancelled");
            break;
        }

        let epoch_start = Instant::now();
        let state = &mut *state;
        let emigrants = hooks.pre_evolution(index, state.epochs, &mut state.population)?;
        state.algorithm.evolve(&mut state.population)?;
        hooks.post_evolution(index, emigrants);
        state.evolution_time += epoch_start.elapsed();
        state.epochs += 1;
        completed += 1;

        if deadline.map_or(false, |d| Instant::now() >= d) {
            break;
        }
    }

    debug!(island = index, completed, elapsed = ?start.elapsed(), "worker finished");
    Ok(())
}

impl Drop for Island {
    fn drop(&mut self) {
        self.cancel();
        if let Err(err) = self.join() {
            warn!(island = self.index, %err, "island worker failed");
        }
    }
}

impl fmt::Debug for Island {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Island")
            .field("index", &self.index)
            .field("problem", &self.problem.name())
            .field("algorithm", &self.algorithm_name)
            .field("busy", &self.busy())
            .finish()
    }
}

impl fmt::Display for Island {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.wait();
        let state = self.state.lock();
        write!(
            f,
            "Island {}: algorithm: {}, population size: {}, epochs: {}, evolution time: {} ms",
            self.index,
            self.algorithm_name,
            state.population.len(),
            state.epochs,
            state.evolution_time.as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        seeded_population, Failing, Noop, Panicking, RandomWalk, Sleepy, Sphere,
    };

    fn sphere(dim: usize) -> SharedProblem {
        Arc::new(Sphere::new(dim))
    }

    #[test]
    fn test_island_new() {
        let island = Island::new(sphere(3), Noop, 12);
        assert_eq!(island.population().len(), 12);
        assert_eq!(island.algorithm_name(), "noop");
        assert_eq!(island.epochs(), 0);
        assert!(!island.busy());
    }

    #[test]
    fn test_evolve_and_join() {
        let population = seeded_population(sphere(3), 20, 1);
        let mut island = Island::with_population(population, RandomWalk::new(7));
        let before = island.population().best_individual().unwrap().fitness();

        island.evolve(5).unwrap();
        island.join().unwrap();

        assert_eq!(island.epochs(), 5);
        assert!(island.evolution_time() > Duration::ZERO);
        let after = island.population().best_individual().unwrap().fitness();
        assert!(after <= before);
    }

    #[test]
    fn test_evolve_is_non_blocking() {
        let mut island = Island::new(sphere(2), Sleepy::new(Duration::from_millis(40)), 4);
        island.evolve(2).unwrap();
        assert!(island.busy());
        island.join().unwrap();
        assert!(!island.busy());
        assert_eq!(island.epochs(), 2);
    }

    #[test]
    fn test_evolve_twice_without_join() {
        let mut island = Island::new(sphere(2), Sleepy::new(Duration::from_millis(30)), 4);
        island.evolve(1).unwrap();
        assert!(matches!(island.evolve(1), Err(EvolutionError::AlreadyEvolving)));
        island.join().unwrap();
        island.evolve(1).unwrap();
        island.join().unwrap();
        assert_eq!(island.epochs(), 2);
    }

    #[test]
    fn test_evolve_t_runs_at_least_one_epoch() {
        let mut island = Island::new(sphere(2), Noop, 4);
        island.evolve_t(Duration::ZERO).unwrap();
        island.join().unwrap();
        assert_eq!(island.epochs(), 1);
    }

    #[test]
    fn test_evolve_t_respects_deadline() {
        let mut island = Island::new(sphere(2), Sleepy::new(Duration::from_millis(10)), 4);
        island.evolve_t(Duration::from_millis(60)).unwrap();
        island.join().unwrap();
        assert!(island.epochs() >= 2);
        assert!(island.evolution_time() >= Duration::from_millis(50));
    }

    #[test]
    fn test_algorithm_error_surfaces_on_join() {
        let mut island = Island::new(sphere(2), Failing, 4);
        island.evolve(3).unwrap();
        assert!(matches!(island.join(), Err(EvolutionError::Algorithm(_))));
        // the outcome is reported once
        assert!(island.join().is_ok());
        assert_eq!(island.epochs(), 0);
    }

    #[test]
    fn test_worker_panic_is_captured() {
        let mut island = Island::new(sphere(2), Panicking, 4);
        island.evolve(1).unwrap();
        assert!(matches!(
            island.join(),
            Err(EvolutionError::WorkerPanicked { island: 0 })
        ));
    }

    #[test]
    fn test_join_timeout() {
        let mut island = Island::new(sphere(2), Sleepy::new(Duration::from_millis(200)), 4);
        island.evolve(1).unwrap();
        assert!(matches!(
            island.join_timeout(Duration::from_millis(10)),
            Err(EvolutionError::JoinTimeout(_))
        ));
        island.join_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(island.epochs(), 1);
    }

    #[test]
    fn test_cancel_stops_unbounded_run() {
        let mut island = Island::new(sphere(2), Sleepy::new(Duration::from_millis(5)), 4);
        island.evolve(usize::MAX).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert!(island.busy());

        island.cancel();
        island.join_timeout(Duration::from_secs(5)).unwrap();
        assert!(!island.busy());
        assert!(island.epochs() >= 1);
    }

    #[test]
    fn test_cancel_applies_to_current_run_only() {
        let mut island = Island::new(sphere(2), Noop, 4);
        island.cancel();
        island.evolve(3).unwrap();
        island.join().unwrap();
        assert_eq!(island.epochs(), 3);
    }

    #[test]
    fn test_drop_stops_unbounded_run() {
        let mut island = Island::new(sphere(2), Sleepy::new(Duration::from_millis(5)), 4);
        island.evolve(usize::MAX).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let (tx, rx) = bounded::<()>(1);
        std::thread::spawn(move || {
            drop(island);
            let _ = tx.send(());
        });
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_try_clone() {
        let mut island = Island::new(sphere(2), Sleepy::new(Duration::from_millis(50)), 4);
        island.evolve(1).unwrap();
        assert!(matches!(island.try_clone(), Err(EvolutionError::NotCopyable)));
        island.join().unwrap();

        let copy = island.try_clone().unwrap();
        assert_eq!(copy.epochs(), 1);
        assert_eq!(
            copy.population().individuals(),
            island.population().individuals()
        );
    }

    #[test]
    fn test_display() {
        let island = Island::new(sphere(2), Noop, 6);
        let text = island.to_string();
        assert!(text.contains("Island 0"));
        assert!(text.contains("population size: 6"));
        assert!(text.contains("noop"));
    }
}
