//! Archipelago
//!
//! An ordered collection of islands sharing one problem. Evolve calls build a
//! fresh start barrier sized to the current island count and hand every
//! island worker a link carrying that barrier, the migration scheme and a
//! cancellation token.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{info, warn};

use crate::diagnostics::ArchipelagoStats;
use crate::error::{EvoResult, EvolutionError};
use crate::island::algorithm::Algorithm;
use crate::island::hooks::EpochHooks;
use crate::island::island::{Island, Schedule};
use crate::island::sync::{CancellationToken, StartBarrier};
use crate::migration::scheme::MigrationScheme;
use crate::migration::topology::Topology;
use crate::population::individual::Individual;
use crate::population::population::Population;
use crate::problem::traits::{same_problem, SharedProblem};

/// What an island worker sees of its archipelago during one evolve call
struct ArchipelagoLink {
    barrier: StartBarrier,
    migration: Option<Arc<MigrationScheme>>,
    cancel: CancellationToken,
}

impl EpochHooks for ArchipelagoLink {
    fn sync_start(&self) -> Option<Instant> {
        self.barrier.wait()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn pre_evolution(
        &self,
        island: usize,
        epoch: usize,
        population: &mut Population,
    ) -> EvoResult<Option<Population>> {
        let Some(scheme) = &self.migration else {
            return Ok(None);
        };
        scheme.pre_evolution(island, population)?;
        if scheme.emigrates_at(epoch) {
            scheme.select_emigrants(population).map(Some)
        } else {
            Ok(None)
        }
    }

    fn post_evolution(&self, island: usize, emigrants: Option<Population>) {
        if let (Some(scheme), Some(emigrants)) = (&self.migration, emigrants) {
            scheme.post_evolution(island, &emigrants);
        }
    }
}

/// Islands evolving concurrently on one problem, exchanging migrants
///
/// An archipelago owns live workers and cannot be cloned.
pub struct Archipelago {
    problem: SharedProblem,
    islands: Vec<Island>,
    migration: Option<Arc<MigrationScheme>>,
    cancel: CancellationToken,
}

impl Archipelago {
    /// Create an empty archipelago without migration
    pub fn new(problem: SharedProblem) -> Self {
        Self {
            problem,
            islands: Vec::new(),
            migration: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a migration scheme (builder style)
    pub fn with_migration_scheme(mut self, mut scheme: MigrationScheme) -> Self {
        scheme.resize(self.islands.len());
        self.migration = Some(Arc::new(scheme));
        self
    }

    /// Create `islands` islands of `size` random individuals, each running a
    /// copy of `algorithm`
    pub fn with_islands(
        problem: SharedProblem,
        algorithm: &dyn Algorithm,
        islands: usize,
        size: usize,
    ) -> EvoResult<Self> {
        Self::with_islands_rng(problem, algorithm, islands, size, &mut rand::thread_rng())
    }

    pub(crate) fn with_islands_rng<R: Rng + ?Sized>(
        problem: SharedProblem,
        algorithm: &dyn Algorithm,
        islands: usize,
        size: usize,
        rng: &mut R,
    ) -> EvoResult<Self> {
        let mut archipelago = Self::new(problem);
        for _ in 0..islands {
            let population = Population::random(archipelago.problem.clone(), size, rng);
            archipelago.push_back(Island::from_boxed(population, algorithm.clone_box()))?;
        }
        Ok(archipelago)
    }

    /// Get the shared problem
    pub fn problem(&self) -> &SharedProblem {
        &self.problem
    }

    /// Number of islands
    pub fn len(&self) -> usize {
        self.islands.len()
    }

    /// Check whether the archipelago has no islands
    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    /// Get an island by index
    pub fn island(&self, index: usize) -> EvoResult<&Island> {
        self.islands.get(index).ok_or(EvolutionError::IndexError {
            index,
            len: self.islands.len(),
        })
    }

    /// Get all islands in order
    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    /// Append an island
    ///
    /// Fails with `IncompatibleIsland` if the island works on a different
    /// problem. Running workers (of the archipelago and of the island) are
    /// waited for first; their outcomes are left for [`Archipelago::join`].
    pub fn push_back(&mut self, mut island: Island) -> EvoResult<()> {
        self.check_compatible(&island)?;
        island.wait();
        self.settle();

        island.set_index(self.islands.len());
        if self.migration.is_some() {
            self.scheme_mut()?.register_island();
        }
        self.islands.push(island);
        Ok(())
    }

    /// Replace the island at `index`, keeping its position
    ///
    /// The topology is unchanged and migrants queued for `index` go to the
    /// new island. Running workers are waited for first. An outcome of the
    /// replaced island that was never joined is logged and discarded.
    pub fn set_island(&mut self, index: usize, mut island: Island) -> EvoResult<()> {
        let len = self.islands.len();
        if index >= len {
            return Err(EvolutionError::IndexError { index, len });
        }
        self.check_compatible(&island)?;
        island.wait();
        self.settle();

        island.set_index(index);
        let previous = std::mem::replace(&mut self.islands[index], island);
        if let Err(err) = previous.join() {
            warn!(island = index, %err, "replaced island had failed");
        }
        Ok(())
    }

    fn check_compatible(&self, island: &Island) -> EvoResult<()> {
        if same_problem(&self.problem, island.problem()) {
            Ok(())
        } else {
            Err(EvolutionError::IncompatibleIsland {
                island: island.problem().name().to_string(),
                archipelago: self.problem.name().to_string(),
            })
        }
    }

    /// Wait for every running worker without collecting outcomes
    fn settle(&self) {
        for island in &self.islands {
            island.wait();
        }
    }

    /// Replace the migration scheme, sizing it to the current islands
    ///
    /// Migrants still queued in the previous scheme are discarded.
    pub fn set_migration_scheme(&mut self, mut scheme: MigrationScheme) -> EvoResult<()> {
        self.settle();
        scheme.resize(self.islands.len());
        self.migration = Some(Arc::new(scheme));
        Ok(())
    }

    /// Get the migration scheme
    pub fn migration_scheme(&self) -> EvoResult<&MigrationScheme> {
        self.migration
            .as_deref()
            .ok_or(EvolutionError::NoMigrationScheme)
    }

    /// Get the topology of the migration scheme
    pub fn topology(&self) -> EvoResult<&Topology> {
        self.migration_scheme()?.topology()
    }

    /// Replace the topology of the migration scheme
    pub fn set_topology(&mut self, topology: Topology) -> EvoResult<()> {
        if self.migration.is_none() {
            return Err(EvolutionError::NoMigrationScheme);
        }
        self.settle();
        self.scheme_mut()?.set_topology(topology);
        Ok(())
    }

    fn scheme_mut(&mut self) -> EvoResult<&mut MigrationScheme> {
        let scheme = self
            .migration
            .as_mut()
            .ok_or(EvolutionError::NoMigrationScheme)?;
        // exclusive once every worker holding a link has exited
        Arc::get_mut(scheme).ok_or(EvolutionError::AlreadyEvolving)
    }

    /// Start `epochs` epochs on every island; does not block
    pub fn evolve(&mut self, epochs: usize) -> EvoResult<()> {
        self.dispatch(Schedule::Epochs(epochs))
    }

    /// Start timed evolution on every island; does not block
    ///
    /// Each island stops at the first epoch boundary past `duration` after
    /// the shared start instant.
    pub fn evolve_t(&mut self, duration: Duration) -> EvoResult<()> {
        self.dispatch(Schedule::Timed(duration))
    }

    fn dispatch(&mut self, schedule: Schedule) -> EvoResult<()> {
        if self.islands.iter().any(Island::has_worker) {
            return Err(EvolutionError::AlreadyEvolving);
        }
        if self.islands.is_empty() {
            return Ok(());
        }

        self.cancel = CancellationToken::new();
        let link = Arc::new(ArchipelagoLink {
            barrier: StartBarrier::new(self.islands.len()),
            migration: self.migration.clone(),
            cancel: self.cancel.clone(),
        });
        info!(
            islands = self.islands.len(),
            ?schedule,
            migration = self.migration.is_some(),
            "evolving archipelago"
        );

        for island in &self.islands {
            if let Err(err) = island.launch(schedule, link.clone()) {
                // release the workers already parked on the barrier
                link.barrier.abort();
                drop(link);
                self.join()?;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Check whether any island worker is still running
    pub fn busy(&self) -> bool {
        self.islands.iter().any(Island::busy)
    }

    /// Wait for every island worker of the last evolve call
    ///
    /// Every island is joined even if some fail; the first failure is
    /// returned.
    pub fn join(&self) -> EvoResult<()> {
        let mut first_error = None;
        for island in &self.islands {
            if let Err(err) = island.join() {
                warn!(island = island.index(), %err, "island evolution failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Like [`Archipelago::join`], but give up once `timeout` has elapsed
    pub fn join_timeout(&self, timeout: Duration) -> EvoResult<()> {
        let deadline = Instant::now() + timeout;
        for island in &self.islands {
            if !island.wait_until(deadline) {
                return Err(EvolutionError::JoinTimeout(timeout));
            }
        }
        self.join()
    }

    /// Ask every island to stop at its next epoch boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Best individual over all islands
    ///
    /// Fails with `EmptyArchipelago` without islands, and with
    /// `EmptyPopulation` if every island is empty.
    pub fn best(&self) -> EvoResult<Individual> {
        if self.islands.is_empty() {
            return Err(EvolutionError::EmptyArchipelago);
        }

        let mut best: Option<Individual> = None;
        for island in &self.islands {
            let candidate = island.inspect(|p| p.best_individual().ok().cloned());
            if let Some(candidate) = candidate {
                if best.as_ref().map_or(true, |b| candidate.is_better_than(b)) {
                    best = Some(candidate);
                }
            }
        }
        best.ok_or(EvolutionError::EmptyPopulation)
    }

    /// Longest cumulative evolution time of any island
    pub fn max_evolution_time(&self) -> Duration {
        self.islands
            .iter()
            .map(Island::evolution_time)
            .max()
            .unwrap_or_default()
    }

    /// Sum of the islands' cumulative evolution times
    pub fn total_evolution_time(&self) -> Duration {
        self.islands.iter().map(Island::evolution_time).sum()
    }

    /// Per-island statistics
    pub fn statistics(&self) -> ArchipelagoStats {
        ArchipelagoStats::new(self.islands.iter().map(Island::statistics).collect())
    }
}

impl Drop for Archipelago {
    fn drop(&mut self) {
        self.cancel();
        // errors were already logged by join
        let _ = self.join();
    }
}

impl fmt::Debug for Archipelago {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archipelago")
            .field("problem", &self.problem.name())
            .field("islands", &self.islands)
            .field("migration", &self.migration)
            .finish()
    }
}

impl fmt::Display for Archipelago {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Archipelago: {} islands, problem: {} (dimension {})",
            self.islands.len(),
            self.problem.name(),
            self.problem.dimension()
        )?;
        match &self.migration {
            Some(scheme) => write!(f, "{}", scheme)?,
            None => writeln!(f, "Migration: none")?,
        }
        for island in &self.islands {
            writeln!(f, "{}", island)?;
        }
        Ok(())
    }
}
