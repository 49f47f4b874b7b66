//! Archipelago configuration and builder
//!
//! Serde-loadable settings for the island count, population sizes and the
//! migration scheme, plus a fluent builder that validates them.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::archipelago::archipelago::Archipelago;
use crate::error::{EvoResult, EvolutionError};
use crate::island::algorithm::Algorithm;
use crate::migration::policy::{ReplacementPolicy, SelectionPolicy};
use crate::migration::scheme::MigrationScheme;
use crate::migration::topology::{Topology, TopologyKind};
use crate::problem::traits::SharedProblem;

/// Migration settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Shape of the migration graph
    pub topology: TopologyKind,
    /// Which individuals emigrate
    pub selection: SelectionPolicy,
    /// How immigrants are merged
    pub replacement: ReplacementPolicy,
    /// Emigrate every `interval` epochs
    pub interval: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            topology: TopologyKind::Ring,
            selection: SelectionPolicy::default(),
            replacement: ReplacementPolicy::default(),
            interval: 1,
        }
    }
}

impl MigrationConfig {
    /// Check the settings against the number of islands
    pub fn validate(&self, num_islands: usize) -> EvoResult<()> {
        if self.interval == 0 {
            return Err(EvolutionError::Configuration(
                "migration interval must be at least 1".to_string(),
            ));
        }
        self.selection.rate().validate()?;
        if let TopologyKind::Star { hub } = self.topology {
            if hub >= num_islands {
                return Err(EvolutionError::Configuration(format!(
                    "star hub {} out of range for {} islands",
                    hub, num_islands
                )));
            }
        }
        Ok(())
    }

    /// Build the migration scheme these settings describe
    pub fn to_scheme(&self) -> EvoResult<MigrationScheme> {
        MigrationScheme::new(self.selection, self.replacement)
            .with_topology(Topology::new(self.topology.clone()))
            .with_interval(self.interval)
    }
}

/// Archipelago settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchipelagoConfig {
    /// Number of islands
    pub num_islands: usize,
    /// Individuals per island
    pub population_size: usize,
    /// Migration settings; `None` keeps islands isolated
    pub migration: Option<MigrationConfig>,
}

impl Default for ArchipelagoConfig {
    fn default() -> Self {
        Self {
            num_islands: 4,
            population_size: 50,
            migration: None,
        }
    }
}

impl ArchipelagoConfig {
    /// Check the settings
    pub fn validate(&self) -> EvoResult<()> {
        match &self.migration {
            Some(migration) => migration.validate(self.num_islands),
            None => Ok(()),
        }
    }
}

/// Fluent builder for [`Archipelago`]
#[derive(Clone, Debug, Default)]
pub struct ArchipelagoBuilder {
    config: ArchipelagoConfig,
}

impl ArchipelagoBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from loaded settings
    pub fn from_config(config: ArchipelagoConfig) -> Self {
        Self { config }
    }

    /// Set the number of islands
    pub fn num_islands(mut self, num_islands: usize) -> Self {
        self.config.num_islands = num_islands;
        self
    }

    /// Set the individuals per island
    pub fn population_size(mut self, population_size: usize) -> Self {
        self.config.population_size = population_size;
        self
    }

    /// Replace all migration settings
    pub fn migration(mut self, migration: MigrationConfig) -> Self {
        self.config.migration = Some(migration);
        self
    }

    /// Disable migration
    pub fn no_migration(mut self) -> Self {
        self.config.migration = None;
        self
    }

    /// Set the topology, enabling migration with defaults if needed
    pub fn topology(mut self, topology: TopologyKind) -> Self {
        self.migration_mut().topology = topology;
        self
    }

    /// Set the selection policy, enabling migration with defaults if needed
    pub fn selection(mut self, selection: SelectionPolicy) -> Self {
        self.migration_mut().selection = selection;
        self
    }

    /// Set the replacement policy, enabling migration with defaults if needed
    pub fn replacement(mut self, replacement: ReplacementPolicy) -> Self {
        self.migration_mut().replacement = replacement;
        self
    }

    /// Set the migration interval, enabling migration with defaults if needed
    pub fn migration_interval(mut self, interval: usize) -> Self {
        self.migration_mut().interval = interval;
        self
    }

    fn migration_mut(&mut self) -> &mut MigrationConfig {
        self.config.migration.get_or_insert_with(MigrationConfig::default)
    }

    /// Get the settings collected so far
    pub fn config(&self) -> &ArchipelagoConfig {
        &self.config
    }

    /// Validate the settings and build the archipelago
    ///
    /// Every island runs its own copy of `algorithm` on a population drawn
    /// from `rng`.
    pub fn build<R: Rng + ?Sized>(
        self,
        problem: SharedProblem,
        algorithm: &dyn Algorithm,
        rng: &mut R,
    ) -> EvoResult<Archipelago> {
        self.config.validate()?;
        let archipelago = Archipelago::with_islands_rng(
            problem,
            algorithm,
            self.config.num_islands,
            self.config.population_size,
            rng,
        )?;
        match &self.config.migration {
            Some(migration) => Ok(archipelago.with_migration_scheme(migration.to_scheme()?)),
            None => Ok(archipelago),
        }
    }
}
