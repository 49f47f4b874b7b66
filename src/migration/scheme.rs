//! Migration scheme
//!
//! Owns the topology, the selection and replacement policies, and one inbound
//! channel per island. Upstream neighbours send [`Migrants`] into the
//! destination's channel in their post-epoch callback; the destination drains
//! its own channel in its pre-epoch callback. Channels are only touched at
//! epoch boundaries and never while holding another island's state.

use std::fmt;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{trace, warn};

use crate::error::{EvoResult, EvolutionError};
use crate::migration::policy::{ReplacementPolicy, SelectionPolicy};
use crate::migration::topology::Topology;
use crate::population::population::Population;

/// A batch of emigrants in transit
#[derive(Clone, Debug)]
pub struct Migrants {
    /// Index of the island the individuals left
    pub origin: usize,
    /// Copies of the emigrating individuals
    pub individuals: Population,
}

#[derive(Debug)]
struct Mailbox {
    sender: Sender<Migrants>,
    receiver: Receiver<Migrants>,
}

impl Mailbox {
    fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }
}

/// Topology plus emigrant/immigrant policies and per-island mailboxes
#[derive(Debug)]
pub struct MigrationScheme {
    topology: Option<Topology>,
    selection: SelectionPolicy,
    replacement: ReplacementPolicy,
    interval: usize,
    mailboxes: Vec<Mailbox>,
}

impl MigrationScheme {
    /// Create a scheme without topology (no routes until one is set)
    pub fn new(selection: SelectionPolicy, replacement: ReplacementPolicy) -> Self {
        Self {
            topology: None,
            selection,
            replacement,
            interval: 1,
            mailboxes: Vec::new(),
        }
    }

    /// Set the topology (builder style)
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.set_topology(topology);
        self
    }

    /// Emigrate every `interval` epochs (builder style)
    pub fn with_interval(mut self, interval: usize) -> EvoResult<Self> {
        if interval == 0 {
            return Err(EvolutionError::Configuration(
                "migration interval must be at least 1".to_string(),
            ));
        }
        self.interval = interval;
        Ok(self)
    }

    /// Get the topology
    pub fn topology(&self) -> EvoResult<&Topology> {
        self.topology.as_ref().ok_or(EvolutionError::NoTopology)
    }

    /// Replace the topology, sizing it to the registered islands
    pub fn set_topology(&mut self, mut topology: Topology) {
        topology.resize(self.mailboxes.len());
        self.topology = Some(topology);
    }

    /// Get the selection policy
    pub fn selection(&self) -> SelectionPolicy {
        self.selection
    }

    /// Get the replacement policy
    pub fn replacement(&self) -> ReplacementPolicy {
        self.replacement
    }

    /// Epochs between emigrations
    pub fn interval(&self) -> usize {
        self.interval
    }

    /// Number of registered islands
    pub fn size(&self) -> usize {
        self.mailboxes.len()
    }

    /// Register one more island, returning its index
    pub fn register_island(&mut self) -> usize {
        self.resize(self.mailboxes.len() + 1);
        self.mailboxes.len() - 1
    }

    /// Size mailboxes and topology to `islands`
    pub fn resize(&mut self, islands: usize) {
        self.mailboxes.resize_with(islands, Mailbox::new);
        if let Some(topology) = &mut self.topology {
            topology.resize(islands);
        }
    }

    /// Whether an island emigrates during its epoch number `epoch` (0-based)
    pub fn emigrates_at(&self, epoch: usize) -> bool {
        (epoch + 1) % self.interval == 0
    }

    /// Number of batches waiting for `island`
    pub fn pending(&self, island: usize) -> usize {
        self.mailboxes.get(island).map_or(0, |m| m.receiver.len())
    }

    /// Take every batch waiting for `island` without merging it
    pub fn drain(&self, island: usize) -> Vec<Migrants> {
        self.mailboxes
            .get(island)
            .map(|m| m.receiver.try_iter().collect())
            .unwrap_or_default()
    }

    /// Pre-epoch callback: merge immigrants that arrived since the last drain
    ///
    /// Batches whose origin is no longer an in-neighbour of `island` are
    /// discarded. Returns the number of individuals considered for insertion.
    pub fn pre_evolution(&self, island: usize, population: &mut Population) -> EvoResult<usize> {
        let Some(mailbox) = self.mailboxes.get(island) else {
            return Ok(0);
        };
        let sources = self.topology.as_ref().map(|t| t.neighbors_in(island));

        let mut rng = rand::thread_rng();
        let mut merged = 0;
        for migrants in mailbox.receiver.try_iter() {
            match sources {
                Some(sources) if sources.contains(&migrants.origin) => {
                    let count = self
                        .replacement
                        .apply(population, &migrants.individuals, &mut rng)?;
                    trace!(
                        origin = migrants.origin,
                        destination = island,
                        count,
                        "merged immigrants"
                    );
                    merged += count;
                }
                _ => warn!(
                    origin = migrants.origin,
                    destination = island,
                    "dropping migrants without a route"
                ),
            }
        }
        Ok(merged)
    }

    /// Pick the emigrants of `island` according to the selection policy
    pub fn select_emigrants(&self, population: &Population) -> EvoResult<Population> {
        self.selection.select(population, &mut rand::thread_rng())
    }

    /// Post-epoch callback: send emigrants to every out-neighbour of `island`
    pub fn post_evolution(&self, island: usize, emigrants: &Population) {
        if emigrants.is_empty() {
            return;
        }
        let Some(topology) = &self.topology else {
            return;
        };

        for &destination in topology.neighbors_out(island) {
            let Some(mailbox) = self.mailboxes.get(destination) else {
                continue;
            };
            let migrants = Migrants {
                origin: island,
                individuals: emigrants.clone(),
            };
            // the scheme owns every receiver, so sending cannot fail while it is alive
            if mailbox.sender.send(migrants).is_ok() {
                trace!(
                    origin = island,
                    destination,
                    count = emigrants.len(),
                    "sent emigrants"
                );
            }
        }
    }
}

impl Clone for MigrationScheme {
    /// Copies configuration and topology; migrants in transit are not copied
    fn clone(&self) -> Self {
        let mut scheme = Self {
            topology: self.topology.clone(),
            selection: self.selection,
            replacement: self.replacement,
            interval: self.interval,
            mailboxes: Vec::new(),
        };
        scheme.resize(self.mailboxes.len());
        scheme
    }
}

impl Default for MigrationScheme {
    fn default() -> Self {
        Self::new(SelectionPolicy::default(), ReplacementPolicy::default())
            .with_topology(Topology::default())
    }
}

impl fmt::Display for MigrationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Migration: selection {:?}, replacement {:?}, every {} epoch(s)",
            self.selection, self.replacement, self.interval
        )?;
        match &self.topology {
            Some(topology) => write!(f, "{}", topology),
            None => writeln!(f, "Topology: none"),
        }
    }
}
