//! Migration topologies
//!
//! A topology is a directed graph over island indices `0..size`; an edge
//! `i -> j` allows emigrants of island `i` to reach island `j`. Adjacency is
//! rebuilt whenever the number of islands changes, so queries never name an
//! island that does not exist.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EvoResult, EvolutionError};

/// Shape of the migration graph
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TopologyKind {
    /// No routes at all
    Unconnected,
    /// Each island exchanges with both ring neighbours
    Ring,
    /// Each island sends to the next one only
    OneWayRing,
    /// Every island sends to every other island
    FullyConnected,
    /// The hub exchanges with every other island
    Star { hub: usize },
    /// User-supplied directed edges
    Custom { edges: Vec<(usize, usize)> },
}

impl Default for TopologyKind {
    fn default() -> Self {
        Self::Ring
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconnected => write!(f, "unconnected"),
            Self::Ring => write!(f, "ring"),
            Self::OneWayRing => write!(f, "one-way ring"),
            Self::FullyConnected => write!(f, "fully connected"),
            Self::Star { hub } => write!(f, "star (hub {})", hub),
            Self::Custom { .. } => write!(f, "custom"),
        }
    }
}

/// Migration graph sized to the current number of islands
#[derive(Clone, Debug, PartialEq)]
pub struct Topology {
    kind: TopologyKind,
    size: usize,
    outbound: Vec<Vec<usize>>,
    inbound: Vec<Vec<usize>>,
}

impl Topology {
    /// Create an empty topology of the given kind
    pub fn new(kind: TopologyKind) -> Self {
        Self {
            kind,
            size: 0,
            outbound: Vec::new(),
            inbound: Vec::new(),
        }
    }

    /// Topology without routes
    pub fn unconnected() -> Self {
        Self::new(TopologyKind::Unconnected)
    }

    /// Bidirectional ring
    pub fn ring() -> Self {
        Self::new(TopologyKind::Ring)
    }

    /// Directed ring `0 -> 1 -> ... -> n-1 -> 0`
    pub fn one_way_ring() -> Self {
        Self::new(TopologyKind::OneWayRing)
    }

    /// Complete directed graph
    pub fn fully_connected() -> Self {
        Self::new(TopologyKind::FullyConnected)
    }

    /// Star centred on `hub`
    pub fn star(hub: usize) -> Self {
        Self::new(TopologyKind::Star { hub })
    }

    /// Custom graph, initially without edges
    pub fn custom() -> Self {
        Self::new(TopologyKind::Custom { edges: Vec::new() })
    }

    /// Set the node count (builder style)
    pub fn with_size(mut self, size: usize) -> Self {
        self.resize(size);
        self
    }

    /// Get the topology kind
    pub fn kind(&self) -> &TopologyKind {
        &self.kind
    }

    /// Number of nodes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Change the node count and rebuild the adjacency
    pub fn resize(&mut self, size: usize) {
        self.size = size;
        self.rebuild();
    }

    /// Append one node, returning its index
    pub fn push_node(&mut self) -> usize {
        self.resize(self.size + 1);
        self.size - 1
    }

    /// Add a directed edge to a custom topology
    ///
    /// Nodes beyond the current size are accepted; the edge stays inactive
    /// until the topology grows to include both ends.
    pub fn add_edge(&mut self, from: usize, to: usize) -> EvoResult<()> {
        match &mut self.kind {
            TopologyKind::Custom { edges } => {
                if from != to && !edges.contains(&(from, to)) {
                    edges.push((from, to));
                }
            }
            other => {
                return Err(EvolutionError::Configuration(format!(
                    "cannot add edges to a {} topology",
                    other
                )))
            }
        }
        self.rebuild();
        Ok(())
    }

    /// Islands that receive emigrants from `island`
    pub fn neighbors_out(&self, island: usize) -> &[usize] {
        self.outbound.get(island).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Islands that send emigrants to `island`
    pub fn neighbors_in(&self, island: usize) -> &[usize] {
        self.inbound.get(island).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check whether the route `from -> to` exists
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.neighbors_out(from).contains(&to)
    }

    /// Iterate over all edges in `(from, to)` order
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.outbound
            .iter()
            .enumerate()
            .flat_map(|(from, targets)| targets.iter().map(move |&to| (from, to)))
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.outbound.iter().map(Vec::len).sum()
    }

    fn rebuild(&mut self) {
        let n = self.size;
        let mut outbound = vec![Vec::new(); n];
        let mut link = |from: usize, to: usize| {
            if from < n && to < n && from != to {
                outbound[from].push(to);
            }
        };

        match &self.kind {
            TopologyKind::Unconnected => {}
            TopologyKind::Ring => {
                for i in 0..n {
                    link(i, (i + 1) % n);
                    link(i, (i + n - 1) % n);
                }
            }
            TopologyKind::OneWayRing => {
                for i in 0..n {
                    link(i, (i + 1) % n);
                }
            }
            TopologyKind::FullyConnected => {
                for i in 0..n {
                    for j in 0..n {
                        link(i, j);
                    }
                }
            }
            TopologyKind::Star { hub } => {
                for i in 0..n {
                    link(*hub, i);
                    link(i, *hub);
                }
            }
            TopologyKind::Custom { edges } => {
                for &(from, to) in edges {
                    link(from, to);
                }
            }
        }

        let mut inbound = vec![Vec::new(); n];
        for targets in &mut outbound {
            targets.sort_unstable();
            targets.dedup();
        }
        for (from, targets) in outbound.iter().enumerate() {
            for &to in targets {
                inbound[to].push(from);
            }
        }

        self.outbound = outbound;
        self.inbound = inbound;
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::new(TopologyKind::default())
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Topology: {}, {} nodes", self.kind, self.size)?;
        for (from, targets) in self.outbound.iter().enumerate() {
            writeln!(f, "  {} -> {:?}", from, targets)?;
        }
        Ok(())
    }
}
