//! Error types for evo-archipelago
//!
//! This module defines all error types used throughout the library.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for population, island and archipelago operations
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Decision vector length (or deme size) does not match what was expected
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Index out of range
    #[error("Index {index} out of range for population of size {len}")]
    IndexError { index: usize, len: usize },

    /// Island's problem differs from the archipelago's problem
    #[error("Incompatible island: problem '{island}' does not match archipelago problem '{archipelago}'")]
    IncompatibleIsland { island: String, archipelago: String },

    /// No migration scheme is attached
    #[error("No migration scheme attached to the archipelago")]
    NoMigrationScheme,

    /// The migration scheme has no topology
    #[error("Migration scheme has no topology")]
    NoTopology,

    /// Empty population
    #[error("Empty population")]
    EmptyPopulation,

    /// Archipelago without islands
    #[error("Empty archipelago")]
    EmptyArchipelago,

    /// Evolve requested while workers of a previous call have not been joined
    #[error("Evolution already in progress")]
    AlreadyEvolving,

    /// Attempt to copy something that owns a live worker
    #[error("Cannot copy an island while its worker is running")]
    NotCopyable,

    /// Algorithm failed during an epoch
    #[error("Algorithm failed: {0}")]
    Algorithm(String),

    /// Island worker panicked
    #[error("Worker of island {island} panicked")]
    WorkerPanicked { island: usize },

    /// Worker thread could not be started
    #[error("Failed to spawn worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    /// Workers did not finish before the deadline
    #[error("Workers still running after {0:?}")]
    JoinTimeout(Duration),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

/// Result type alias for evolution operations
pub type EvoResult<T> = Result<T, EvolutionError>;
