//! Error types for the projection and simulation engines.

use thiserror::Error;

/// Failure to derive statistics from a series of values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatisticsError {
    #[error("insufficient price data: at least 2 prices are required, got {found}")]
    InsufficientData { found: usize },

    #[error("cannot compute {what} of an empty result set")]
    EmptyInput { what: &'static str },
}

/// Failure of a Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("a simulation is already running on this simulator")]
    Reentrancy,

    #[error("simulation cancelled after {completed} of {requested} paths")]
    Cancelled { completed: u32, requested: u32 },
}
