//! Compute module - Genetic search for a question subset matching a target profile.
//!
//! # Overview
//!
//! - **Fitness** (`fitness`): aggregates a selection and scores it by NRE
//! - **Chromosome** (`chromosome`): random generation, crossover with repair, mutation
//! - **Population** (`population`): elitism, tournament selection, reproduction
//! - **Driver** (`driver`): generation loop, stop criteria, parallel restarts

mod chromosome;
mod driver;
mod fitness;
mod population;
mod rng;

use crate::schema::{ConfigError, Dimension};

pub use chromosome::Chromosome;
pub use driver::{EvolutionDriver, assemble, assemble_with_restarts};
pub use fitness::{AssemblyContext, ZERO_TOLERANCE};
pub use population::Population;
pub use rng::AssemblyRng;

/// Error type for assembly runs.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error("Pool has {available} candidate questions but {required} are required")]
    InsufficientCandidates { available: usize, required: usize },
    #[error("Target {dimension} is zero and the zero-target policy rejects it")]
    ArithmeticPolicyViolation { dimension: Dimension },
    #[error("No unused question left to mutate into ({question_count} selected)")]
    Exhaustion { question_count: usize },
    #[error("Invalid genes: {0}")]
    InvalidGenes(String),
}
