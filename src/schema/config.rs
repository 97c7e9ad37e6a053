//! Configuration types for quiz assembly runs.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Dimension, QuestionId};

/// Top-level configuration for an assembly run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Genetic algorithm hyperparameters.
    #[serde(default)]
    pub genetic: GeneticAlgorithmConfig,
    /// Maximum number of generations to evolve.
    #[serde(default = "default_generations")]
    pub generations: usize,
    /// Early termination criteria.
    #[serde(default)]
    pub stop: StopConfig,
    /// How zero-valued target dimensions are scored.
    #[serde(default)]
    pub zero_target: ZeroTargetPolicy,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            genetic: GeneticAlgorithmConfig::default(),
            generations: default_generations(),
            stop: StopConfig::default(),
            zero_target: ZeroTargetPolicy::default(),
            random_seed: None,
        }
    }
}

fn default_generations() -> usize {
    200
}

/// Genetic algorithm hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticAlgorithmConfig {
    /// Number of chromosomes in the population.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Fraction of the population kept unchanged each generation (0.0-1.0).
    #[serde(default = "default_elitism_rate")]
    pub elitism_rate: f64,
    /// Probability of producing offspring by crossover (0.0-1.0).
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Probability of mutating each offspring (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Tournament selection draws `tournament_size + 1` contenders.
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            elitism_rate: default_elitism_rate(),
            crossover_rate: default_crossover_rate(),
            mutation_rate: default_mutation_rate(),
            tournament_size: default_tournament_size(),
        }
    }
}

impl GeneticAlgorithmConfig {
    /// Number of members carried over unchanged.
    pub fn elite_count(&self) -> usize {
        ((self.population_size as f64 * self.elitism_rate).floor() as usize)
            .min(self.population_size)
    }

    /// Validate population size and rates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 1 {
            return Err(ConfigError::PopulationTooSmall);
        }

        let check_rate = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidRate { name, value })
            }
        };

        check_rate(self.elitism_rate, "elitism_rate")?;
        check_rate(self.crossover_rate, "crossover_rate")?;
        check_rate(self.mutation_rate, "mutation_rate")
    }
}

fn default_population_size() -> usize {
    50
}
fn default_elitism_rate() -> f64 {
    0.1
}
fn default_crossover_rate() -> f64 {
    0.8
}
fn default_mutation_rate() -> f64 {
    0.2
}
fn default_tournament_size() -> usize {
    2
}

/// Early termination criteria, checked between generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopConfig {
    /// Stop once the best fitness reaches this value.
    #[serde(default = "default_target_fitness")]
    pub target_fitness: Option<f64>,
    /// Stop after this many generations without improvement.
    #[serde(default)]
    pub stagnation_limit: Option<usize>,
    /// Wall-clock budget in milliseconds.
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            target_fitness: default_target_fitness(),
            stagnation_limit: None,
            time_limit_ms: None,
        }
    }
}

impl StopConfig {
    /// Run the full generation budget.
    pub fn never() -> Self {
        Self {
            target_fitness: None,
            stagnation_limit: None,
            time_limit_ms: None,
        }
    }
}

fn default_target_fitness() -> Option<f64> {
    Some(1.0)
}

/// Scoring of a target dimension whose value is zero.
///
/// The relative error `|target - actual| / target` is undefined there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy")]
pub enum ZeroTargetPolicy {
    /// Contribute 0 when the actual value is also zero, `penalty` otherwise.
    Penalize {
        #[serde(default = "default_zero_penalty")]
        penalty: f64,
    },
    /// Refuse to run with an enabled zero-valued dimension.
    Reject,
}

impl Default for ZeroTargetPolicy {
    fn default() -> Self {
        Self::Penalize {
            penalty: default_zero_penalty(),
        }
    }
}

impl ZeroTargetPolicy {
    /// Error charged when a zero target meets a non-zero actual value.
    ///
    /// `Reject` never gets that far; validation refuses the run first.
    pub fn penalty(&self) -> f64 {
        match *self {
            ZeroTargetPolicy::Penalize { penalty } => penalty,
            ZeroTargetPolicy::Reject => DEFAULT_ZERO_PENALTY,
        }
    }

    /// A penalty must be positive and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            ZeroTargetPolicy::Penalize { penalty } if !(penalty.is_finite() && penalty > 0.0) => {
                Err(ConfigError::InvalidPenalty(penalty))
            }
            _ => Ok(()),
        }
    }
}

/// Default error charged by [`ZeroTargetPolicy::Penalize`].
pub const DEFAULT_ZERO_PENALTY: f64 = 100.0;

fn default_zero_penalty() -> f64 {
    DEFAULT_ZERO_PENALTY
}

// ============================================================================
// Validation
// ============================================================================

/// Configuration and input validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be at least 1")]
    PopulationTooSmall,
    #[error("Invalid rate for {name}: {value} (expected 0.0-1.0)")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("Target fitness must be in (0, 1], got {0}")]
    InvalidTargetFitness(f64),
    #[error("Zero-target penalty must be positive and finite, got {0}")]
    InvalidPenalty(f64),
    #[error("Restart count must be at least 1")]
    NoRestarts,
    #[error("Question count must be greater than zero")]
    InvalidQuestionCount,
    #[error("Invalid target for {dimension}: {value}")]
    InvalidTarget { dimension: Dimension, value: f64 },
    #[error("Requested {name} counts total {total}, more than {question_count} questions")]
    CompositionTooLarge {
        name: &'static str,
        total: usize,
        question_count: usize,
    },
    #[error("Target profile has no active constraint")]
    NoActiveConstraints,
    #[error("Question {id} has invalid {field}: {value}")]
    InvalidQuestion {
        id: QuestionId,
        field: &'static str,
        value: f64,
    },
    #[error("Duplicate question id {0} in pool")]
    DuplicateQuestion(QuestionId),
}

impl AssemblyConfig {
    /// Validate hyperparameters and stop criteria.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.genetic.validate()?;

        if let Some(target) = self.stop.target_fitness
            && !(target > 0.0 && target <= 1.0)
        {
            return Err(ConfigError::InvalidTargetFitness(target));
        }

        self.zero_target.validate()
    }
}

/// Load an assembly configuration from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> io::Result<AssemblyConfig> {
    let content = fs::read_to_string(path)?;
    let config: AssemblyConfig = serde_json::from_str(&content)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    config
        .validate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(config)
}
