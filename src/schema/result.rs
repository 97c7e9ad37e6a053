//! Result, progress and statistics types for assembly runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Dimension, QuestionId, QuestionPool};

/// Realized aggregate statistics of a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AggregateStats {
    /// Number of selected questions.
    pub question_count: usize,
    /// Total score.
    pub sum_score: f64,
    /// Mean difficulty.
    pub avg_difficulty: f64,
    /// Mean distinguishing degree.
    pub avg_distinguishing_degree: f64,
    /// Total solution time in seconds.
    pub sum_time: f64,
    /// Selected questions per type.
    pub type_counts: BTreeMap<String, usize>,
    /// Selected questions per category.
    pub category_counts: BTreeMap<u64, usize>,
}

impl AggregateStats {
    /// Aggregate the pool entries of `genes`. Ids missing from the pool are skipped.
    ///
    /// Averages divide by the number of genes.
    pub fn from_genes(genes: &[QuestionId], pool: &QuestionPool) -> Self {
        let mut stats = Self {
            question_count: genes.len(),
            ..Default::default()
        };
        let mut sum_difficulty = 0.0;
        let mut sum_distinguishing = 0.0;

        for question in genes.iter().filter_map(|&id| pool.get(id)) {
            stats.sum_score += question.mark;
            sum_difficulty += question.difficulty;
            sum_distinguishing += question.distinguishing_degree;
            stats.sum_time += question.solution_time;
            *stats.type_counts.entry(question.qtype.clone()).or_insert(0) += 1;
            *stats.category_counts.entry(question.category_id).or_insert(0) += 1;
        }

        if !genes.is_empty() {
            let n = genes.len() as f64;
            stats.avg_difficulty = sum_difficulty / n;
            stats.avg_distinguishing_degree = sum_distinguishing / n;
        }

        stats
    }

    /// Realized value of a dimension.
    pub fn value(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::SumScore => self.sum_score,
            Dimension::AvgDifficulty => self.avg_difficulty,
            Dimension::AvgDistinguishingDegree => self.avg_distinguishing_degree,
            Dimension::SumTime => self.sum_time,
        }
    }
}

/// Error contribution of one constraint to the NRE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintError {
    /// Constraint name (a dimension, `type:<name>` or `category:<id>`).
    pub name: String,
    /// Target value.
    pub target: f64,
    /// Realized value.
    pub actual: f64,
    /// Contribution to the NRE.
    pub error: f64,
}

/// Fitness history for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    /// Best fitness per generation.
    pub best_fitness: Vec<f64>,
    /// Average fitness per generation.
    pub avg_fitness: Vec<f64>,
    /// Standard deviation per generation.
    pub fitness_std: Vec<f64>,
    /// Diversity per generation.
    pub diversity: Vec<f64>,
}

/// Snapshot reported to progress callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Generations completed so far.
    pub generation: usize,
    /// Generation budget.
    pub total_generations: usize,
    /// Best fitness seen so far.
    pub best_fitness: f64,
    /// Mean fitness of the current population.
    pub avg_fitness: f64,
    /// Generations since the best fitness last improved.
    pub stagnation_count: usize,
    /// Genes of the current best chromosome.
    pub best_genes: Vec<QuestionId>,
}

/// Final result of an assembly run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyResult {
    /// Selected question ids, in quiz order.
    pub genes: Vec<QuestionId>,
    /// Fitness of the selection.
    pub fitness: f64,
    /// Realized aggregates of the selection.
    pub stats: AggregateStats,
    /// Per-constraint error terms.
    pub errors: Vec<ConstraintError>,
    /// Run statistics.
    pub run: RunStats,
    /// Per-generation history.
    pub history: EvolutionHistory,
}

/// Statistics from an assembly run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    /// Generations evolved.
    pub generations: usize,
    /// Chromosomes evaluated.
    pub evaluations: u64,
    /// Seed the run used.
    pub seed: u64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached the generation budget.
    MaxGenerations,
    /// Reached target fitness.
    TargetReached,
    /// Stagnation limit hit.
    Stagnation,
    /// Wall-clock budget exhausted.
    TimeLimit,
    /// Caller cancelled.
    Cancelled,
}
