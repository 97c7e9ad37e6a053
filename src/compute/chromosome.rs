//! Chromosome: one candidate quiz and its genetic operators.

use std::collections::HashSet;

use crate::schema::{AggregateStats, QuestionId};

use super::AssemblyError;
use super::fitness::AssemblyContext;
use super::rng::AssemblyRng;

/// A candidate quiz: `question_count` distinct question ids and their fitness.
///
/// Chromosomes are never modified in place. `mate` and `mutate` return new
/// chromosomes whose fitness is computed on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    genes: Vec<QuestionId>,
    fitness: f64,
}

impl Chromosome {
    /// Build a chromosome from caller-supplied genes.
    ///
    /// Fails unless there are exactly `question_count` distinct ids, all in the pool.
    pub fn new(genes: Vec<QuestionId>, ctx: &AssemblyContext<'_>) -> Result<Self, AssemblyError> {
        let k = ctx.question_count();
        if genes.len() != k {
            return Err(AssemblyError::InvalidGenes(format!(
                "expected {k} genes, got {}",
                genes.len()
            )));
        }

        let mut seen = HashSet::with_capacity(k);
        for &id in &genes {
            if !ctx.pool().contains(id) {
                return Err(AssemblyError::InvalidGenes(format!(
                    "question {id} is not in the pool"
                )));
            }
            if !seen.insert(id) {
                return Err(AssemblyError::InvalidGenes(format!(
                    "question {id} selected twice"
                )));
            }
        }

        Ok(Self::from_valid_genes(genes, ctx))
    }

    /// Genes already known to satisfy the length and distinctness invariants.
    fn from_valid_genes(genes: Vec<QuestionId>, ctx: &AssemblyContext<'_>) -> Self {
        let fitness = ctx.fitness(&genes);
        Self { genes, fitness }
    }

    /// Sample `question_count` distinct pool ids uniformly.
    pub fn gen_random(ctx: &AssemblyContext<'_>, rng: &mut AssemblyRng) -> Self {
        let questions = ctx.pool().questions();
        let genes = rng
            .sample_indices(questions.len(), ctx.question_count())
            .into_iter()
            .map(|i| questions[i].id)
            .collect();
        Self::from_valid_genes(genes, ctx)
    }

    /// Selected question ids, in quiz order.
    #[inline]
    pub fn genes(&self) -> &[QuestionId] {
        &self.genes
    }

    /// Fitness in (0, 1]; higher is better.
    #[inline]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Realized aggregates of the selection.
    pub fn stats(&self, ctx: &AssemblyContext<'_>) -> AggregateStats {
        ctx.stats(&self.genes)
    }

    /// Single-point crossover producing two children.
    ///
    /// Segments after a uniform pivot in `1..question_count` are swapped.
    /// Duplicates in a child are replaced by random unused pool ids.
    pub fn mate(
        &self,
        other: &Chromosome,
        ctx: &AssemblyContext<'_>,
        rng: &mut AssemblyRng,
    ) -> (Chromosome, Chromosome) {
        let k = self.genes.len();
        if k < 2 {
            return (self.clone(), other.clone());
        }

        let pivot = rng.pivot(k);
        let mut first: Vec<QuestionId> = self.genes[..pivot]
            .iter()
            .chain(&other.genes[pivot..])
            .copied()
            .collect();
        let mut second: Vec<QuestionId> = other.genes[..pivot]
            .iter()
            .chain(&self.genes[pivot..])
            .copied()
            .collect();

        repair(&mut first, ctx, rng);
        repair(&mut second, ctx, rng);

        (
            Self::from_valid_genes(first, ctx),
            Self::from_valid_genes(second, ctx),
        )
    }

    /// Replace one uniformly chosen gene with a uniformly chosen unused pool id.
    pub fn mutate(
        &self,
        ctx: &AssemblyContext<'_>,
        rng: &mut AssemblyRng,
    ) -> Result<Chromosome, AssemblyError> {
        let present: HashSet<QuestionId> = self.genes.iter().copied().collect();
        let unused: Vec<QuestionId> = ctx.pool().ids().filter(|id| !present.contains(id)).collect();
        if unused.is_empty() || self.genes.is_empty() {
            return Err(AssemblyError::Exhaustion {
                question_count: self.genes.len(),
            });
        }

        let position = rng.index(self.genes.len());
        let mut genes = self.genes.clone();
        genes[position] = unused[rng.index(unused.len())];

        Ok(Self::from_valid_genes(genes, ctx))
    }
}

/// Keep the first occurrence of each id; refill later duplicates from unused pool ids.
fn repair(genes: &mut [QuestionId], ctx: &AssemblyContext<'_>, rng: &mut AssemblyRng) {
    let mut seen = HashSet::with_capacity(genes.len());
    let duplicates: Vec<usize> = genes
        .iter()
        .enumerate()
        .filter(|&(_, &id)| !seen.insert(id))
        .map(|(i, _)| i)
        .collect();

    if duplicates.is_empty() {
        return;
    }

    let mut unused: Vec<QuestionId> = ctx.pool().ids().filter(|id| !seen.contains(id)).collect();
    for position in duplicates {
        // Pool holds at least question_count ids, so one is always left.
        let pick = rng.index(unused.len());
        genes[position] = unused.swap_remove(pick);
    }
}
