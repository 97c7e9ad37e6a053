//! Aggregate scoring of a selection against the target profile.
//!
//! The Normalized Relative Error (NRE) sums `|target - actual| / target`
//! over the enabled dimensions, plus `|target - actual| / question_count`
//! for every requested type or category count. Fitness is `1 / (1 + NRE)`.
//!
//! A dimension whose relative error is within [`ZERO_TOLERANCE`] counts as an
//! exact match, so decimal attributes that agree up to rounding score 1.0.

use crate::schema::{
    AggregateStats, ConstraintError, Dimension, QuestionId, QuestionPool, TargetProfile,
    ZeroTargetPolicy,
};

use super::AssemblyError;

/// Values and relative errors at or below this magnitude count as zero.
pub const ZERO_TOLERANCE: f64 = 1e-9;

/// Name of a constraint term.
enum Term<'t> {
    Dimension(Dimension),
    Type(&'t str),
    Category(u64),
}

/// Read-only inputs of one assembly run: pool, target and scoring policy.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyContext<'a> {
    pool: &'a QuestionPool,
    target: &'a TargetProfile,
    zero_target: ZeroTargetPolicy,
}

impl<'a> AssemblyContext<'a> {
    /// Validate the inputs of a run and bind them together.
    pub fn new(
        pool: &'a QuestionPool,
        target: &'a TargetProfile,
        zero_target: ZeroTargetPolicy,
    ) -> Result<Self, AssemblyError> {
        target.validate()?;
        zero_target.validate()?;

        if pool.len() < target.question_count {
            return Err(AssemblyError::InsufficientCandidates {
                available: pool.len(),
                required: target.question_count,
            });
        }

        if zero_target == ZeroTargetPolicy::Reject
            && let Some(dimension) = Dimension::ALL.into_iter().find(|&d| {
                target.enabled.is_enabled(d) && target.value(d).abs() <= ZERO_TOLERANCE
            })
        {
            return Err(AssemblyError::ArithmeticPolicyViolation { dimension });
        }

        Ok(Self {
            pool,
            target,
            zero_target,
        })
    }

    #[inline]
    pub fn pool(&self) -> &'a QuestionPool {
        self.pool
    }

    #[inline]
    pub fn target(&self) -> &'a TargetProfile {
        self.target
    }

    /// Number of genes per chromosome.
    #[inline]
    pub fn question_count(&self) -> usize {
        self.target.question_count
    }

    /// Realized aggregates of a gene list.
    pub fn stats(&self, genes: &[QuestionId]) -> AggregateStats {
        AggregateStats::from_genes(genes, self.pool)
    }

    /// Fitness of a gene list, in (0, 1].
    pub fn fitness(&self, genes: &[QuestionId]) -> f64 {
        1.0 / (1.0 + self.nre(&self.stats(genes)))
    }

    /// Normalized Relative Error of realized aggregates.
    pub fn nre(&self, stats: &AggregateStats) -> f64 {
        let mut total = 0.0;
        self.visit_terms(stats, |_, _, _, error| total += error);
        total
    }

    /// Per-constraint error terms, in scoring order.
    pub fn breakdown(&self, stats: &AggregateStats) -> Vec<ConstraintError> {
        let mut terms = Vec::new();
        self.visit_terms(stats, |term, target, actual, error| {
            let name = match term {
                Term::Dimension(d) => d.to_string(),
                Term::Type(t) => format!("type:{t}"),
                Term::Category(c) => format!("category:{c}"),
            };
            terms.push(ConstraintError {
                name,
                target,
                actual,
                error,
            });
        });
        terms
    }

    fn visit_terms<F>(&self, stats: &AggregateStats, mut visit: F)
    where
        F: FnMut(Term<'_>, f64, f64, f64),
    {
        for dimension in Dimension::ALL {
            if !self.target.enabled.is_enabled(dimension) {
                continue;
            }
            let target = self.target.value(dimension);
            let actual = stats.value(dimension);
            visit(
                Term::Dimension(dimension),
                target,
                actual,
                self.relative_error(target, actual),
            );
        }

        let k = self.target.question_count.max(1) as f64;

        if let Some(counts) = &self.target.type_counts {
            for (qtype, &wanted) in counts {
                let actual = stats.type_counts.get(qtype).copied().unwrap_or(0) as f64;
                let target = wanted as f64;
                visit(Term::Type(qtype), target, actual, (target - actual).abs() / k);
            }
        }

        if let Some(counts) = &self.target.category_counts {
            for (&category, &wanted) in counts {
                let actual = stats.category_counts.get(&category).copied().unwrap_or(0) as f64;
                let target = wanted as f64;
                visit(
                    Term::Category(category),
                    target,
                    actual,
                    (target - actual).abs() / k,
                );
            }
        }
    }

    /// Relative error of one dimension, with the zero-target policy applied.
    fn relative_error(&self, target: f64, actual: f64) -> f64 {
        if target.abs() > ZERO_TOLERANCE {
            let error = (target - actual).abs() / target;
            if error <= ZERO_TOLERANCE { 0.0 } else { error }
        } else if actual.abs() <= ZERO_TOLERANCE {
            0.0
        } else {
            self.zero_target.penalty()
        }
    }
}
