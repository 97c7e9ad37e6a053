//! Fitness-sorted population with elitism, tournament selection and reproduction.

use std::collections::HashSet;

use crate::schema::{GeneticAlgorithmConfig, QuestionId};

use super::AssemblyError;
use super::chromosome::Chromosome;
use super::fitness::AssemblyContext;
use super::rng::AssemblyRng;

/// A fixed-size set of chromosomes, kept sorted by descending fitness.
#[derive(Debug, Clone)]
pub struct Population {
    members: Vec<Chromosome>,
    config: GeneticAlgorithmConfig,
}

impl Population {
    /// Create `population_size` random chromosomes.
    pub fn init(
        ctx: &AssemblyContext<'_>,
        config: &GeneticAlgorithmConfig,
        rng: &mut AssemblyRng,
    ) -> Result<Self, AssemblyError> {
        config.validate()?;

        let members = (0..config.population_size)
            .map(|_| Chromosome::gen_random(ctx, rng))
            .collect();

        let mut population = Self {
            members,
            config: config.clone(),
        };
        population.sort();
        Ok(population)
    }

    /// Members, best first.
    #[inline]
    pub fn members(&self) -> &[Chromosome] {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Fittest member.
    #[inline]
    pub fn best(&self) -> &Chromosome {
        &self.members[0]
    }

    /// Draw `tournament_size + 1` members with replacement; return the fittest.
    pub fn tournament_selection(&self, rng: &mut AssemblyRng) -> &Chromosome {
        let mut best_idx = rng.index(self.members.len());
        for _ in 0..self.config.tournament_size {
            let idx = rng.index(self.members.len());
            if self.members[idx].fitness() > self.members[best_idx].fitness() {
                best_idx = idx;
            }
        }
        &self.members[best_idx]
    }

    /// Replace the population with the next generation.
    ///
    /// The top `floor(size * elitism_rate)` members survive unchanged. The rest
    /// are offspring of tournament-selected parents from the current generation.
    ///
    /// Returns the number of fitness evaluations performed.
    pub fn evolve(&mut self, ctx: &AssemblyContext<'_>, rng: &mut AssemblyRng) -> usize {
        let size = self.config.population_size;
        // With pool size == question_count there is no unused id to mutate into.
        let can_mutate = ctx.pool().len() > ctx.question_count();

        let mut evaluations = 0;
        let mut next_gen = Vec::with_capacity(size);
        next_gen.extend(self.members.iter().take(self.config.elite_count()).cloned());

        while next_gen.len() < size {
            if rng.chance(self.config.crossover_rate) {
                let parent1 = self.tournament_selection(rng);
                let parent2 = self.tournament_selection(rng);
                let (child1, child2) = parent1.mate(parent2, ctx, rng);
                // Both children are scored by `mate`, even when only one fits.
                evaluations += if ctx.question_count() < 2 { 0 } else { 2 };

                let child1 = self.maybe_mutate(child1, ctx, rng, can_mutate, &mut evaluations);
                next_gen.push(child1);
                if next_gen.len() < size {
                    let child2 =
                        self.maybe_mutate(child2, ctx, rng, can_mutate, &mut evaluations);
                    next_gen.push(child2);
                }
            } else {
                let parent = self.tournament_selection(rng).clone();
                let child = self.maybe_mutate(parent, ctx, rng, can_mutate, &mut evaluations);
                next_gen.push(child);
            }
        }

        self.members = next_gen;
        self.sort();
        evaluations
    }

    fn maybe_mutate(
        &self,
        child: Chromosome,
        ctx: &AssemblyContext<'_>,
        rng: &mut AssemblyRng,
        can_mutate: bool,
        evaluations: &mut usize,
    ) -> Chromosome {
        if can_mutate && rng.chance(self.config.mutation_rate) {
            match child.mutate(ctx, rng) {
                Ok(mutated) => {
                    *evaluations += 1;
                    mutated
                }
                Err(_) => child,
            }
        } else {
            child
        }
    }

    /// Stable sort, best first.
    fn sort(&mut self) {
        self.members.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
    }

    /// Mean fitness.
    pub fn average_fitness(&self) -> f64 {
        self.members.iter().map(|c| c.fitness()).sum::<f64>() / self.members.len() as f64
    }

    /// Standard deviation of fitness.
    pub fn fitness_std(&self) -> f64 {
        let avg = self.average_fitness();
        let variance = self
            .members
            .iter()
            .map(|c| (c.fitness() - avg).powi(2))
            .sum::<f64>()
            / self.members.len() as f64;
        variance.sqrt()
    }

    /// Mean Jaccard distance between each member's gene set and the best one.
    pub fn diversity(&self) -> f64 {
        if self.members.len() < 2 {
            return 0.0;
        }

        let best: HashSet<QuestionId> = self.best().genes().iter().copied().collect();
        let total: f64 = self.members[1..]
            .iter()
            .map(|c| {
                let shared = c.genes().iter().filter(|id| best.contains(id)).count();
                let union = best.len() + c.genes().len() - shared;
                if union == 0 {
                    0.0
                } else {
                    1.0 - shared as f64 / union as f64
                }
            })
            .sum();

        total / (self.members.len() - 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        CandidateQuestion, ConfigError, QuestionPool, TargetProfile, ZeroTargetPolicy,
    };

    fn pool(n: u64) -> QuestionPool {
        QuestionPool::new(
            (1..=n)
                .map(|id| {
                    let difficulty = (id % 5) as f64 / 4.0;
                    CandidateQuestion::new(id, (id % 4 + 1) as f64, difficulty, 0.5, 60.0)
                        .unwrap()
                })
                .collect(),
        )
        .unwrap()
    }

    fn config(size: usize) -> GeneticAlgorithmConfig {
        GeneticAlgorithmConfig {
            population_size: size,
            elitism_rate: 0.2,
            crossover_rate: 0.8,
            mutation_rate: 0.3,
            tournament_size: 2,
        }
    }

    fn is_sorted(population: &Population) -> bool {
        population
            .members()
            .windows(2)
            .all(|w| w[0].fitness() >= w[1].fitness())
    }

    #[test]
    fn test_init_size_and_order() {
        let pool = pool(20);
        let target = TargetProfile::new(5, 12.0, 0.5, 0.5, 300.0).unwrap();
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(42);

        let population = Population::init(&ctx, &config(30), &mut rng).unwrap();
        assert_eq!(population.len(), 30);
        assert!(is_sorted(&population));
        assert_eq!(population.best(), &population.members()[0]);
    }

    #[test]
    fn test_init_rejects_empty_population() {
        let pool = pool(5);
        let target = TargetProfile::new(2, 4.0, 0.5, 0.5, 120.0).unwrap();
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(42);

        assert!(matches!(
            Population::init(&ctx, &config(0), &mut rng),
            Err(AssemblyError::Configuration(ConfigError::PopulationTooSmall))
        ));
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let pool = pool(20);
        let target = TargetProfile::new(5, 12.0, 0.5, 0.5, 300.0).unwrap();
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(7);

        let mut cfg = config(20);
        cfg.tournament_size = 500;
        let population = Population::init(&ctx, &cfg, &mut rng).unwrap();

        // 501 draws from 20 members almost surely include the best one.
        let picked = population.tournament_selection(&mut rng);
        assert_eq!(picked.fitness(), population.best().fitness());
    }

    #[test]
    fn test_evolve_keeps_size_order_and_elite() {
        let pool = pool(20);
        let target = TargetProfile::new(5, 12.0, 0.5, 0.5, 300.0).unwrap();
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(42);

        let cfg = config(25);
        let mut population = Population::init(&ctx, &cfg, &mut rng).unwrap();

        for _ in 0..10 {
            let elite: Vec<Chromosome> = population.members()[..cfg.elite_count()].to_vec();
            population.evolve(&ctx, &mut rng);

            assert_eq!(population.len(), 25);
            assert!(is_sorted(&population));
            for e in &elite {
                assert!(population.members().iter().any(|m| m.genes() == e.genes()));
            }
        }
    }

    #[test]
    fn test_init_rejects_invalid_rates() {
        let pool = pool(5);
        let target = TargetProfile::new(2, 4.0, 0.5, 0.5, 120.0).unwrap();
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(42);

        let mut cfg = config(4);
        cfg.crossover_rate = 1.5;
        assert!(matches!(
            Population::init(&ctx, &cfg, &mut rng),
            Err(AssemblyError::Configuration(ConfigError::InvalidRate {
                name: "crossover_rate",
                ..
            }))
        ));

        let mut cfg = config(4);
        cfg.mutation_rate = f64::NAN;
        assert!(Population::init(&ctx, &cfg, &mut rng).is_err());
    }

    #[test]
    fn test_evolve_counts_evaluations() {
        let pool = pool(20);
        let target = TargetProfile::new(5, 12.0, 0.5, 0.5, 300.0).unwrap();
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(9);

        let mut cfg = config(9);
        cfg.elitism_rate = 0.0;
        cfg.crossover_rate = 1.0;
        cfg.mutation_rate = 0.0;
        let mut population = Population::init(&ctx, &cfg, &mut rng).unwrap();
        // Five crossovers, the last second child evaluated but dropped.
        assert_eq!(population.evolve(&ctx, &mut rng), 10);

        cfg.mutation_rate = 1.0;
        let mut population = Population::init(&ctx, &cfg, &mut rng).unwrap();
        assert_eq!(population.evolve(&ctx, &mut rng), 10 + 9);

        cfg.crossover_rate = 0.0;
        cfg.mutation_rate = 0.0;
        let mut population = Population::init(&ctx, &cfg, &mut rng).unwrap();
        assert_eq!(population.evolve(&ctx, &mut rng), 0);
    }

    #[test]
    fn test_evolve_without_elitism() {
        let pool = pool(12);
        let target = TargetProfile::new(3, 6.0, 0.5, 0.5, 180.0).unwrap();
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(3);

        let mut cfg = config(11);
        cfg.elitism_rate = 0.0;
        cfg.crossover_rate = 0.5;
        let mut population = Population::init(&ctx, &cfg, &mut rng).unwrap();
        population.evolve(&ctx, &mut rng);
        assert_eq!(population.len(), 11);
    }

    #[test]
    fn test_evolve_with_pool_equal_to_question_count() {
        let pool = pool(4);
        let target = TargetProfile::new(4, 10.0, 0.5, 0.5, 240.0).unwrap();
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(42);

        let mut cfg = config(6);
        cfg.mutation_rate = 1.0;
        let mut population = Population::init(&ctx, &cfg, &mut rng).unwrap();
        population.evolve(&ctx, &mut rng);

        assert_eq!(population.len(), 6);
        for member in population.members() {
            let mut genes = member.genes().to_vec();
            genes.sort_unstable();
            assert_eq!(genes, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_statistics() {
        let pool = pool(20);
        let target = TargetProfile::new(5, 12.0, 0.5, 0.5, 300.0).unwrap();
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(42);

        let population = Population::init(&ctx, &config(10), &mut rng).unwrap();
        let avg = population.average_fitness();
        assert!(avg > 0.0 && avg <= population.best().fitness());
        assert!(population.fitness_std() >= 0.0);
        let diversity = population.diversity();
        assert!((0.0..=1.0).contains(&diversity));
    }
}
