//! Property-based tests for chromosome and population invariants.
//!
//! Covers gene distinctness, fitness bounds, single-gene mutation, and the
//! size, ordering and elitism guarantees of `Population::evolve` across
//! randomized pools, targets and seeds.

use std::collections::HashSet;

use proptest::prelude::*;

use quiz_assembler::compute::{AssemblyContext, AssemblyRng, Chromosome, Population};
use quiz_assembler::schema::{
    AggregateStats, CandidateQuestion, GeneticAlgorithmConfig, QuestionPool, TargetProfile,
    ZeroTargetPolicy,
};

// ── Strategies ────────────────────────────────────────────────────────

/// Generate one question's attributes: mark, difficulty, distinguishing, time.
fn arb_attributes() -> impl Strategy<Value = (u32, u32, u32, u32)> {
    (0_u32..10, 0_u32..=100, 0_u32..=100, 0_u32..600)
}

/// Generate a pool of 3-30 questions with ids 1..=n.
fn arb_pool() -> impl Strategy<Value = QuestionPool> {
    prop::collection::vec(arb_attributes(), 3..=30).prop_map(|attrs| {
        let questions = attrs
            .into_iter()
            .enumerate()
            .map(|(i, (mark, difficulty, distinguishing, time))| CandidateQuestion {
                id: i as u64 + 1,
                mark: mark as f64,
                difficulty: difficulty as f64 / 100.0,
                distinguishing_degree: distinguishing as f64 / 100.0,
                solution_time: time as f64,
                qtype: if mark % 2 == 0 { "multichoice" } else { "truefalse" }.to_string(),
                category_id: (time % 3) as u64,
            })
            .collect();
        QuestionPool::new(questions).unwrap()
    })
}

/// Generate a pool together with a valid question count.
fn arb_pool_and_count() -> impl Strategy<Value = (QuestionPool, usize)> {
    arb_pool().prop_flat_map(|pool| {
        let n = pool.len();
        (Just(pool), 1..=n)
    })
}

/// Generate a target profile for `k` questions.
fn target(k: usize, score: u32, difficulty: u32, distinguishing: u32, time: u32) -> TargetProfile {
    TargetProfile::new(
        k,
        score as f64,
        difficulty as f64 / 100.0,
        distinguishing as f64 / 100.0,
        time as f64,
    )
    .unwrap()
}

fn arb_target_values() -> impl Strategy<Value = (u32, u32, u32, u32)> {
    (0_u32..60, 0_u32..=100, 0_u32..=100, 0_u32..3000)
}

fn arb_genetic_config() -> impl Strategy<Value = GeneticAlgorithmConfig> {
    (1_usize..40, 0_u32..=10, 0_u32..=10, 0_u32..=10, 0_usize..4).prop_map(
        |(size, elitism, crossover, mutation, tournament)| GeneticAlgorithmConfig {
            population_size: size,
            elitism_rate: elitism as f64 / 10.0,
            crossover_rate: crossover as f64 / 10.0,
            mutation_rate: mutation as f64 / 10.0,
            tournament_size: tournament,
        },
    )
}

fn is_distinct_selection(genes: &[u64], pool: &QuestionPool, k: usize) -> bool {
    let set: HashSet<_> = genes.iter().collect();
    genes.len() == k && set.len() == k && genes.iter().all(|&id| pool.contains(id))
}

// ── Chromosome properties ─────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_chromosomes_are_valid(
        (pool, k) in arb_pool_and_count(),
        values in arb_target_values(),
        seed in any::<u64>(),
    ) {
        let target = target(k, values.0, values.1, values.2, values.3);
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(seed);

        let c = Chromosome::gen_random(&ctx, &mut rng);
        prop_assert!(is_distinct_selection(c.genes(), &pool, k));
        prop_assert!(c.fitness() > 0.0 && c.fitness() <= 1.0);
    }

    #[test]
    fn fitness_is_one_for_exact_profile(
        (pool, k) in arb_pool_and_count(),
        seed in any::<u64>(),
    ) {
        // Derive the target from a random selection's own aggregates.
        let placeholder = target(k, 1, 50, 50, 1);
        let ctx = AssemblyContext::new(&pool, &placeholder, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(seed);
        let genes = Chromosome::gen_random(&ctx, &mut rng).genes().to_vec();

        let stats = AggregateStats::from_genes(&genes, &pool);
        let exact = TargetProfile::new(
            k,
            stats.sum_score,
            stats.avg_difficulty,
            stats.avg_distinguishing_degree,
            stats.sum_time,
        )
        .unwrap();
        let ctx = AssemblyContext::new(&pool, &exact, ZeroTargetPolicy::default()).unwrap();

        let c = Chromosome::new(genes, &ctx).unwrap();
        prop_assert_eq!(c.fitness(), 1.0);
        prop_assert_eq!(ctx.nre(&c.stats(&ctx)), 0.0);
    }

    #[test]
    fn fitness_below_one_when_profile_differs(
        (pool, k) in arb_pool_and_count(),
        seed in any::<u64>(),
    ) {
        let placeholder = target(k, 1, 50, 50, 1);
        let ctx = AssemblyContext::new(&pool, &placeholder, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(seed);
        let c = Chromosome::gen_random(&ctx, &mut rng);

        let stats = c.stats(&ctx);
        let off_by_one = TargetProfile::new(
            k,
            stats.sum_score + 1.0,
            stats.avg_difficulty,
            stats.avg_distinguishing_degree,
            stats.sum_time,
        )
        .unwrap();
        let ctx = AssemblyContext::new(&pool, &off_by_one, ZeroTargetPolicy::default()).unwrap();
        prop_assert!(ctx.fitness(c.genes()) < 1.0);
    }

    #[test]
    fn mutation_changes_exactly_one_gene(
        (pool, k) in arb_pool_and_count(),
        values in arb_target_values(),
        seed in any::<u64>(),
    ) {
        prop_assume!(pool.len() > k);
        let target = target(k, values.0, values.1, values.2, values.3);
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(seed);

        let original = Chromosome::gen_random(&ctx, &mut rng);
        let mutated = original.mutate(&ctx, &mut rng).unwrap();

        let changed: Vec<usize> = (0..k)
            .filter(|&i| original.genes()[i] != mutated.genes()[i])
            .collect();
        prop_assert_eq!(changed.len(), 1);
        prop_assert!(!original.genes().contains(&mutated.genes()[changed[0]]));
        prop_assert!(is_distinct_selection(mutated.genes(), &pool, k));
        prop_assert_eq!(mutated.fitness(), ctx.fitness(mutated.genes()));
    }

    #[test]
    fn crossover_children_are_valid(
        (pool, k) in arb_pool_and_count(),
        values in arb_target_values(),
        seed in any::<u64>(),
    ) {
        let target = target(k, values.0, values.1, values.2, values.3);
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(seed);

        let a = Chromosome::gen_random(&ctx, &mut rng);
        let b = Chromosome::gen_random(&ctx, &mut rng);
        let (c1, c2) = a.mate(&b, &ctx, &mut rng);

        prop_assert!(is_distinct_selection(c1.genes(), &pool, k));
        prop_assert!(is_distinct_selection(c2.genes(), &pool, k));
        prop_assert_eq!(c1.genes()[0], a.genes()[0]);
        prop_assert_eq!(c2.genes()[0], b.genes()[0]);
    }
}

// ── Population properties ─────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn evolve_preserves_size_order_and_elite(
        (pool, k) in arb_pool_and_count(),
        values in arb_target_values(),
        config in arb_genetic_config(),
        seed in any::<u64>(),
    ) {
        let target = target(k, values.0, values.1, values.2, values.3);
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(seed);

        let mut population = Population::init(&ctx, &config, &mut rng).unwrap();
        for _ in 0..5 {
            let elite: Vec<Chromosome> = population.members()[..config.elite_count()].to_vec();
            population.evolve(&ctx, &mut rng);

            prop_assert_eq!(population.len(), config.population_size);
            prop_assert!(population
                .members()
                .windows(2)
                .all(|w| w[0].fitness() >= w[1].fitness()));
            for member in population.members() {
                prop_assert!(is_distinct_selection(member.genes(), &pool, k));
            }
            for e in &elite {
                prop_assert!(population.members().iter().any(|m| m.genes() == e.genes()));
            }
        }
    }

    #[test]
    fn tournament_never_beats_population_best(
        (pool, k) in arb_pool_and_count(),
        values in arb_target_values(),
        config in arb_genetic_config(),
        seed in any::<u64>(),
    ) {
        let target = target(k, values.0, values.1, values.2, values.3);
        let ctx = AssemblyContext::new(&pool, &target, ZeroTargetPolicy::default()).unwrap();
        let mut rng = AssemblyRng::new(seed);

        let population = Population::init(&ctx, &config, &mut rng).unwrap();
        let picked = population.tournament_selection(&mut rng);
        prop_assert!(picked.fitness() <= population.best().fitness());
        prop_assert!(population.members().iter().any(|m| m == picked));
    }
}
