//! Evolution driver: runs the genetic algorithm over a generation budget.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::schema::{
    AssemblyConfig, AssemblyResult, ConfigError, EvolutionHistory, EvolutionProgress,
    QuestionPool, RunStats, StopReason, TargetProfile,
};

use super::AssemblyError;
use super::chromosome::Chromosome;
use super::fitness::AssemblyContext;
use super::population::Population;
use super::rng::AssemblyRng;

/// Runs one assembly: builds a population and evolves it until a stop criterion.
pub struct EvolutionDriver<'a> {
    ctx: AssemblyContext<'a>,
    config: AssemblyConfig,
    seed: u64,
    rng: AssemblyRng,
    history: EvolutionHistory,
    generation: usize,
    best: Option<Chromosome>,
    stagnation_count: usize,
    evaluations: u64,
    cancelled: Arc<AtomicBool>,
}

impl<'a> EvolutionDriver<'a> {
    /// Validate inputs and prepare a run.
    ///
    /// Every error is raised here, before any generation is evolved.
    pub fn new(
        pool: &'a QuestionPool,
        target: &'a TargetProfile,
        config: AssemblyConfig,
    ) -> Result<Self, AssemblyError> {
        config.validate()?;
        let ctx = AssemblyContext::new(pool, target, config.zero_target)?;

        let seed = config.random_seed.unwrap_or_else(rand::random);

        Ok(Self {
            ctx,
            config,
            seed,
            rng: AssemblyRng::new(seed),
            history: EvolutionHistory::default(),
            generation: 0,
            best: None,
            stagnation_count: 0,
            evaluations: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Seed driving this run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Inputs of this run.
    pub fn context(&self) -> &AssemblyContext<'a> {
        &self.ctx
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> Result<AssemblyResult, AssemblyError> {
        self.run_with_callback(|_| {})
    }

    /// Run evolution, reporting progress after initialization and every generation.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<AssemblyResult, AssemblyError>
    where
        F: FnMut(&EvolutionProgress),
    {
        let start_time = Instant::now();
        let deadline = self
            .config
            .stop
            .time_limit_ms
            .map(|ms| start_time + Duration::from_millis(ms));

        self.generation = 0;
        self.best = None;
        self.stagnation_count = 0;
        self.history = EvolutionHistory::default();

        log::info!(
            "Assembling {} of {} questions (population {}, up to {} generations, seed {})",
            self.ctx.question_count(),
            self.ctx.pool().len(),
            self.config.genetic.population_size,
            self.config.generations,
            self.seed
        );
        if self.ctx.pool().len() == self.ctx.question_count() {
            log::warn!("Pool holds exactly the requested question count; mutation is disabled");
        }

        let mut population = Population::init(&self.ctx, &self.config.genetic, &mut self.rng)?;
        self.evaluations = population.len() as u64;
        self.record(&population);
        callback(&self.progress(&population));

        let stop_reason = loop {
            if let Some(reason) = self.should_stop(deadline) {
                break reason;
            }

            self.evaluations += population.evolve(&self.ctx, &mut self.rng) as u64;
            self.generation += 1;
            self.record(&population);

            log::debug!(
                "Generation {}: best={:.6} avg={:.6} diversity={:.3}",
                self.generation,
                population.best().fitness(),
                population.average_fitness(),
                population.diversity()
            );

            callback(&self.progress(&population));
        };

        let elapsed = start_time.elapsed().as_secs_f64();

        // Population::init never yields an empty population, so `best` is set.
        let best = match self.best.clone() {
            Some(best) => best,
            None => population.best().clone(),
        };
        let stats = best.stats(&self.ctx);
        let errors = self.ctx.breakdown(&stats);

        log::info!(
            "Assembly stopped after {} generations ({:?}): fitness {:.6}",
            self.generation,
            stop_reason,
            best.fitness()
        );

        Ok(AssemblyResult {
            genes: best.genes().to_vec(),
            fitness: best.fitness(),
            stats,
            errors,
            run: RunStats {
                generations: self.generation,
                evaluations: self.evaluations,
                seed: self.seed,
                elapsed_seconds: elapsed,
                stop_reason,
            },
            history: self.history.clone(),
        })
    }

    /// Track the best chromosome so far and append to the history.
    fn record(&mut self, population: &Population) {
        let gen_best = population.best();
        match &self.best {
            Some(best) if gen_best.fitness() <= best.fitness() => {
                self.stagnation_count += 1;
            }
            _ => {
                self.best = Some(gen_best.clone());
                self.stagnation_count = 0;
            }
        }

        self.history.best_fitness.push(gen_best.fitness());
        self.history.avg_fitness.push(population.average_fitness());
        self.history.fitness_std.push(population.fitness_std());
        self.history.diversity.push(population.diversity());
    }

    fn best_fitness(&self) -> f64 {
        self.best.as_ref().map_or(0.0, |c| c.fitness())
    }

    /// Get current progress.
    fn progress(&self, population: &Population) -> EvolutionProgress {
        EvolutionProgress {
            generation: self.generation,
            total_generations: self.config.generations,
            best_fitness: self.best_fitness(),
            avg_fitness: population.average_fitness(),
            stagnation_count: self.stagnation_count,
            best_genes: self
                .best
                .as_ref()
                .map(|c| c.genes().to_vec())
                .unwrap_or_default(),
        }
    }

    /// Check if evolution should stop. Evaluated between generations only.
    fn should_stop(&self, deadline: Option<Instant>) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if self.generation >= self.config.generations {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(target) = self.config.stop.target_fitness
            && self.best_fitness() >= target
        {
            return Some(StopReason::TargetReached);
        }

        if let Some(limit) = self.config.stop.stagnation_limit
            && self.stagnation_count >= limit
        {
            return Some(StopReason::Stagnation);
        }

        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            return Some(StopReason::TimeLimit);
        }

        None
    }
}

/// Run a single assembly.
pub fn assemble(
    pool: &QuestionPool,
    target: &TargetProfile,
    config: &AssemblyConfig,
) -> Result<AssemblyResult, AssemblyError> {
    EvolutionDriver::new(pool, target, config.clone())?.run()
}

/// Run `restarts` independent assemblies in parallel and keep the best.
///
/// Run `i` is seeded with `base_seed + i`; ties go to the lowest run index.
pub fn assemble_with_restarts(
    pool: &QuestionPool,
    target: &TargetProfile,
    config: &AssemblyConfig,
    restarts: usize,
) -> Result<AssemblyResult, AssemblyError> {
    if restarts == 0 {
        return Err(ConfigError::NoRestarts.into());
    }
    config.validate()?;

    let base_seed = config.random_seed.unwrap_or_else(rand::random);

    let results = (0..restarts)
        .into_par_iter()
        .map(|i| {
            let run_config = AssemblyConfig {
                random_seed: Some(base_seed.wrapping_add(i as u64)),
                ..config.clone()
            };
            assemble(pool, target, &run_config)
        })
        .collect::<Result<Vec<_>, _>>()?;

    results
        .into_iter()
        .reduce(|best, candidate| {
            if candidate.fitness > best.fitness {
                candidate
            } else {
                best
            }
        })
        .ok_or_else(|| ConfigError::NoRestarts.into())
}
