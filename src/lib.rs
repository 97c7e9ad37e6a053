//! Quiz assembly - constraint-driven question selection.
//!
//! Given a pool of candidate questions, each annotated with a mark,
//! difficulty, distinguishing degree and expected solution time, this crate
//! selects a fixed number of distinct questions whose aggregate statistics
//! best match a target profile. The search is a genetic algorithm with
//! elitism, tournament selection, single-point crossover with repair, and
//! single-gene mutation.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Questions, target profiles, configuration and result types
//! - `compute`: Fitness, chromosomes, population and the evolution driver
//!
//! # Example
//!
//! ```rust,no_run
//! use quiz_assembler::{
//!     compute::EvolutionDriver,
//!     schema::{AssemblyConfig, CandidateQuestion, QuestionPool, TargetProfile},
//! };
//!
//! let pool = QuestionPool::new(vec![
//!     CandidateQuestion::new(1, 2.0, 0.4, 0.3, 60.0)?,
//!     CandidateQuestion::new(2, 1.0, 0.6, 0.5, 45.0)?,
//!     CandidateQuestion::new(3, 3.0, 0.8, 0.6, 120.0)?,
//! ])?;
//! let target = TargetProfile::new(2, 4.0, 0.6, 0.45, 165.0)?;
//!
//! let mut driver = EvolutionDriver::new(&pool, &target, AssemblyConfig::default())?;
//! let result = driver.run()?;
//!
//! println!("Selected {:?} with fitness {:.3}", result.genes, result.fitness);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{AssemblyError, EvolutionDriver, assemble, assemble_with_restarts};
pub use schema::{AssemblyConfig, AssemblyResult, CandidateQuestion, QuestionPool, TargetProfile};
