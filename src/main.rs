//! Quiz assembler CLI - Select questions for a target profile from JSON files.

use std::path::PathBuf;
use std::time::Instant;

use quiz_assembler::{
    compute::assemble_with_restarts,
    schema::{
        AssemblyConfig, CandidateQuestion, Dimension, TargetProfile, load_config, load_pool,
        load_target,
    },
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example();
        return;
    }

    if args.len() < 3 {
        eprintln!("Usage: {} <pool.json> <target.json> [generations] [restarts]", args[0]);
        eprintln!();
        eprintln!("Select questions whose aggregates best match a target profile.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  pool.json    JSON array of candidate questions");
        eprintln!("  target.json  Target profile");
        eprintln!("  generations  Generation budget (default: from config, 200)");
        eprintln!("  restarts     Independent parallel runs (default: 1)");
        eprintln!();
        eprintln!("An optional <target>.config.json next to the target overrides defaults.");
        eprintln!("Example files are printed with the --example flag.");
        std::process::exit(1);
    }

    let pool_path = PathBuf::from(&args[1]);
    let target_path = PathBuf::from(&args[2]);

    let pool = load_pool(&pool_path).unwrap_or_else(|e| {
        eprintln!("Error loading pool: {}", e);
        std::process::exit(1);
    });

    let target = load_target(&target_path).unwrap_or_else(|e| {
        eprintln!("Error loading target: {}", e);
        std::process::exit(1);
    });

    // Load or create config
    let config_path = target_path.with_extension("config.json");
    let mut config = if config_path.exists() {
        load_config(&config_path).unwrap_or_else(|e| {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        })
    } else {
        AssemblyConfig::default()
    };

    let parse_or_exit = |index: usize, name: &str| {
        parse_count(args.get(index).map(String::as_str), name).unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        })
    };
    if let Some(generations) = parse_or_exit(3, "generations") {
        config.generations = generations;
    }
    let restarts = parse_or_exit(4, "restarts").unwrap_or(1);

    println!("Quiz Assembly");
    println!("=============");
    println!("Pool: {} questions", pool.len());
    println!("Questions to select: {}", target.question_count);
    println!(
        "Population: {}, generations: {}, restarts: {}",
        config.genetic.population_size, config.generations, restarts
    );
    println!();

    let start = Instant::now();
    let result = assemble_with_restarts(&pool, &target, &config, restarts).unwrap_or_else(|e| {
        eprintln!("Assembly failed: {}", e);
        std::process::exit(1);
    });
    let elapsed = start.elapsed();

    println!("Selected questions: {:?}", result.genes);
    println!("Fitness: {:.6}", result.fitness);
    println!();
    println!("{:<28} {:>12} {:>12} {:>10}", "Constraint", "Target", "Actual", "Error");
    for term in &result.errors {
        println!(
            "{:<28} {:>12.4} {:>12.4} {:>10.4}",
            term.name, term.target, term.actual, term.error
        );
    }
    for dimension in Dimension::ALL {
        if !target.enabled.is_enabled(dimension) {
            println!(
                "{:<28} {:>12} {:>12.4} {:>10}",
                format!("{dimension} (off)"),
                "-",
                result.stats.value(dimension),
                "-"
            );
        }
    }
    println!();
    println!("Types: {:?}", result.stats.type_counts);
    println!("Categories: {:?}", result.stats.category_counts);
    println!();
    println!(
        "Generations: {} ({:?}), evaluations: {}, seed: {}",
        result.run.generations, result.run.stop_reason, result.run.evaluations, result.run.seed
    );
    println!("Time: {:.2}s", elapsed.as_secs_f32());
}

/// Parse an optional positional count argument.
fn parse_count(value: Option<&str>, name: &str) -> Result<Option<usize>, String> {
    value
        .map(|s| {
            s.parse::<usize>()
                .map_err(|e| format!("Invalid {} '{}': {}", name, s, e))
        })
        .transpose()
}

fn print_example() {
    let pool: Vec<CandidateQuestion> = (1..=6u64)
        .map(|id| CandidateQuestion {
            id,
            mark: (id % 3 + 1) as f64,
            difficulty: id as f64 / 8.0,
            distinguishing_degree: 0.3 + (id % 4) as f64 / 10.0,
            solution_time: 30.0 * id as f64,
            qtype: if id % 2 == 0 { "truefalse" } else { "multichoice" }.to_string(),
            category_id: id % 2 + 1,
        })
        .collect();
    let target = TargetProfile {
        question_count: 3,
        sum_score: 6.0,
        avg_difficulty: 0.5,
        avg_distinguishing_degree: 0.45,
        sum_time: 360.0,
        enabled: Default::default(),
        type_counts: None,
        category_counts: None,
    };
    let config = AssemblyConfig::default();

    println!("Example pool (pool.json):");
    println!("{}", serde_json::to_string_pretty(&pool).unwrap_or_default());
    println!();
    println!("Example target (target.json):");
    println!("{}", serde_json::to_string_pretty(&target).unwrap_or_default());
    println!();
    println!("Example config (target.config.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap_or_default());
}
