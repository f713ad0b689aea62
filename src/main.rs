//! CVRP Solver - Command Line Interface
//!
//! Runs four metaheuristic engines on Capacitated Vehicle Routing Problem
//! instances: genetic algorithm, ant colony optimization, tabu search, and
//! adaptive large neighborhood search.

use clap::{Parser, Subcommand, ValueEnum};
use cvrp_compare::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use cvrp_compare::heuristics::aco::{AntColonyConfig, AntColonySearch};
use cvrp_compare::heuristics::alns::{AlnsConfig, AlnsSearch};
use cvrp_compare::heuristics::genetic::{GeneticConfig, GeneticSearch};
use cvrp_compare::heuristics::tabu::{TabuConfig, TabuSearch};
use cvrp_compare::instance::CvrpInstance;
use cvrp_compare::solution::Solution;

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "cvrp-compare")]
#[command(version = "1.0")]
#[command(about = "Four metaheuristic engines for the Capacitated VRP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance with one engine (or all of them)
    Solve {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Engine to run
        #[arg(short, long, value_enum, default_value = "all")]
        engine: Engine,

        /// Random seed for the stochastic engines
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Write the best solution as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of seeded runs per stochastic engine
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Compare engines on an instance
    Compare {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of runs
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Engine {
    /// Genetic algorithm
    Genetic,
    /// Ant colony optimization
    Aco,
    /// Tabu search
    Tabu,
    /// Adaptive large neighborhood search
    Alns,
    /// Run every engine and keep the best solution
    All,
}

/// Payload written by `solve --output`
#[derive(Serialize)]
struct SolveReport {
    instance: String,
    engine: String,
    distance: f64,
    num_routes: usize,
    time: f64,
    routes: Vec<Vec<usize>>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            instance,
            engine,
            seed,
            output,
            verbose,
        } => {
            solve_instance(&instance, engine, seed, output, verbose);
        }

        Commands::Benchmark {
            dir,
            output,
            runs,
            max_size,
        } => {
            run_benchmark(&dir, &output, runs, max_size);
        }

        Commands::Analyze { instance } => {
            analyze_instance(&instance);
        }

        Commands::Compare {
            instance,
            runs,
            output,
        } => {
            compare_engines(&instance, runs, output);
        }
    }
}

fn solve_instance(
    path: &PathBuf,
    engine: Engine,
    seed: u64,
    output: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading instance from {:?}...", path);

    let instance = match CvrpInstance::from_file(path) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    };

    if verbose {
        println!("{}", instance.summary());
    }

    let engines = match engine {
        Engine::All => vec![Engine::Genetic, Engine::Aco, Engine::Tabu, Engine::Alns],
        e => vec![e],
    };
    let multiple = engines.len() > 1;

    let mut best: Option<(Engine, Solution, f64, f64)> = None;

    for e in engines {
        println!("\nSolving with {:?} engine...", e);
        let start = Instant::now();
        let solution = run_engine(&instance, e, seed);
        let elapsed = start.elapsed().as_secs_f64();

        let distance = solution.total_distance(&instance);
        let feasible = solution.is_feasible(&instance) && solution.is_complete(&instance);

        println!("========== {:?} Results ==========", e);
        print_routes(&instance, &solution, verbose);
        println!("Routes: {}", solution.num_routes());
        println!("Total distance: {:.2}", distance);
        println!("Feasible: {}", feasible);
        println!("Time: {:.4}s", elapsed);

        let improves = best.as_ref().map_or(true, |(_, _, d, _)| distance < *d);
        if improves {
            best = Some((e, solution, distance, elapsed));
        }
    }

    let (best_engine, best_solution, best_distance, best_time) =
        best.expect("at least one engine runs");

    if multiple {
        println!(
            "\nBest engine: {:?} with total distance {:.2}",
            best_engine, best_distance
        );
    }

    if let Some(out_path) = output {
        let report = SolveReport {
            instance: instance.name.clone(),
            engine: format!("{:?}", best_engine).to_lowercase(),
            distance: best_distance,
            num_routes: best_solution.num_routes(),
            time: best_time,
            routes: best_solution.routes.clone(),
        };
        let json = serde_json::to_string_pretty(&report).unwrap();
        std::fs::write(&out_path, json).expect("Failed to write output");
        println!("\nSolution saved to {:?}", out_path);
    }
}

fn run_engine(instance: &CvrpInstance, engine: Engine, seed: u64) -> Solution {
    match engine {
        Engine::Genetic => {
            let config = GeneticConfig {
                seed,
                ..Default::default()
            };
            let mut search = GeneticSearch::new(instance.clone(), config);
            search.run()
        }

        Engine::Aco => {
            let config = AntColonyConfig {
                seed,
                ..Default::default()
            };
            let mut search = AntColonySearch::new(instance.clone(), config);
            search.run()
        }

        Engine::Tabu => {
            let mut search = TabuSearch::new(instance.clone(), TabuConfig::default());
            search.run()
        }

        Engine::Alns => {
            let config = AlnsConfig {
                seed,
                ..Default::default()
            };
            let mut search = AlnsSearch::new(instance.clone(), config);
            search.run()
        }

        Engine::All => unreachable!("expanded to the concrete engines before dispatch"),
    }
}

fn print_routes(instance: &CvrpInstance, solution: &Solution, verbose: bool) {
    for (i, route) in solution.routes.iter().enumerate() {
        let stops: Vec<String> = route.iter().map(|n| n.to_string()).collect();
        if verbose {
            println!(
                "Route {}: {} (demand {:.1}/{:.1}, distance {:.2})",
                i + 1,
                stops.join(" -> "),
                instance.route_demand(route),
                instance.capacity,
                instance.route_distance(route)
            );
        } else {
            println!("Route {}: {}", i + 1, stops.join(" -> "));
        }
    }
}

fn run_benchmark(dir: &PathBuf, output: &PathBuf, runs: usize, max_size: Option<usize>) {
    println!("Loading instances from {:?}...", dir);

    let mut instances = load_instances_from_dir(dir);

    if let Some(max) = max_size {
        instances.retain(|i| i.num_clients <= max);
    }

    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return;
    }

    let config = BenchmarkConfig {
        num_runs: runs,
        output_dir: output.to_string_lossy().to_string(),
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);

    for (i, instance) in instances.iter().enumerate() {
        println!(
            "\n[{}/{}] Processing {} (n={})...",
            i + 1,
            instances.len(),
            instance.name,
            instance.num_clients
        );

        benchmark.run_engines(instance);
    }

    let report = benchmark.generate_report();
    println!("\n{}", report);

    benchmark
        .save_outputs()
        .expect("Failed to save benchmark outputs");
    println!("Results saved to {:?}", output);
}

fn analyze_instance(path: &PathBuf) {
    let instance = match CvrpInstance::from_file(path) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    };

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.summary());

    let fleet_capacity = instance.num_vehicles as f64 * instance.capacity;

    println!("\nFleet:");
    println!(
        "  Fleet capacity: {:.1} over {} vehicles",
        fleet_capacity, instance.num_vehicles
    );
    println!(
        "  Total demand: {:.1} ({:.1}% of fleet capacity)",
        instance.total_demand(),
        instance.total_demand() / fleet_capacity * 100.0
    );

    println!("\nQuick Solution Estimates:");

    let mut tabu = TabuSearch::new(instance.clone(), TabuConfig::default());
    let tabu_solution = tabu.run();
    println!(
        "  Tabu search: {:.2} over {} routes",
        tabu_solution.total_distance(&instance),
        tabu_solution.num_routes()
    );

    let mut alns = AlnsSearch::new(instance.clone(), AlnsConfig::default());
    let alns_solution = alns.run();
    println!(
        "  ALNS: {:.2} over {} routes",
        alns_solution.total_distance(&instance),
        alns_solution.num_routes()
    );
}

fn compare_engines(path: &PathBuf, runs: usize, output: Option<PathBuf>) {
    let instance = match CvrpInstance::from_file(path) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Comparing engines on {} ({} clients)...\n",
        instance.name, instance.num_clients
    );

    let engines: Vec<(&str, Box<dyn Fn(&CvrpInstance, u64) -> Solution>)> = vec![
        (
            "genetic",
            Box::new(|inst: &CvrpInstance, seed: u64| {
                let config = GeneticConfig {
                    seed,
                    ..Default::default()
                };
                let mut search = GeneticSearch::new(inst.clone(), config);
                search.run()
            }),
        ),
        (
            "aco",
            Box::new(|inst: &CvrpInstance, seed: u64| {
                let config = AntColonyConfig {
                    seed,
                    ..Default::default()
                };
                let mut search = AntColonySearch::new(inst.clone(), config);
                search.run()
            }),
        ),
        (
            "tabu",
            Box::new(|inst: &CvrpInstance, _seed: u64| {
                let mut search = TabuSearch::new(inst.clone(), TabuConfig::default());
                search.run()
            }),
        ),
        (
            "alns",
            Box::new(|inst: &CvrpInstance, seed: u64| {
                let config = AlnsConfig {
                    seed,
                    ..Default::default()
                };
                let mut search = AlnsSearch::new(inst.clone(), config);
                search.run()
            }),
        ),
    ];

    let mut results: Vec<(String, Vec<f64>, Vec<f64>)> = Vec::new();

    for (name, solver) in &engines {
        let mut distances = Vec::new();
        let mut times = Vec::new();

        print!("Testing {}... ", name);
        std::io::Write::flush(&mut std::io::stdout()).unwrap();

        for seed in 0..runs as u64 {
            let start = Instant::now();
            let solution = solver(&instance, seed);
            let elapsed = start.elapsed().as_secs_f64();

            if solution.is_feasible(&instance) && solution.is_complete(&instance) {
                distances.push(solution.total_distance(&instance));
                times.push(elapsed);
            }
        }

        if !distances.is_empty() {
            let avg = distances.iter().sum::<f64>() / distances.len() as f64;
            let best = distances.iter().cloned().fold(f64::INFINITY, f64::min);
            let avg_time = times.iter().sum::<f64>() / times.len() as f64;
            println!("avg={:.2}, best={:.2}, time={:.4}s", avg, best, avg_time);
        } else {
            println!("no feasible solutions");
        }

        results.push((name.to_string(), distances, times));
    }

    println!("\n========== Summary ==========");
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10}",
        "Engine", "Best", "Average", "Worst", "Avg Time"
    );
    println!("{}", "-".repeat(56));

    for (name, distances, times) in &results {
        if !distances.is_empty() {
            let best = distances.iter().cloned().fold(f64::INFINITY, f64::min);
            let avg = distances.iter().sum::<f64>() / distances.len() as f64;
            let worst = distances.iter().cloned().fold(0.0, f64::max);
            let avg_time = times.iter().sum::<f64>() / times.len() as f64;

            println!(
                "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.4}",
                name, best, avg, worst, avg_time
            );
        }
    }

    if let Some(out_path) = output {
        let mut csv = String::new();
        csv.push_str("engine,run,distance,time\n");

        for (name, distances, times) in &results {
            for (i, (distance, time)) in distances.iter().zip(times.iter()).enumerate() {
                csv.push_str(&format!("{},{},{:.2},{:.4}\n", name, i, distance, time));
            }
        }

        std::fs::write(&out_path, csv).expect("Failed to write CSV");
        println!("\nResults exported to {:?}", out_path);
    }
}
