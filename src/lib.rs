//! CVRP Solver Library
//!
//! Four metaheuristic engines for the Capacitated Vehicle Routing Problem,
//! sharing one instance and solution model.
//!
//! # Features
//!
//! - Genetic algorithm (route-level crossover with first-fit repacking)
//! - Ant colony optimization (pheromone-guided route construction)
//! - Tabu search (intra-route swap neighborhood, edge-based tabu list)
//! - Adaptive large neighborhood search (destroy/repair under
//!   simulated-annealing acceptance)
//! - Benchmarking tools with CSV export
//!
//! # Example
//!
//! ```no_run
//! use cvrp_compare::instance::CvrpInstance;
//! use cvrp_compare::heuristics::genetic::{GeneticConfig, GeneticSearch};
//!
//! // Load instance
//! let instance = CvrpInstance::from_file("cvrp_instance.txt").unwrap();
//!
//! // Run one engine with the default parameters
//! let mut search = GeneticSearch::new(instance.clone(), GeneticConfig::default());
//! let solution = search.run();
//!
//! println!("Total distance: {:.2}", solution.total_distance(&instance));
//! ```

pub mod benchmark;
pub mod heuristics;
pub mod instance;
pub mod matrix;
pub mod solution;

pub use instance::CvrpInstance;
pub use solution::Solution;
