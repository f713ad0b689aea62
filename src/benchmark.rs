//! Benchmarking and experimentation module for the CVRP solvers.
//!
//! Provides tools for running the four engines over one or more instances,
//! collecting per-run results, and aggregating statistics. All timing
//! happens here, around the engines' pure `run` calls.

use crate::heuristics::alns::{AlnsConfig, AlnsSearch};
use crate::heuristics::aco::{AntColonyConfig, AntColonySearch};
use crate::heuristics::genetic::{GeneticConfig, GeneticSearch};
use crate::heuristics::tabu::{TabuConfig, TabuSearch};
use crate::instance::CvrpInstance;
use crate::solution::Solution;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Result of one engine run on one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineResult {
    /// Engine name (seeded runs carry a `-run{seed}` suffix)
    pub engine: String,
    /// Instance name
    pub instance: String,
    /// Number of clients
    pub num_clients: usize,
    /// Vehicle capacity
    pub capacity: f64,
    /// Total distance of the returned solution
    pub distance: f64,
    /// Number of routes in the returned solution
    pub num_routes: usize,
    /// Whether the solution serves every client within capacity
    pub feasible: bool,
    /// Wall-clock time in seconds
    pub time: f64,
    /// Seed used (None for the deterministic tabu engine)
    pub seed: Option<u64>,
}

/// Aggregated statistics for one engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatistics {
    /// Engine name
    pub engine: String,
    /// Number of recorded runs
    pub num_runs: usize,
    /// Number of feasible results
    pub num_feasible: usize,
    /// Average distance
    pub avg_distance: f64,
    /// Best distance
    pub best_distance: f64,
    /// Worst distance
    pub worst_distance: f64,
    /// Standard deviation of distance
    pub std_distance: f64,
    /// Average time
    pub avg_time: f64,
    /// Total time
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeded runs per stochastic engine
    pub num_runs: usize,
    /// Save CSV results
    pub save_results: bool,
    /// Output directory for CSV files
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            save_results: true,
            output_dir: "results".to_string(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<EngineResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run all four engines on an instance. The stochastic engines get one
    /// run per seed in `0..num_runs`; tabu search has no randomness and
    /// runs once.
    pub fn run_engines(&mut self, instance: &CvrpInstance) {
        for seed in 0..self.config.num_runs as u64 {
            let config = GeneticConfig {
                seed,
                ..Default::default()
            };
            let mut search = GeneticSearch::new(instance.clone(), config);
            let start = Instant::now();
            let solution = search.run();
            let time = start.elapsed().as_secs_f64();
            self.record_result(&format!("genetic-run{seed}"), instance, &solution, time, Some(seed));
        }

        for seed in 0..self.config.num_runs as u64 {
            let config = AntColonyConfig {
                seed,
                ..Default::default()
            };
            let mut search = AntColonySearch::new(instance.clone(), config);
            let start = Instant::now();
            let solution = search.run();
            let time = start.elapsed().as_secs_f64();
            self.record_result(&format!("aco-run{seed}"), instance, &solution, time, Some(seed));
        }

        for seed in 0..self.config.num_runs as u64 {
            let config = AlnsConfig {
                seed,
                ..Default::default()
            };
            let mut search = AlnsSearch::new(instance.clone(), config);
            let start = Instant::now();
            let solution = search.run();
            let time = start.elapsed().as_secs_f64();
            self.record_result(&format!("alns-run{seed}"), instance, &solution, time, Some(seed));
        }

        let mut search = TabuSearch::new(instance.clone(), TabuConfig::default());
        let start = Instant::now();
        let solution = search.run();
        let time = start.elapsed().as_secs_f64();
        self.record_result("tabu", instance, &solution, time, None);
    }

    /// Run the full engine suite on every instance
    pub fn run_on_instances(&mut self, instances: &[CvrpInstance]) {
        for instance in instances {
            log::info!(
                "benchmarking instance {} ({} clients)",
                instance.name,
                instance.num_clients
            );
            self.run_engines(instance);
        }
    }

    fn record_result(
        &mut self,
        engine: &str,
        instance: &CvrpInstance,
        solution: &Solution,
        time: f64,
        seed: Option<u64>,
    ) {
        self.results.push(EngineResult {
            engine: engine.to_string(),
            instance: instance.name.clone(),
            num_clients: instance.num_clients,
            capacity: instance.capacity,
            distance: solution.total_distance(instance),
            num_routes: solution.num_routes(),
            feasible: solution.is_feasible(instance) && solution.is_complete(instance),
            time,
            seed,
        });
    }

    /// Compute per-engine statistics over the recorded results
    pub fn compute_statistics(&self) -> Vec<EngineStatistics> {
        let mut stats_map: HashMap<String, Vec<&EngineResult>> = HashMap::new();

        for result in &self.results {
            stats_map
                .entry(result.engine.clone())
                .or_insert_with(Vec::new)
                .push(result);
        }

        let mut statistics = Vec::new();

        for (engine, results) in stats_map {
            let feasible_results: Vec<_> = results.iter().filter(|r| r.feasible).collect();

            if feasible_results.is_empty() {
                continue;
            }

            let distances: Vec<f64> = feasible_results.iter().map(|r| r.distance).collect();
            let times: Vec<f64> = feasible_results.iter().map(|r| r.time).collect();

            let avg_distance = distances.iter().sum::<f64>() / distances.len() as f64;
            let best_distance = distances.iter().cloned().fold(f64::INFINITY, f64::min);
            let worst_distance = distances.iter().cloned().fold(0.0, f64::max);

            let variance = distances
                .iter()
                .map(|d| (d - avg_distance).powi(2))
                .sum::<f64>()
                / distances.len() as f64;
            let std_distance = variance.sqrt();

            let avg_time = times.iter().sum::<f64>() / times.len() as f64;
            let total_time = times.iter().sum::<f64>();

            statistics.push(EngineStatistics {
                engine,
                num_runs: results.len(),
                num_feasible: feasible_results.len(),
                avg_distance,
                best_distance,
                worst_distance,
                std_distance,
                avg_time,
                total_time,
            });
        }

        statistics.sort_by(|a, b| a.avg_distance.partial_cmp(&b.avg_distance).unwrap());

        statistics
    }

    /// Export raw results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export aggregated statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        let stats = self.compute_statistics();
        for stat in stats {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write results.csv, statistics.csv, and report.txt into the
    /// configured output directory (no-op when saving is disabled)
    pub fn save_outputs(&self) -> std::io::Result<()> {
        if !self.config.save_results {
            return Ok(());
        }
        let dir = Path::new(&self.config.output_dir);
        std::fs::create_dir_all(dir)?;
        self.export_to_csv(dir.join("results.csv"))?;
        self.export_statistics_csv(dir.join("statistics.csv"))?;
        std::fs::write(dir.join("report.txt"), self.generate_report())?;
        Ok(())
    }

    /// Generate a plain-text summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("        CVRP Benchmark Report\n");
        report.push_str("========================================\n\n");

        let stats = self.compute_statistics();

        report.push_str("Engine Performance Summary:\n");
        report.push_str("-".repeat(86).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<16} {:>10} {:>12} {:>12} {:>12} {:>10} {:>10}\n",
            "Engine", "Feasible", "Avg Dist", "Best Dist", "Worst Dist", "Std", "Avg Time"
        ));
        report.push_str("-".repeat(86).as_str());
        report.push('\n');

        for stat in &stats {
            report.push_str(&format!(
                "{:<16} {:>10} {:>12.2} {:>12.2} {:>12.2} {:>10.2} {:>10.4}\n",
                stat.engine,
                format!("{}/{}", stat.num_feasible, stat.num_runs),
                stat.avg_distance,
                stat.best_distance,
                stat.worst_distance,
                stat.std_distance,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(86).as_str());
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");

        let mut instance_best: HashMap<String, (&EngineResult, f64)> = HashMap::new();

        for result in &self.results {
            if !result.feasible {
                continue;
            }

            let entry = instance_best
                .entry(result.instance.clone())
                .or_insert((result, result.distance));

            if result.distance < entry.1 {
                *entry = (result, result.distance);
            }
        }

        let mut instances: Vec<_> = instance_best.iter().collect();
        instances.sort_by(|a, b| a.0.cmp(b.0));

        for (instance, (best_result, _)) in instances {
            report.push_str(&format!(
                "  {}: {:.2} over {} routes ({})\n",
                instance, best_result.distance, best_result.num_routes, best_result.engine
            ));
        }

        report
    }

    /// Get all recorded results
    pub fn results(&self) -> &[EngineResult] {
        &self.results
    }
}

/// Load every `.txt` instance under a directory, skipping files that fail
/// to parse
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<CvrpInstance> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "txt").unwrap_or(false) {
                match CvrpInstance::from_file(&path) {
                    Ok(instance) => instances.push(instance),
                    Err(e) => log::warn!("skipping {}: {}", path.display(), e),
                }
            }
        }
    }

    // Sort by size so reports read smallest-first
    instances.sort_by_key(|i| i.num_clients);

    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SquareMatrix;

    fn create_test_instance() -> CvrpInstance {
        let mut distances = SquareMatrix::zeros(3);
        for &(i, j, d) in &[(0usize, 1usize, 2.0), (0, 2, 3.0), (1, 2, 4.0)] {
            distances.set(i, j, d);
            distances.set(j, i, d);
        }
        CvrpInstance::new("tiny", 2, 2, 10.0, vec![5.0, 5.0], distances).unwrap()
    }

    #[test]
    fn test_benchmark_config_defaults() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
        assert!(config.save_results);
    }

    #[test]
    fn test_run_engines_records_all_engines() {
        let instance = create_test_instance();
        let config = BenchmarkConfig {
            num_runs: 1,
            ..Default::default()
        };
        let mut benchmark = Benchmark::new(config);
        benchmark.run_engines(&instance);

        // three stochastic engines plus one tabu run
        assert_eq!(benchmark.results().len(), 4);
        assert!(benchmark.results().iter().all(|r| r.feasible));
        assert!(benchmark
            .results()
            .iter()
            .any(|r| r.engine == "tabu" && r.seed.is_none()));
    }

    #[test]
    fn test_statistics_mean_and_std() {
        let instance = create_test_instance();
        let mut benchmark = Benchmark::new(BenchmarkConfig::default());
        for (engine, distance) in [("x", 4.0), ("x", 6.0)] {
            benchmark.results.push(EngineResult {
                engine: engine.to_string(),
                instance: instance.name.clone(),
                num_clients: instance.num_clients,
                capacity: instance.capacity,
                distance,
                num_routes: 1,
                feasible: true,
                time: 0.5,
                seed: None,
            });
        }

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 1);
        assert!((stats[0].avg_distance - 5.0).abs() < 1e-10);
        assert!((stats[0].std_distance - 1.0).abs() < 1e-10);
        assert!((stats[0].total_time - 1.0).abs() < 1e-10);
        assert_eq!(stats[0].num_feasible, 2);
    }

    #[test]
    fn test_report_lists_best_per_instance() {
        let instance = create_test_instance();
        let config = BenchmarkConfig {
            num_runs: 1,
            ..Default::default()
        };
        let mut benchmark = Benchmark::new(config);
        benchmark.run_engines(&instance);

        let report = benchmark.generate_report();
        assert!(report.contains("CVRP Benchmark Report"));
        assert!(report.contains("tiny"));
        assert!(report.contains("tabu"));
    }
}
