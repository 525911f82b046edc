//! Benchmarking and comparison of the three heuristics.
//!
//! Runs every solver on the same graph over several seeds, collects one
//! record per run and aggregates them into per-algorithm statistics.

use crate::error::TspResult;
use crate::graph::WeightedDigraph;
use crate::heuristics::{
    AnnealingConfig, AntColonyConfig, AntColonyOptimization, NearestNeighborHeuristic,
    SimulatedAnnealing, TourSolver,
};
use crate::tour::SolverResult;

use log::{info, warn};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Seed used for this run
    pub seed: u64,
    /// Graph node count
    pub nodes: usize,
    /// Graph edge count
    pub edges: usize,
    /// Tour length (`inf` when no tour was produced)
    pub length: f64,
    /// Whether a closed tour was produced
    pub found: bool,
    /// Failure message, if any
    pub error: Option<String>,
    /// Computation time in seconds
    pub time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of runs
    pub num_runs: usize,
    /// Number of runs that produced a tour
    pub num_found: usize,
    /// Average length over successful runs
    pub avg_length: f64,
    /// Best length
    pub best_length: f64,
    /// Worst length
    pub worst_length: f64,
    /// Standard deviation of length
    pub std_length: f64,
    /// Average time
    pub avg_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Number of runs for the stochastic solvers
    pub num_runs: usize,
    /// Seed of the first run; run `i` uses `base_seed + i`, wrapping at `u64::MAX`
    pub base_seed: u64,
    /// Simulated annealing settings (seed is overridden per run)
    pub annealing: AnnealingConfig,
    /// Ant colony settings (seed is overridden per run)
    pub colony: AntColonyConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            base_seed: 42,
            annealing: AnnealingConfig::default(),
            colony: AntColonyConfig {
                deposit: 10.0,
                ..Default::default()
            },
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run every solver on `graph`. Nearest neighbor is deterministic and
    /// runs once; the other two run once per seed.
    pub fn compare(&mut self, graph: &WeightedDigraph) {
        info!(
            "Comparing heuristics on {} nodes / {} edges over {} runs",
            graph.node_count(),
            graph.edge_count(),
            self.config.num_runs
        );

        let nn = NearestNeighborHeuristic::new();
        self.record_result(graph, nn.name(), self.config.base_seed, nn.solve(graph));

        for run in 0..self.config.num_runs {
            let seed = self.config.base_seed.wrapping_add(run as u64);

            let sa = SimulatedAnnealing::new(AnnealingConfig {
                seed,
                ..self.config.annealing.clone()
            });
            self.record_result(graph, sa.name(), seed, sa.solve(graph));

            let aco = AntColonyOptimization::new(AntColonyConfig {
                seed,
                ..self.config.colony.clone()
            });
            self.record_result(graph, aco.name(), seed, aco.solve(graph));
        }
    }

    /// Record a result; failures are kept, not propagated
    fn record_result(
        &mut self,
        graph: &WeightedDigraph,
        algorithm: &str,
        seed: u64,
        outcome: TspResult<SolverResult>,
    ) {
        let mut result = AlgorithmResult {
            algorithm: algorithm.to_string(),
            seed,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            length: f64::INFINITY,
            found: false,
            error: None,
            time: 0.0,
            iterations: None,
        };

        match outcome {
            Ok(solution) => {
                result.length = solution.total_length;
                result.found = true;
                result.time = solution.computation_time;
                result.iterations = solution.iterations;
            }
            Err(e) => {
                warn!("{} (seed {}) failed: {}", algorithm, seed, e);
                result.error = Some(e.to_string());
            }
        }

        self.results.push(result);
    }

    /// Compute statistics for each algorithm, best average first
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut by_algorithm: BTreeMap<&str, Vec<&AlgorithmResult>> = BTreeMap::new();
        for result in &self.results {
            by_algorithm.entry(result.algorithm.as_str()).or_default().push(result);
        }

        let mut statistics = Vec::new();

        for (algorithm, results) in by_algorithm {
            let found: Vec<&AlgorithmResult> = results.iter().copied().filter(|r| r.found).collect();

            let lengths: Vec<f64> = found.iter().map(|r| r.length).collect();
            let times: Vec<f64> = results.iter().map(|r| r.time).collect();

            let (avg_length, best_length, worst_length, std_length) = if lengths.is_empty() {
                (f64::INFINITY, f64::INFINITY, f64::INFINITY, 0.0)
            } else {
                let avg = lengths.iter().sum::<f64>() / lengths.len() as f64;
                let best = lengths.iter().cloned().fold(f64::INFINITY, f64::min);
                let worst = lengths.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let variance =
                    lengths.iter().map(|l| (l - avg).powi(2)).sum::<f64>() / lengths.len() as f64;
                (avg, best, worst, variance.sqrt())
            };

            statistics.push(AlgorithmStatistics {
                algorithm: algorithm.to_string(),
                num_runs: results.len(),
                num_found: found.len(),
                avg_length,
                best_length,
                worst_length,
                std_length,
                avg_time: times.iter().sum::<f64>() / times.len() as f64,
            });
        }

        statistics.sort_by_key(|s| OrderedFloat(s.avg_length));
        statistics
    }

    /// Export raw results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> TspResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       TSP Heuristics Comparison\n");
        report.push_str("========================================\n\n");

        report.push_str("-".repeat(80).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<20} {:>8} {:>12} {:>12} {:>12} {:>10}\n",
            "Algorithm", "Found", "Avg Length", "Best", "Std Dev", "Avg Time"
        ));
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<20} {:>8} {:>12.2} {:>12.2} {:>12.2} {:>10.4}\n",
                stat.algorithm,
                format!("{}/{}", stat.num_found, stat.num_runs),
                stat.avg_length,
                stat.best_length,
                stat.std_length,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(80).as_str());
        report.push('\n');
        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> BenchmarkConfig {
        BenchmarkConfig {
            num_runs: 2,
            base_seed: 7,
            annealing: AnnealingConfig {
                iterations: 30,
                ..Default::default()
            },
            colony: AntColonyConfig {
                deposit: 2.0,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
        assert_eq!(config.colony.generations(), 50);
    }

    #[test]
    fn test_compare_records_every_run() {
        let graph = WeightedDigraph::random_layout(6, 1.0, 3);
        let mut benchmark = Benchmark::new(quick_config());
        benchmark.compare(&graph);

        assert_eq!(benchmark.results().len(), 1 + 2 * 2);
        assert!(benchmark.results().iter().all(|r| r.found));

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 3);
        let nn = stats.iter().find(|s| s.algorithm == "NearestNeighbor").unwrap();
        assert_eq!(nn.num_runs, 1);
        assert_eq!(nn.std_length, 0.0);
        assert!(benchmark.generate_report().contains("SimulatedAnnealing"));
    }

    #[test]
    fn test_seeds_wrap_at_max() {
        let graph = WeightedDigraph::random_layout(5, 1.0, 4);
        let mut benchmark = Benchmark::new(BenchmarkConfig {
            base_seed: u64::MAX,
            ..quick_config()
        });
        benchmark.compare(&graph);

        let seeds: Vec<u64> = benchmark
            .results()
            .iter()
            .filter(|r| r.algorithm == "SimulatedAnnealing")
            .map(|r| r.seed)
            .collect();
        assert_eq!(seeds, vec![u64::MAX, 0]);
        assert!(benchmark.results().iter().all(|r| r.found));
    }

    #[test]
    fn test_failures_are_recorded() {
        let mut graph = WeightedDigraph::with_nodes(2);
        graph.add_edge(0, 1, 1.0).unwrap();
        let mut benchmark = Benchmark::new(quick_config());
        benchmark.compare(&graph);

        assert!(benchmark.results().iter().all(|r| !r.found && r.error.is_some()));
        let stats = benchmark.compute_statistics();
        assert!(stats.iter().all(|s| s.num_found == 0 && s.best_length.is_infinite()));
    }
}
