//! Heuristics module for the TSP.
//!
//! This module exports the three tour heuristics and the convenience entry
//! points used by presentation layers.

pub mod nearest_neighbor;
pub mod annealing;
pub mod aco;

pub use nearest_neighbor::*;
pub use annealing::*;
pub use aco::*;

use crate::error::TspResult;
use crate::graph::WeightedDigraph;
use crate::tour::SolverResult;

/// A heuristic that turns a graph into a closed tour.
///
/// Solvers only read the graph; each call starts from a fresh random stream
/// seeded from its configuration.
pub trait TourSolver {
    fn solve(&self, graph: &WeightedDigraph) -> TspResult<SolverResult>;
    fn name(&self) -> &str;
}

/// Best nearest-neighbor cycle over all start nodes
pub fn nearest_neighbor(graph: &WeightedDigraph) -> TspResult<SolverResult> {
    NearestNeighborHeuristic::new().solve(graph)
}

/// Simulated annealing with the default neighbor sampling settings
pub fn simulated_annealing(
    graph: &WeightedDigraph,
    initial_temperature: f64,
    cooling_rate: f64,
    iterations: usize,
    seed: u64,
) -> TspResult<SolverResult> {
    let config = AnnealingConfig {
        initial_temperature,
        cooling_rate,
        iterations,
        seed,
        ..Default::default()
    };
    SimulatedAnnealing::new(config).solve(graph)
}

/// Ant colony optimization with one elite ant and an elite factor of 2
pub fn ant_colony(
    graph: &WeightedDigraph,
    alpha: f64,
    beta: f64,
    deposit: f64,
    evaporation: f64,
    seed: u64,
) -> TspResult<(SolverResult, PheromoneMatrix)> {
    let defaults = AntColonyConfig::default();
    ant_colony_with_elites(
        graph,
        alpha,
        beta,
        deposit,
        evaporation,
        defaults.elite_count,
        defaults.elite_factor,
        seed,
    )
}

/// Ant colony optimization with explicit elite settings
#[allow(clippy::too_many_arguments)]
pub fn ant_colony_with_elites(
    graph: &WeightedDigraph,
    alpha: f64,
    beta: f64,
    deposit: f64,
    evaporation: f64,
    elite_count: usize,
    elite_factor: f64,
    seed: u64,
) -> TspResult<(SolverResult, PheromoneMatrix)> {
    let config = AntColonyConfig {
        alpha,
        beta,
        deposit,
        evaporation,
        elite_count,
        elite_factor,
        seed,
    };
    AntColonyOptimization::new(config).run(graph)
}
