//! Ant Colony Optimization with elitist reinforcement.
//!
//! Every generation sends one ant per node from a random start. Ants pick
//! the next node by roulette wheel over `tau^alpha * (1/w)^beta`. Complete
//! paths deposit pheromone on their edges, the first `elite_count` ants of
//! the generation deposit an extra `elite_factor` share, and finally every
//! edge evaporates once more.

use crate::error::{TspError, TspResult};
use crate::graph::WeightedDigraph;
use crate::heuristics::TourSolver;
use crate::tour::SolverResult;
use log::{debug, info, warn};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ACO configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntColonyConfig {
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Heuristic importance (beta)
    pub beta: f64,
    /// Pheromone deposit constant (Q); also sets the generation count
    pub deposit: f64,
    /// Evaporation rate in [0, 1]
    pub evaporation: f64,
    /// Ants per generation, by index, that receive the elite deposit
    pub elite_count: usize,
    /// Extra deposit multiplier for elite ants
    pub elite_factor: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for AntColonyConfig {
    fn default() -> Self {
        AntColonyConfig {
            alpha: 1.0,
            beta: 1.0,
            deposit: 100.0,
            evaporation: 0.5,
            elite_count: 1,
            elite_factor: 2.0,
            seed: 42,
        }
    }
}

impl AntColonyConfig {
    /// Number of generations: `floor(Q) * 5`
    pub fn generations(&self) -> usize {
        if self.deposit.is_finite() && self.deposit >= 1.0 {
            self.deposit.trunc() as usize * 5
        } else {
            0
        }
    }

    pub fn validate(&self) -> TspResult<()> {
        if !self.alpha.is_finite() {
            return Err(TspError::invalid("alpha", format!("must be finite, got {}", self.alpha)));
        }
        if !self.beta.is_finite() {
            return Err(TspError::invalid("beta", format!("must be finite, got {}", self.beta)));
        }
        if self.generations() == 0 {
            return Err(TspError::invalid(
                "deposit",
                format!("generation count floor(Q) * 5 must be positive, got Q = {}", self.deposit),
            ));
        }
        if !(0.0..=1.0).contains(&self.evaporation) {
            return Err(TspError::invalid(
                "evaporation",
                format!("must lie in [0, 1], got {}", self.evaporation),
            ));
        }
        if !(self.elite_factor.is_finite() && self.elite_factor >= 0.0) {
            return Err(TspError::invalid(
                "elite_factor",
                format!("must be non-negative, got {}", self.elite_factor),
            ));
        }
        Ok(())
    }
}

/// Pheromone level per directed edge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PheromoneMatrix {
    levels: BTreeMap<(usize, usize), f64>,
}

/// One row of a [`PheromoneMatrix`], used for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PheromoneEntry {
    pub from: usize,
    pub to: usize,
    pub level: f64,
}

impl PheromoneMatrix {
    /// Same `level` on every edge of `graph`
    pub fn uniform(graph: &WeightedDigraph, level: f64) -> Self {
        PheromoneMatrix {
            levels: graph
                .edges()
                .into_iter()
                .map(|(from, to, _)| ((from, to), level))
                .collect(),
        }
    }

    /// Level on `from -> to`; zero for unknown edges
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.levels.get(&(from, to)).copied().unwrap_or(0.0)
    }

    /// `(from, to, level)` sorted by edge
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.levels.iter().map(|(&(from, to), &level)| (from, to, level))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Lowest level on any edge, `None` when empty
    pub fn min_level(&self) -> Option<f64> {
        self.levels.values().copied().reduce(f64::min)
    }

    pub fn entries(&self) -> Vec<PheromoneEntry> {
        self.iter()
            .map(|(from, to, level)| PheromoneEntry { from, to, level })
            .collect()
    }

    /// Per-ant update along a complete path:
    /// `tau = (1 - rho) * tau + Q / length`, or only the decay when `length == 0`.
    pub(crate) fn deposit(&mut self, path: &[usize], length: f64, q: f64, evaporation: f64) {
        for pair in path.windows(2) {
            let level = self.levels.entry((pair[0], pair[1])).or_insert(0.0);
            *level = if length != 0.0 {
                (1.0 - evaporation) * *level + q / length
            } else {
                (1.0 - evaporation) * *level
            };
        }
    }

    /// Add `amount` to every edge of `path`
    pub(crate) fn reinforce(&mut self, path: &[usize], amount: f64) {
        for pair in path.windows(2) {
            *self.levels.entry((pair[0], pair[1])).or_insert(0.0) += amount;
        }
    }

    /// Multiply every level by `1 - evaporation`
    pub(crate) fn evaporate(&mut self, evaporation: f64) {
        for level in self.levels.values_mut() {
            *level *= 1.0 - evaporation;
        }
    }
}

impl std::fmt::Display for PheromoneMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (from, to, level) in self.iter() {
            writeln!(f, "{} -> {}: {:.6}", from, to, level)?;
        }
        Ok(())
    }
}

/// Ant Colony Optimization solver
pub struct AntColonyOptimization {
    pub config: AntColonyConfig,
}

/// Mutable state of one run
struct Colony<'a> {
    graph: &'a WeightedDigraph,
    config: &'a AntColonyConfig,
    pheromone: PheromoneMatrix,
    best_path: Vec<usize>,
    best_length: f64,
    rng: ChaCha8Rng,
}

impl<'a> Colony<'a> {
    fn new(graph: &'a WeightedDigraph, config: &'a AntColonyConfig) -> Self {
        Colony {
            graph,
            config,
            pheromone: PheromoneMatrix::uniform(graph, 1.0),
            best_path: Vec::new(),
            best_length: f64::INFINITY,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    /// Walk one ant from a random start. `None` when it gets stuck.
    fn construct_path(&mut self) -> Option<(Vec<usize>, f64)> {
        let n = self.graph.node_count();
        let start = self.rng.gen_range(0..n);
        let mut visited = vec![false; n];
        visited[start] = true;

        let mut path = vec![start];
        let mut length = 0.0;
        let mut current = start;

        while path.len() < n {
            let (next, w) = self.select_next_node(current, &visited)?;
            length += w;
            path.push(next);
            visited[next] = true;
            current = next;
        }

        Some((path, length))
    }

    /// Roulette-wheel choice among edges to unvisited nodes
    fn select_next_node(&mut self, current: usize, visited: &[bool]) -> Option<(usize, f64)> {
        let mut candidates: Vec<(usize, f64, f64)> = Vec::new();

        for (j, w) in self.graph.out_edges(current) {
            if visited[j] {
                continue;
            }
            let tau = self.pheromone.get(current, j).powf(self.config.alpha);
            let eta = if w > 0.0 { 1.0 / w } else { 1e6 };
            candidates.push((j, w, tau * eta.powf(self.config.beta)));
        }

        if candidates.is_empty() {
            return None;
        }

        let total: f64 = candidates.iter().map(|&(_, _, p)| p).sum();
        let pick = if total.is_finite() && total > 0.0 {
            self.rng.gen::<f64>() * total
        } else {
            0.0
        };

        let mut cumulative = 0.0;
        for &(j, w, prob) in &candidates {
            cumulative += prob;
            if cumulative >= pick {
                return Some((j, w));
            }
        }

        candidates.last().map(|&(j, w, _)| (j, w))
    }

    fn run_generation(&mut self) {
        let mut elites: Vec<(Vec<usize>, f64)> = Vec::new();

        for ant in 0..self.graph.node_count() {
            let (path, length) = match self.construct_path() {
                Some(found) => found,
                None => continue,
            };

            if length < self.best_length {
                self.best_length = length;
                self.best_path = path.clone();
            }

            if ant < self.config.elite_count {
                elites.push((path.clone(), length));
            }

            self.pheromone
                .deposit(&path, length, self.config.deposit, self.config.evaporation);
        }

        for (path, length) in &elites {
            if *length != 0.0 {
                let amount = self.config.elite_factor * self.config.deposit / length;
                self.pheromone.reinforce(path, amount);
            }
        }

        self.pheromone.evaporate(self.config.evaporation);
    }
}

impl AntColonyOptimization {
    pub fn new(config: AntColonyConfig) -> Self {
        AntColonyOptimization { config }
    }

    /// Run ACO and return the best closed tour with the final pheromones
    pub fn run(&self, graph: &WeightedDigraph) -> TspResult<(SolverResult, PheromoneMatrix)> {
        self.config.validate()?;
        if graph.is_empty() {
            return Err(TspError::EmptyGraph);
        }

        let start = std::time::Instant::now();
        let generations = self.config.generations();
        info!(
            "ACO: alpha={} beta={} Q={} rho={} generations={}",
            self.config.alpha, self.config.beta, self.config.deposit, self.config.evaporation, generations
        );

        let mut colony = Colony::new(graph, &self.config);
        for generation in 0..generations {
            colony.run_generation();
            debug!("ACO generation {}: best path length {}", generation, colony.best_length);
        }

        if colony.best_path.is_empty() {
            warn!("ACO: no ant completed a path through all nodes");
            return Err(TspError::NoCompleteTourFound);
        }

        let mut result =
            SolverResult::close(graph, colony.best_path, colony.best_length, self.name())?;
        result.computation_time = start.elapsed().as_secs_f64();
        result.iterations = Some(generations);
        info!("ACO: best tour length {}", result.total_length);

        Ok((result, colony.pheromone))
    }
}

impl Default for AntColonyOptimization {
    fn default() -> Self {
        AntColonyOptimization::new(AntColonyConfig::default())
    }
}

impl TourSolver for AntColonyOptimization {
    fn solve(&self, graph: &WeightedDigraph) -> TspResult<SolverResult> {
        self.run(graph).map(|(result, _)| result)
    }

    fn name(&self) -> &str {
        "AntColony"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tour::total_weight;

    fn create_square() -> WeightedDigraph {
        let mut graph = WeightedDigraph::with_nodes(4);
        for &(a, b, w) in &[
            (0, 1, 10.0),
            (1, 2, 10.0),
            (2, 3, 10.0),
            (3, 0, 10.0),
            (0, 2, 14.0),
            (1, 3, 14.0),
        ] {
            graph.add_edge(a, b, w).unwrap();
            graph.add_edge(b, a, w).unwrap();
        }
        graph
    }

    fn small_config(deposit: f64, evaporation: f64) -> AntColonyConfig {
        AntColonyConfig {
            deposit,
            evaporation,
            ..Default::default()
        }
    }

    #[test]
    fn test_generations() {
        assert_eq!(AntColonyConfig::default().generations(), 500);
        assert_eq!(small_config(2.7, 0.5).generations(), 10);
        assert_eq!(small_config(0.5, 0.5).generations(), 0);
    }

    #[test]
    fn test_aco_square() {
        let graph = create_square();
        let aco = AntColonyOptimization::new(small_config(10.0, 0.3));
        let (result, pheromone) = aco.run(&graph).unwrap();

        assert!(result.is_complete(&graph));
        assert_eq!(result.total_length, 40.0);
        assert_eq!(result.total_length, total_weight(&graph, &result.tour));
        assert_eq!(result.iterations, Some(50));
        assert_eq!(pheromone.len(), graph.edge_count());
    }

    #[test]
    fn test_pheromone_non_negative() {
        let graph = WeightedDigraph::random_layout(6, 0.7, 12);
        for evaporation in [0.0, 0.25, 0.5, 0.99] {
            let aco = AntColonyOptimization::new(small_config(4.0, evaporation));
            let colony_config = aco.config.clone();
            let mut colony = Colony::new(&graph, &colony_config);
            for _ in 0..colony_config.generations() {
                colony.run_generation();
                assert!(colony.pheromone.iter().all(|(_, _, level)| level >= 0.0));
            }
        }
    }

    #[test]
    fn test_single_one_way_edge() {
        let mut graph = WeightedDigraph::with_nodes(2);
        graph.add_edge(0, 1, 5.0).unwrap();
        let aco = AntColonyOptimization::new(small_config(2.0, 0.5));
        assert!(matches!(
            aco.run(&graph),
            Err(TspError::NoCycleFound { from: 1, to: 0 })
        ));
    }

    #[test]
    fn test_no_complete_path() {
        let mut graph = WeightedDigraph::with_nodes(3);
        graph.add_edge(0, 1, 1.0).unwrap();
        let aco = AntColonyOptimization::new(small_config(1.0, 0.5));
        assert!(matches!(aco.run(&graph), Err(TspError::NoCompleteTourFound)));
    }

    #[test]
    fn test_zero_weight_edges() {
        let mut graph = WeightedDigraph::with_nodes(3);
        for from in 0..3 {
            for to in 0..3 {
                if from != to {
                    graph.add_edge(from, to, 0.0).unwrap();
                }
            }
        }
        let aco = AntColonyOptimization::new(small_config(1.0, 0.5));
        let (result, pheromone) = aco.run(&graph).unwrap();
        assert_eq!(result.total_length, 0.0);
        assert!(pheromone.min_level().unwrap() >= 0.0);
    }

    #[test]
    fn test_pheromone_updates() {
        let mut graph = WeightedDigraph::with_nodes(3);
        graph.add_edge(0, 1, 2.0).unwrap();
        graph.add_edge(1, 2, 2.0).unwrap();
        graph.add_edge(2, 0, 2.0).unwrap();

        let mut pheromone = PheromoneMatrix::uniform(&graph, 1.0);
        pheromone.deposit(&[0, 1, 2], 4.0, 2.0, 0.5);
        assert_eq!(pheromone.get(0, 1), 1.0);
        assert_eq!(pheromone.get(1, 2), 1.0);
        assert_eq!(pheromone.get(2, 0), 1.0);

        pheromone.reinforce(&[0, 1, 2], 2.0 * 2.0 / 4.0);
        assert_eq!(pheromone.get(0, 1), 2.0);
        assert_eq!(pheromone.get(2, 0), 1.0);

        pheromone.evaporate(0.5);
        assert_eq!(pheromone.get(0, 1), 1.0);
        assert_eq!(pheromone.get(2, 0), 0.5);

        pheromone.deposit(&[2, 0], 0.0, 2.0, 0.5);
        assert_eq!(pheromone.get(2, 0), 0.25);
    }

    #[test]
    fn test_generation_update_order() {
        // On a one-way 3-cycle every ant's walk is forced by its start node.
        let mut graph = WeightedDigraph::with_nodes(3);
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            graph.add_edge(a, b, 1.0).unwrap();
        }
        let config = AntColonyConfig {
            deposit: 2.0,
            evaporation: 0.5,
            elite_count: 1,
            elite_factor: 2.0,
            seed: 5,
            ..Default::default()
        };
        let mut colony = Colony::new(&graph, &config);
        colony.run_generation();

        // Replay the random stream: one start draw and one roulette draw per step.
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let starts: Vec<usize> = (0..3)
            .map(|_| {
                let start = rng.gen_range(0..3);
                rng.gen::<f64>();
                rng.gen::<f64>();
                start
            })
            .collect();

        // Levels indexed by the edge's source node.
        let mut expected = [1.0_f64; 3];
        for &start in &starts {
            for from in [start, (start + 1) % 3] {
                expected[from] = 0.5 * expected[from] + 2.0 / 2.0;
            }
        }
        for from in [starts[0], (starts[0] + 1) % 3] {
            expected[from] += 2.0 * 2.0 / 2.0;
        }
        for level in expected.iter_mut() {
            *level *= 0.5;
        }

        for from in 0..3 {
            assert_eq!(colony.pheromone.get(from, (from + 1) % 3), expected[from]);
        }
        assert_eq!(colony.best_length, 2.0);
        assert_eq!(colony.best_path[0], starts[0]);
    }

    #[test]
    fn test_invalid_parameters() {
        let graph = create_square();
        let cases = [
            (small_config(0.5, 0.5), "deposit"),
            (small_config(10.0, 1.5), "evaporation"),
            (small_config(10.0, -0.1), "evaporation"),
        ];
        for (config, expected) in cases {
            match AntColonyOptimization::new(config).run(&graph) {
                Err(TspError::InvalidParameter { name, .. }) => assert_eq!(name, expected),
                other => panic!("expected InvalidParameter, got {:?}", other.map(|r| r.0)),
            }
        }
    }

    #[test]
    fn test_reproducible() {
        let graph = WeightedDigraph::random_layout(6, 1.0, 21);
        let aco = AntColonyOptimization::new(small_config(5.0, 0.4));
        let (a, pa) = aco.run(&graph).unwrap();
        let (b, pb) = aco.run(&graph).unwrap();
        assert_eq!(a.tour, b.tour);
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_pheromone_display() {
        let mut graph = WeightedDigraph::with_nodes(2);
        graph.add_edge(0, 1, 1.0).unwrap();
        let pheromone = PheromoneMatrix::uniform(&graph, 1.0);
        assert_eq!(pheromone.to_string(), "0 -> 1: 1.000000\n");
        assert_eq!(pheromone.entries().len(), 1);
    }
}
