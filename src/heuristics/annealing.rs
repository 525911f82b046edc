//! Simulated Annealing over random spanning trees.
//!
//! Candidate solutions are node enumeration orders of random spanning trees
//! of the graph. They are not guaranteed to follow existing edges; missing
//! edges cost `+inf` through [`total_weight`], which ranks them last.

use crate::error::{TspError, TspResult};
use crate::graph::WeightedDigraph;
use crate::heuristics::TourSolver;
use crate::tour::{total_weight, SolverResult};
use log::{debug, info};
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Simulated annealing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealingConfig {
    /// Initial temperature (T0 > 0)
    pub initial_temperature: f64,
    /// Geometric cooling factor in (0, 1)
    pub cooling_rate: f64,
    /// Number of iterations; zero only evaluates the seed tree
    pub iterations: usize,
    /// Spanning trees sampled per neighbor before giving up
    pub neighbor_attempts: usize,
    /// A sampled tree is usable only if its cost is below this ceiling
    pub cost_ceiling: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        AnnealingConfig {
            initial_temperature: 1000.0,
            cooling_rate: 0.9,
            iterations: 100,
            neighbor_attempts: 30,
            cost_ceiling: 1e9,
            seed: 42,
        }
    }
}

impl AnnealingConfig {
    pub fn validate(&self) -> TspResult<()> {
        if !(self.initial_temperature.is_finite() && self.initial_temperature > 0.0) {
            return Err(TspError::invalid(
                "initial_temperature",
                format!("must be positive and finite, got {}", self.initial_temperature),
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(TspError::invalid(
                "cooling_rate",
                format!("must lie in (0, 1), got {}", self.cooling_rate),
            ));
        }
        if self.neighbor_attempts == 0 {
            return Err(TspError::invalid("neighbor_attempts", "must be at least 1"));
        }
        Ok(())
    }
}

/// History entry: (cost, random tie-break, candidate order)
type HistoryEntry = Reverse<(OrderedFloat<f64>, OrderedFloat<f64>, Option<Vec<usize>>)>;

/// Simulated Annealing with a min-cost history of every generated neighbor
pub struct SimulatedAnnealing {
    pub config: AnnealingConfig,
}

impl SimulatedAnnealing {
    pub fn new(config: AnnealingConfig) -> Self {
        SimulatedAnnealing { config }
    }

    pub fn with_params(initial_temperature: f64, cooling_rate: f64, iterations: usize) -> Self {
        SimulatedAnnealing {
            config: AnnealingConfig {
                initial_temperature,
                cooling_rate,
                iterations,
                ..Default::default()
            },
        }
    }

    /// Sample spanning trees until one costs less than the ceiling.
    /// Returns `(None, inf)` when every attempt fails.
    fn generate_neighbor(
        &self,
        graph: &WeightedDigraph,
        rng: &mut ChaCha8Rng,
    ) -> (Option<Vec<usize>>, f64) {
        for _ in 0..self.config.neighbor_attempts {
            let order = graph.random_spanning_tree(rng);
            let cost = total_weight(graph, &order);
            if cost < self.config.cost_ceiling {
                return (Some(order), cost);
            }
        }
        (None, f64::INFINITY)
    }
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        SimulatedAnnealing::new(AnnealingConfig::default())
    }
}

/// Search state carried from one temperature step to the next
struct AnnealingState {
    current_tour: Option<Vec<usize>>,
    current_cost: f64,
    best_tour: Vec<usize>,
    best_cost: f64,
    history: BinaryHeap<HistoryEntry>,
}

impl AnnealingState {
    fn new(seed_order: Vec<usize>, cost: f64) -> Self {
        AnnealingState {
            current_tour: Some(seed_order.clone()),
            current_cost: cost,
            best_tour: seed_order,
            best_cost: cost,
            history: BinaryHeap::new(),
        }
    }

    /// Apply one temperature step with an already sampled neighbor
    fn step<R: Rng + ?Sized>(
        &mut self,
        iteration: usize,
        neighbor: Option<Vec<usize>>,
        neighbor_cost: f64,
        temperature: f64,
        rng: &mut R,
    ) {
        self.history.push(Reverse((
            OrderedFloat(neighbor_cost),
            OrderedFloat(rng.gen::<f64>()),
            neighbor.clone(),
        )));

        if neighbor_cost < self.current_cost {
            self.current_tour = neighbor;
            self.current_cost = neighbor_cost;
            if self.current_cost < self.best_cost {
                if let Some(tour) = &self.current_tour {
                    self.best_tour = tour.clone();
                    self.best_cost = self.current_cost;
                    debug!("SA iteration {}: new best {}", iteration, self.best_cost);
                }
            }
        }

        // The Metropolis test compares current and neighbor, but the
        // replacement is the cheapest entry in the history.
        let acceptance = (-(self.current_cost - neighbor_cost) / temperature).exp();
        if rng.gen::<f64>() < acceptance {
            if let Some(Reverse((cost, _, tour))) = self.history.pop() {
                self.current_cost = cost.into_inner();
                self.current_tour = tour;
                debug!(
                    "SA iteration {}: restored {:?} at cost {}",
                    iteration, self.current_tour, self.current_cost
                );
            }
        }
    }
}

impl TourSolver for SimulatedAnnealing {
    fn solve(&self, graph: &WeightedDigraph) -> TspResult<SolverResult> {
        self.config.validate()?;
        if graph.is_empty() {
            return Err(TspError::EmptyGraph);
        }

        let start = std::time::Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let seed_order = graph.random_spanning_tree(&mut rng);
        let seed_cost = total_weight(graph, &seed_order);
        let mut state = AnnealingState::new(seed_order, seed_cost);

        let mut temperature = self.config.initial_temperature;
        info!(
            "SA: T0={} rate={} iterations={} seed cost={}",
            temperature, self.config.cooling_rate, self.config.iterations, seed_cost
        );

        for iteration in 0..self.config.iterations {
            let (neighbor, neighbor_cost) = self.generate_neighbor(graph, &mut rng);
            state.step(iteration, neighbor, neighbor_cost, temperature, &mut rng);
            debug!(
                "SA iteration {}: T={:.6} current={} best={}",
                iteration, temperature, state.current_cost, state.best_cost
            );
            temperature *= self.config.cooling_rate;
        }

        let mut result =
            SolverResult::close(graph, state.best_tour, state.best_cost, self.name())?;
        result.computation_time = start.elapsed().as_secs_f64();
        result.iterations = Some(self.config.iterations);
        info!("SA: best tour length {}", result.total_length);
        Ok(result)
    }

    fn name(&self) -> &str {
        "SimulatedAnnealing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_iterations_evaluates_seed_tree() {
        let graph = WeightedDigraph::random_layout(6, 1.0, 9);
        let sa = SimulatedAnnealing::new(AnnealingConfig {
            iterations: 0,
            seed: 17,
            ..Default::default()
        });
        let result = sa.solve(&graph).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut expected = graph.random_spanning_tree(&mut rng);
        let first = expected[0];
        let last = expected[expected.len() - 1];
        let length = total_weight(&graph, &expected) + graph.weight(last, first).unwrap();
        expected.push(first);

        assert_eq!(result.tour, expected);
        assert_eq!(result.total_length, length);
    }

    #[test]
    fn test_single_one_way_edge() {
        let mut graph = WeightedDigraph::with_nodes(2);
        graph.add_edge(0, 1, 5.0).unwrap();
        for iterations in [0, 10] {
            let sa = SimulatedAnnealing::with_params(100.0, 0.9, iterations);
            assert!(matches!(
                sa.solve(&graph),
                Err(TspError::NoCycleFound { from: 1, to: 0 })
            ));
        }
    }

    #[test]
    fn test_complete_graph_tour() {
        let graph = WeightedDigraph::random_layout(8, 1.0, 4);
        let sa = SimulatedAnnealing::with_params(500.0, 0.95, 200);
        let result = sa.solve(&graph).unwrap();
        assert!(result.is_complete(&graph));
        assert_eq!(result.total_length, total_weight(&graph, &result.tour));
        assert_eq!(result.iterations, Some(200));
    }

    #[test]
    fn test_reproducible() {
        let graph = WeightedDigraph::random_layout(7, 0.8, 2);
        let config = AnnealingConfig {
            iterations: 150,
            seed: 99,
            ..Default::default()
        };
        let a = SimulatedAnnealing::new(config.clone()).solve(&graph);
        let b = SimulatedAnnealing::new(config).solve(&graph);
        match (a, b) {
            (Ok(a), Ok(b)) => {
                assert_eq!(a.tour, b.tour);
                assert_eq!(a.total_length, b.total_length);
            }
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            _ => panic!("same seed produced different outcomes"),
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let graph = WeightedDigraph::random_layout(4, 1.0, 1);
        for rate in [0.0, 1.0, 1.5, -0.2] {
            let sa = SimulatedAnnealing::with_params(100.0, rate, 10);
            assert!(matches!(
                sa.solve(&graph),
                Err(TspError::InvalidParameter { name: "cooling_rate", .. })
            ));
        }
        let sa = SimulatedAnnealing::with_params(0.0, 0.5, 10);
        assert!(matches!(
            sa.solve(&graph),
            Err(TspError::InvalidParameter { name: "initial_temperature", .. })
        ));
    }

    #[test]
    fn test_unusable_neighbors() {
        // A ceiling below every tree cost makes every neighbor unusable;
        // the seed tree stays the best tour.
        let graph = WeightedDigraph::random_layout(5, 1.0, 8);
        let sa = SimulatedAnnealing::new(AnnealingConfig {
            iterations: 20,
            cost_ceiling: 0.0,
            seed: 3,
            ..Default::default()
        });
        let seeded = SimulatedAnnealing::new(AnnealingConfig {
            iterations: 0,
            seed: 3,
            ..Default::default()
        });
        let result = sa.solve(&graph).unwrap();
        let expected = seeded.solve(&graph).unwrap();
        assert_eq!(result.tour, expected.tour);
        assert_eq!(result.total_length, expected.total_length);
    }

    #[test]
    fn test_accepted_step_restores_cheapest_history_entry() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut state = AnnealingState::new(vec![0, 1, 2], 10.0);
        state
            .history
            .push(Reverse((OrderedFloat(3.0), OrderedFloat(0.5), Some(vec![2, 0, 1]))));

        // A worse neighbor makes the acceptance ratio exceed 1.
        state.step(0, Some(vec![1, 2, 0]), 20.0, 1.0, &mut rng);

        assert_eq!(state.current_tour, Some(vec![2, 0, 1]));
        assert_eq!(state.current_cost, 3.0);
        assert_eq!(state.best_tour, vec![0, 1, 2]);
        assert_eq!(state.best_cost, 10.0);
        // The neighbor stays queued for a later restore.
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history.peek().map(|Reverse((c, _, _))| c.into_inner()), Some(20.0));
    }

    #[test]
    fn test_cheaper_step_updates_best() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut state = AnnealingState::new(vec![0, 1, 2], 10.0);

        state.step(0, Some(vec![1, 2, 0]), 6.0, 1.0, &mut rng);

        assert_eq!(state.best_tour, vec![1, 2, 0]);
        assert_eq!(state.best_cost, 6.0);
        // Equal costs always accept, popping the neighbor back out.
        assert_eq!(state.current_tour, Some(vec![1, 2, 0]));
        assert!(state.history.is_empty());
    }
}
