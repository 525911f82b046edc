//! TSP Heuristics Library
//!
//! Heuristic solvers for the Traveling Salesman Problem on weighted directed graphs.
//!
//! # Features
//!
//! - Weighted directed graph with editor helpers (placed nodes, distance-weighted edges)
//! - Tour evaluation that ranks infeasible paths instead of rejecting them
//! - Multi-start Nearest Neighbor construction
//! - Simulated Annealing over random spanning trees
//! - Ant Colony Optimization with elitist pheromone reinforcement
//! - Benchmarking across seeds
//!
//! # Example
//!
//! ```no_run
//! use tsp_heuristics::graph::WeightedDigraph;
//! use tsp_heuristics::heuristics::{nearest_neighbor, ant_colony};
//!
//! let mut graph = WeightedDigraph::new();
//! for _ in 0..3 {
//!     graph.add_node();
//! }
//! graph.add_edge(0, 1, 4.0).unwrap();
//! graph.add_edge(1, 2, 3.0).unwrap();
//! graph.add_edge(2, 0, 5.0).unwrap();
//!
//! let result = nearest_neighbor(&graph).unwrap();
//! print!("{}", result);
//!
//! let (result, pheromone) = ant_colony(&graph, 1.0, 1.0, 10.0, 0.5, 42).unwrap();
//! println!("ACO length: {} over {} edges", result.total_length, pheromone.len());
//! ```

pub mod error;
pub mod graph;
pub mod tour;
pub mod heuristics;
pub mod benchmark;

pub use error::{TspError, TspResult};
pub use graph::WeightedDigraph;
pub use tour::{total_weight, SolverResult};
