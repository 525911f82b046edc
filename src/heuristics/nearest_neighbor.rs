use crate::error::{TspError, TspResult};
use crate::graph::WeightedDigraph;
use crate::heuristics::TourSolver;
use crate::tour::{total_weight, SolverResult};
use log::{debug, info, warn};

/// Multi-start Nearest Neighbor Heuristic
///
/// From every start node, repeatedly follows the cheapest outgoing edge to an
/// unvisited node. A construction counts only if it visits every node and an
/// edge leads from the last node back to the start. The shortest such cycle
/// over all start nodes wins; ties go to the lowest start node.
#[derive(Debug, Clone, Default)]
pub struct NearestNeighborHeuristic;

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic
    }

    /// Cheapest edge from `current` to an unvisited node.
    /// The first neighbor in ascending id order wins ties.
    fn find_nearest(graph: &WeightedDigraph, current: usize, visited: &[bool]) -> Option<usize> {
        let mut nearest = None;
        let mut min_distance = f64::INFINITY;

        for (neighbor, w) in graph.out_edges(current) {
            if !visited[neighbor] && w < min_distance {
                nearest = Some(neighbor);
                min_distance = w;
            }
        }

        nearest
    }

    /// Greedy path from `start`; stops early when stuck
    fn construct_from(graph: &WeightedDigraph, start: usize) -> Vec<usize> {
        let n = graph.node_count();
        let mut visited = vec![false; n];
        visited[start] = true;

        let mut path = vec![start];
        let mut current = start;

        while path.len() < n {
            match Self::find_nearest(graph, current, &visited) {
                Some(next) => {
                    path.push(next);
                    visited[next] = true;
                    current = next;
                }
                None => break,
            }
        }

        path
    }
}

impl TourSolver for NearestNeighborHeuristic {
    fn solve(&self, graph: &WeightedDigraph) -> TspResult<SolverResult> {
        let start = std::time::Instant::now();
        let n = graph.node_count();
        if n == 0 {
            return Err(TspError::EmptyGraph);
        }

        let mut best: Option<SolverResult> = None;

        for node in graph.nodes() {
            let path = Self::construct_from(graph, node);
            if path.len() < n {
                debug!("NN from {}: stuck after {} of {} nodes", node, path.len(), n);
                continue;
            }

            let length = total_weight(graph, &path);
            // Only a missing closing edge can make this fail.
            let candidate = match SolverResult::close(graph, path, length, self.name()) {
                Ok(candidate) => candidate,
                Err(_) => {
                    debug!("NN from {}: no edge back to start", node);
                    continue;
                }
            };

            if best
                .as_ref()
                .map_or(true, |b| candidate.total_length < b.total_length)
            {
                best = Some(candidate);
            }
        }

        match best {
            Some(mut result) => {
                result.computation_time = start.elapsed().as_secs_f64();
                result.iterations = Some(n);
                info!("NN: best tour length {}", result.total_length);
                Ok(result)
            }
            None => {
                warn!("NN: no start node produced a Hamiltonian cycle");
                Err(TspError::NoCompleteTourFound)
            }
        }
    }

    fn name(&self) -> &str {
        "NearestNeighbor"
    }
}
