//! Tour evaluation and the result record shared by all solvers.
//!
//! A tour is an ordered sequence of node ids. A closed tour repeats its first
//! node at the end to denote the return edge.

use crate::error::{TspError, TspResult};
use crate::graph::WeightedDigraph;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Total weight of consecutive edges along `path`.
///
/// A missing edge contributes `+inf` instead of failing, so infeasible
/// candidates can still be ranked against each other.
pub fn total_weight(graph: &WeightedDigraph, path: &[usize]) -> f64 {
    path.windows(2)
        .map(|pair| graph.weight(pair[0], pair[1]).unwrap_or(f64::INFINITY))
        .sum()
}

/// True when `path` visits every node of `graph` exactly once
pub fn is_hamiltonian_path(graph: &WeightedDigraph, path: &[usize]) -> bool {
    if path.len() != graph.node_count() {
        return false;
    }
    let unique: HashSet<usize> = path.iter().copied().collect();
    unique.len() == path.len() && path.iter().all(|&v| v < graph.node_count())
}

/// Outcome of one solver invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverResult {
    /// Closed tour, first node repeated at the end
    pub tour: Vec<usize>,
    /// Total length; `inf` when the tour uses a missing edge
    pub total_length: f64,
    /// Every traversed edge as `(from, to, weight)`
    pub legs: Vec<(usize, usize, f64)>,
    /// Algorithm that produced this result
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations or generations (if applicable)
    pub iterations: Option<usize>,
}

impl SolverResult {
    /// Close `path` into a cycle by appending its first node.
    ///
    /// `path_length` is the already accumulated length of `path`; the weight
    /// of the closing edge is added to it. Fails with `NoCycleFound` when the
    /// closing edge does not exist.
    pub fn close(
        graph: &WeightedDigraph,
        mut path: Vec<usize>,
        path_length: f64,
        algorithm: &str,
    ) -> TspResult<Self> {
        let (first, last) = match (path.first(), path.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Err(TspError::NoCompleteTourFound),
        };

        let closing = graph
            .weight(last, first)
            .map_err(|_| TspError::NoCycleFound { from: last, to: first })?;
        path.push(first);

        let legs = path
            .windows(2)
            .map(|pair| {
                let w = graph.weight(pair[0], pair[1]).unwrap_or(f64::INFINITY);
                (pair[0], pair[1], w)
            })
            .collect();

        Ok(SolverResult {
            tour: path,
            total_length: path_length + closing,
            legs,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        })
    }

    /// Whether the tour visits every node once before returning to the start
    pub fn is_complete(&self, graph: &WeightedDigraph) -> bool {
        match self.tour.split_last() {
            Some((last, open)) => {
                open.first() == Some(last) && is_hamiltonian_path(graph, open)
            }
            None => false,
        }
    }

    /// Human-readable trace: the length line followed by one line per edge
    pub fn trace(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for SolverResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Length: {}", self.total_length)?;
        for &(from, to, w) in &self.legs {
            writeln!(f, "{} -> {} ({})", from, to, w)?;
        }
        Ok(())
    }
}
