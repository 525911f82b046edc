//! Error types for the TSP heuristics.
//!
//! Every failure a solver can report is a variant of [`TspError`]. None of
//! them are fatal: the caller reports the condition and may retry with a
//! different graph or different parameters.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type TspResult<T> = Result<T, TspError>;

#[derive(Debug, Error)]
pub enum TspError {
    /// Graph query on a directed edge that does not exist.
    #[error("edge {from} -> {to} not found")]
    EdgeNotFound { from: usize, to: usize },

    /// Node id outside the dense range `0..node_count`.
    #[error("node {node} does not exist (graph has {node_count} nodes)")]
    NodeNotFound { node: usize, node_count: usize },

    /// The edge needed to close the tour back to its start is missing.
    #[error("cycle is not found: no edge {from} -> {to} to close the tour")]
    NoCycleFound { from: usize, to: usize },

    /// No construction visited every node.
    #[error("no complete tour found")]
    NoCompleteTourFound,

    /// Out-of-range solver configuration.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Solver invoked on a graph without nodes.
    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl TspError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        TspError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
