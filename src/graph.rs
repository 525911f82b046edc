//! Weighted directed graph shared by every solver.
//!
//! Nodes are dense integers `0..N-1` assigned in creation order. Edges are
//! directed and carry a non-negative weight; `a -> b` and `b -> a` are
//! independent and may have different weights. Nodes created through the
//! editor path also remember their canvas coordinates so edge weights can be
//! derived from the distance between them.

use crate::error::{TspError, TspResult};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

/// Width of the editor canvas used by [`WeightedDigraph::random_layout`].
pub const CANVAS_WIDTH: f64 = 600.0;
/// Height of the editor canvas used by [`WeightedDigraph::random_layout`].
pub const CANVAS_HEIGHT: f64 = 385.0;

/// Canvas coordinates of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Directed graph with weighted edges stored as per-node adjacency maps.
///
/// Only built through [`add_node`](Self::add_node) and the edge methods, so
/// every stored target is below `node_count()`.
#[derive(Debug, Clone, Default)]
pub struct WeightedDigraph {
    /// Optional canvas position per node
    positions: Vec<Option<Position>>,
    /// Outgoing edges per node, keyed by target
    adjacency: Vec<BTreeMap<usize, f64>>,
}

impl WeightedDigraph {
    /// Create an empty graph
    pub fn new() -> Self {
        WeightedDigraph::default()
    }

    /// Create a graph with `n` nodes and no edges
    pub fn with_nodes(n: usize) -> Self {
        let mut graph = WeightedDigraph::new();
        for _ in 0..n {
            graph.add_node();
        }
        graph
    }

    /// Add a node and return its id
    pub fn add_node(&mut self) -> usize {
        self.positions.push(None);
        self.adjacency.push(BTreeMap::new());
        self.adjacency.len() - 1
    }

    /// Add a node placed at canvas coordinates `(x, y)`
    pub fn add_node_at(&mut self, x: f64, y: f64) -> usize {
        let id = self.add_node();
        self.positions[id] = Some(Position::new(x, y));
        id
    }

    /// Add the edge `from -> to`, overwriting its weight if it already exists
    pub fn add_edge(&mut self, from: usize, to: usize, weight: f64) -> TspResult<()> {
        self.check_node(from)?;
        self.check_node(to)?;
        self.adjacency[from].insert(to, weight);
        Ok(())
    }

    /// Connect two placed nodes with an edge weighted by their truncated
    /// Euclidean distance.
    ///
    /// Returns `Ok(None)` without adding anything when both nodes sit on the
    /// same point.
    pub fn connect(&mut self, from: usize, to: usize) -> TspResult<Option<f64>> {
        let (a, b) = match (self.position(from)?, self.position(to)?) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(TspError::invalid(
                    "position",
                    format!("nodes {} and {} must both be placed to connect them", from, to),
                ))
            }
        };

        Ok(self.link(from, to, &a, &b))
    }

    /// Insert `from -> to` weighted by the truncated distance between `a`
    /// and `b`. Both ids must already be valid.
    fn link(&mut self, from: usize, to: usize, a: &Position, b: &Position) -> Option<f64> {
        let length = a.distance(b);
        if length == 0.0 {
            return None;
        }

        let weight = length.trunc();
        self.adjacency[from].insert(to, weight);
        Some(weight)
    }

    /// Override the weight of an existing edge
    pub fn set_weight(&mut self, from: usize, to: usize, weight: f64) -> TspResult<()> {
        self.check_node(from)?;
        match self.adjacency[from].get_mut(&to) {
            Some(w) => {
                *w = weight;
                Ok(())
            }
            None => Err(TspError::EdgeNotFound { from, to }),
        }
    }

    /// Weight of `from -> to`
    pub fn weight(&self, from: usize, to: usize) -> TspResult<f64> {
        self.adjacency
            .get(from)
            .and_then(|targets| targets.get(&to))
            .copied()
            .ok_or(TspError::EdgeNotFound { from, to })
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.adjacency
            .get(from)
            .map_or(false, |targets| targets.contains_key(&to))
    }

    /// Targets of the outgoing edges of `node`, in ascending id order
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        self.out_edges(node).map(|(to, _)| to).collect()
    }

    /// Outgoing `(target, weight)` pairs of `node`, in ascending target order
    pub fn out_edges(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adjacency
            .get(node)
            .into_iter()
            .flat_map(|targets| targets.iter().map(|(&to, &w)| (to, w)))
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn nodes(&self) -> Range<usize> {
        0..self.node_count()
    }

    /// All edges as `(from, to, weight)`, sorted by `(from, to)`
    pub fn edges(&self) -> Vec<(usize, usize, f64)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(from, targets)| targets.iter().map(move |(&to, &w)| (from, to, w)))
            .collect()
    }

    /// Canvas position of `node`, if it was placed
    pub fn position(&self, node: usize) -> TspResult<Option<Position>> {
        self.check_node(node)?;
        Ok(self.positions[node])
    }

    /// Remove every node and edge
    pub fn clear(&mut self) {
        self.positions.clear();
        self.adjacency.clear();
    }

    fn check_node(&self, node: usize) -> TspResult<()> {
        if node < self.node_count() {
            Ok(())
        } else {
            Err(TspError::NodeNotFound {
                node,
                node_count: self.node_count(),
            })
        }
    }

    /// Sample a random spanning tree and return its node enumeration order.
    ///
    /// Edges are treated as undirected (each unordered pair once) and
    /// processed in shuffled order with union-find (randomized Kruskal).
    /// A node is enumerated when the first accepted edge touching it is
    /// added, the edge's `from` endpoint before its `to` endpoint. Nodes the
    /// tree cannot reach are appended in ascending order, so the result is
    /// always a permutation of all nodes. It is NOT guaranteed to be a walk
    /// along existing edges.
    pub fn random_spanning_tree<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        let n = self.node_count();

        let mut seen = HashSet::new();
        let mut pairs: Vec<(usize, usize)> = Vec::new();
        for (from, to, _) in self.edges() {
            if from != to && seen.insert((from.min(to), from.max(to))) {
                pairs.push((from, to));
            }
        }
        pairs.shuffle(rng);

        let mut sets = DisjointSet::new(n);
        let mut placed = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut accepted = 0;

        for (a, b) in pairs {
            if accepted + 1 >= n {
                break;
            }
            if !sets.union(a, b) {
                continue;
            }
            accepted += 1;
            for v in [a, b] {
                if !placed[v] {
                    placed[v] = true;
                    order.push(v);
                }
            }
        }

        order.extend((0..n).filter(|&v| !placed[v]));
        order
    }

    /// Build a graph the way the canvas editor does: `n` points scattered
    /// over the canvas, each ordered pair connected with probability
    /// `density` and weighted by the truncated distance.
    pub fn random_layout(n: usize, density: f64, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut graph = WeightedDigraph::new();

        let points: Vec<Position> = (0..n)
            .map(|_| {
                let x = rng.gen_range(0.0..CANVAS_WIDTH);
                let y = rng.gen_range(0.0..CANVAS_HEIGHT);
                graph.add_node_at(x, y);
                Position::new(x, y)
            })
            .collect();

        for from in 0..n {
            for to in 0..n {
                if from != to && rng.gen::<f64>() < density {
                    graph.link(from, to, &points[from], &points[to]);
                }
            }
        }

        graph
    }

    /// Get graph statistics
    pub fn statistics(&self) -> String {
        let edges = self.edges();
        let n = self.node_count();
        let possible = n * n.saturating_sub(1);
        let density = if possible > 0 {
            edges.len() as f64 / possible as f64
        } else {
            0.0
        };
        let (min_w, max_w, sum_w) = edges.iter().fold(
            (f64::INFINITY, 0.0_f64, 0.0),
            |(lo, hi, sum), &(_, _, w)| (lo.min(w), hi.max(w), sum + w),
        );
        let avg_w = if edges.is_empty() { 0.0 } else { sum_w / edges.len() as f64 };
        let asymmetric = edges
            .iter()
            .filter(|&&(from, to, w)| self.weight(to, from).map_or(true, |back| back != w))
            .count();

        format!(
            "Graph Statistics:\n  Nodes: {}\n  Edges: {}\n  Density: {:.2}\n  \
             Asymmetric edges: {}\n  Weight (min/avg/max): {:.2} / {:.2} / {:.2}",
            n,
            edges.len(),
            density,
            asymmetric,
            if edges.is_empty() { 0.0 } else { min_w },
            avg_w,
            max_w
        )
    }
}

/// Union-find with path halving and union by size
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        DisjointSet {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; false if they were already joined
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        true
    }
}
