//! Betweenness centrality via Brandes' algorithm.
//!
//! # Overview
//!
//! Betweenness centrality measures how often an account lies on shortest
//! paths between other pairs of accounts. High-betweenness accounts are
//! brokers: they connect audiences that would otherwise not reach each other.
//!
//! # Algorithm
//!
//! Brandes (2001), one single-source pass per node:
//!
//! 1. For each source `s`, compute shortest-path counts (`sigma`) and
//!    predecessor lists. On unit-weight graphs this is a BFS; otherwise a
//!    Dijkstra search where an edge of weight `w` costs `1 / w`, so stronger
//!    relationships are closer.
//! 2. Accumulate dependency scores in reverse settle order.
//! 3. Sum dependencies across sources.
//!
//! Complexity: O(V·E) unweighted, O(V·E + V²·log V) weighted.
//!
//! Zero-weight edges carry no relationship strength and are not traversed
//! by the weighted search.
//!
//! # Sampling
//!
//! [`BetweennessMode::Sampled`] runs the pass from a seeded random subset of
//! pivot sources and scales by `V / pivots`. The result records the mode, so
//! an approximate score is never mistaken for an exact one. A pivot count of
//! at least V runs, and records, the exact computation.
//!
//! # Output
//!
//! Raw scores count ordered `(s, t)` pairs. Normalized scores divide by
//! `(V − 1)(V − 2)`, the number of ordered pairs excluding the node itself;
//! graphs with two or fewer nodes normalize to 0.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};

use petgraph::{Direction, visit::EdgeRef};
use rand::{SeedableRng, rngs::StdRng, seq::index::sample};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cancel::CancelToken;
use crate::error::{GraphError, Result, Stage};
use crate::graph::Graph;

/// Relative tolerance when comparing accumulated path costs.
const COST_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Exact or pivot-sampled computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BetweennessMode {
    /// One pass from every node.
    #[default]
    Exact,
    /// One pass from each of `pivots` seeded-random sources.
    Sampled {
        /// Number of source nodes to sample.
        pivots: usize,
        /// RNG seed, so a sampled run is reproducible.
        seed: u64,
    },
}

/// Configuration for betweenness centrality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetweennessConfig {
    /// Exact (default) or sampled.
    #[serde(default)]
    pub mode: BetweennessMode,
    /// Use edge weights as inverse distances when the graph is not
    /// unit-weighted. Default: true. When false, paths are hop counts.
    #[serde(default = "default_true")]
    pub use_weights: bool,
}

impl Default for BetweennessConfig {
    fn default() -> Self {
        Self {
            mode: BetweennessMode::Exact,
            use_weights: true,
        }
    }
}

impl BetweennessConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Configuration`] if sampled mode asks for zero pivots.
    pub fn validate(&self) -> Result<()> {
        if let BetweennessMode::Sampled { pivots: 0, .. } = self.mode {
            return Err(GraphError::config(
                "betweenness.mode.pivots",
                0,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Per-account betweenness centrality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Betweenness {
    /// Sum of pair dependencies (ordered pairs).
    pub raw: BTreeMap<String, f64>,
    /// `raw / ((V − 1)(V − 2))`, or 0 when V ≤ 2.
    pub normalized: BTreeMap<String, f64>,
    /// Whether weighted (inverse-weight) distances were used.
    pub weighted: bool,
    /// The mode that produced these scores.
    pub mode: BetweennessMode,
    /// Number of single-source passes actually run.
    pub sources: usize,
}

/// Compute betweenness centrality for every account.
///
/// # Errors
///
/// Returns [`GraphError::Configuration`] for an invalid `config`.
pub fn betweenness_centrality(graph: &Graph, config: &BetweennessConfig) -> Result<Betweenness> {
    betweenness_centrality_with_cancel(graph, config, &CancelToken::new())
}

/// Cancellable betweenness; the token is checked after every source pass.
///
/// # Errors
///
/// - [`GraphError::Configuration`] for an invalid `config`.
/// - [`GraphError::Cancelled`] if `cancel` fires.
#[instrument(skip(graph, config, cancel), fields(nodes = graph.node_count()))]
pub fn betweenness_centrality_with_cancel(
    graph: &Graph,
    config: &BetweennessConfig,
    cancel: &CancelToken,
) -> Result<Betweenness> {
    config.validate()?;
    cancel.check(Stage::Betweenness)?;

    let n = graph.node_count();
    let weighted = config.use_weights && !graph.is_unit_weighted();
    let adjacency = Adjacency::from_graph(graph, weighted);

    let sources: Vec<usize> = match config.mode {
        BetweennessMode::Exact => (0..n).collect(),
        BetweennessMode::Sampled { pivots, seed } => {
            if pivots >= n {
                debug!(pivots, nodes = n, "pivot count covers every node, running exact");
                (0..n).collect()
            } else {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut picked = sample(&mut rng, n, pivots).into_vec();
                // Accumulation order does not change the sum, but a sorted
                // order keeps floating-point rounding reproducible.
                picked.sort_unstable();
                warn!(pivots, nodes = n, "betweenness is approximate (sampled pivots)");
                picked
            }
        }
    };

    let mut cb = vec![0.0_f64; n];
    let mut pass = SourcePass::new(n);

    for &s in &sources {
        if weighted {
            pass.dijkstra(&adjacency, s);
        } else {
            pass.bfs(&adjacency, s);
        }
        pass.accumulate(s, &mut cb);
        cancel.check(Stage::Betweenness)?;
    }

    if !sources.is_empty() && sources.len() < n {
        let scale = n as f64 / sources.len() as f64;
        for c in &mut cb {
            *c *= scale;
        }
    }

    let normalized: Vec<f64> = if n > 2 {
        let pairs = ((n - 1) * (n - 2)) as f64;
        cb.iter().map(|c| c / pairs).collect()
    } else {
        vec![0.0; n]
    };

    debug!(sources = sources.len(), weighted, "betweenness computed");

    Ok(Betweenness {
        raw: graph.by_id(&cb),
        normalized: graph.by_id(&normalized),
        weighted,
        mode: if sources.len() == n { BetweennessMode::Exact } else { config.mode },
        sources: sources.len(),
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Outgoing adjacency with per-edge traversal cost.
struct Adjacency {
    out: Vec<Vec<(usize, f64)>>,
}

impl Adjacency {
    fn from_graph(graph: &Graph, weighted: bool) -> Self {
        let g = graph.petgraph();
        let out = g
            .node_indices()
            .map(|v| {
                g.edges_directed(v, Direction::Outgoing)
                    .filter_map(|e| {
                        let w = *e.weight();
                        if !weighted {
                            Some((e.target().index(), 1.0))
                        } else if w > 0.0 {
                            Some((e.target().index(), 1.0 / w))
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .collect();
        Self { out }
    }
}

/// Scratch buffers for one Brandes single-source pass, reused across sources.
struct SourcePass {
    /// Nodes in non-decreasing distance order.
    stack: Vec<usize>,
    predecessors: Vec<Vec<usize>>,
    sigma: Vec<f64>,
    dist: Vec<f64>,
    delta: Vec<f64>,
    settled: Vec<bool>,
}

impl SourcePass {
    fn new(n: usize) -> Self {
        Self {
            stack: Vec::with_capacity(n),
            predecessors: vec![Vec::new(); n],
            sigma: vec![0.0; n],
            dist: vec![f64::INFINITY; n],
            delta: vec![0.0; n],
            settled: vec![false; n],
        }
    }

    fn reset(&mut self, s: usize) {
        self.stack.clear();
        for p in &mut self.predecessors {
            p.clear();
        }
        self.sigma.fill(0.0);
        self.dist.fill(f64::INFINITY);
        self.delta.fill(0.0);
        self.settled.fill(false);
        self.sigma[s] = 1.0;
        self.dist[s] = 0.0;
    }

    /// Unweighted shortest paths (hop count).
    fn bfs(&mut self, adj: &Adjacency, s: usize) {
        self.reset(s);
        let mut queue: VecDeque<usize> = VecDeque::new();
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            self.stack.push(v);
            for &(w, _) in &adj.out[v] {
                // First visit to w?
                if self.dist[w].is_infinite() {
                    self.dist[w] = self.dist[v] + 1.0;
                    queue.push_back(w);
                }
                // Shortest path to w via v?
                #[allow(clippy::float_cmp)]
                if self.dist[w] == self.dist[v] + 1.0 {
                    self.sigma[w] += self.sigma[v];
                    self.predecessors[w].push(v);
                }
            }
        }
    }

    /// Weighted shortest paths (edge cost = 1 / weight).
    fn dijkstra(&mut self, adj: &Adjacency, s: usize) {
        self.reset(s);
        let mut heap = BinaryHeap::new();
        heap.push(Frontier { cost: 0.0, node: s });

        while let Some(Frontier { cost, node: v }) = heap.pop() {
            if self.settled[v] || cost > self.dist[v] {
                continue;
            }
            self.settled[v] = true;
            self.stack.push(v);

            for &(w, edge_cost) in &adj.out[v] {
                if self.settled[w] {
                    continue;
                }
                let alt = self.dist[v] + edge_cost;
                if approx_eq(alt, self.dist[w]) {
                    self.sigma[w] += self.sigma[v];
                    self.predecessors[w].push(v);
                } else if alt < self.dist[w] {
                    self.dist[w] = alt;
                    self.sigma[w] = self.sigma[v];
                    self.predecessors[w].clear();
                    self.predecessors[w].push(v);
                    heap.push(Frontier { cost: alt, node: w });
                }
            }
        }
    }

    /// Accumulate dependencies in reverse settle order into `cb`.
    fn accumulate(&mut self, s: usize, cb: &mut [f64]) {
        while let Some(w) = self.stack.pop() {
            for &v in &self.predecessors[w] {
                if self.sigma[w] > 0.0 {
                    self.delta[v] += (self.sigma[v] / self.sigma[w]) * (1.0 + self.delta[w]);
                }
            }
            if w != s {
                cb[w] += self.delta[w];
            }
        }
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    (a - b).abs() <= COST_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Min-heap entry for Dijkstra.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    node: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
