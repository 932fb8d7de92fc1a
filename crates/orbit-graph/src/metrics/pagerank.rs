//! PageRank influence ranking.
//!
//! # Overview
//!
//! PageRank identifies accounts that attract engagement from other
//! influential accounts. Attention flows along relationship edges, so an
//! account followed by well-followed accounts ranks above one followed by
//! many isolated accounts.
//!
//! # Algorithm
//!
//! Power iteration from a uniform start of `1 / V`:
//!
//! ```text
//! PR(v) = (1 - d) / V + d * Σ PR(u) * share(u → v) + d * dangling / V
//! ```
//!
//! `share(u → v)` is `1 / out_degree(u)` by default. With `weighted = true`
//! it becomes `w(u → v) / out_strength(u)`, which equals the default on
//! unit-weight graphs. Weights are scaled by the node's largest out-weight
//! before summing, so extreme but finite weights cannot overflow the
//! strength.
//!
//! Dangling accounts (no outgoing edge, or only zero-weight ones in weighted
//! mode) spread their whole score uniformly, so no mass is lost and the
//! scores always sum to 1.
//!
//! Iteration stops when the L1 change drops below `tolerance` or after
//! `max_iter` rounds. Hitting the cap is reported through
//! [`PageRankResult::converged`], never as an error.

use std::collections::BTreeMap;

use petgraph::{Direction, visit::EdgeRef};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cancel::CancelToken;
use crate::error::{GraphError, Result, Stage};
use crate::graph::Graph;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for PageRank computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRankConfig {
    /// Damping factor (probability of following a link vs teleporting).
    /// Must lie in `[0, 1)`. Default: 0.85.
    #[serde(default = "default_damping")]
    pub damping: f64,
    /// Convergence threshold: stop when L1 norm of rank delta < tolerance.
    /// Must be positive. Default: 1e-6.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Maximum number of iterations. Must be at least 1. Default: 100.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Split outgoing rank by edge weight rather than edge count.
    /// Default: false.
    #[serde(default = "default_weighted")]
    pub weighted: bool,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            tolerance: default_tolerance(),
            max_iter: default_max_iter(),
            weighted: default_weighted(),
        }
    }
}

impl PageRankConfig {
    /// Check every parameter against its documented range.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Configuration`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.damping) {
            return Err(GraphError::config(
                "pagerank.damping",
                self.damping,
                "must lie in [0, 1)",
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(GraphError::config(
                "pagerank.tolerance",
                self.tolerance,
                "must be a positive finite number",
            ));
        }
        if self.max_iter == 0 {
            return Err(GraphError::config(
                "pagerank.max_iter",
                self.max_iter,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

const fn default_damping() -> f64 {
    0.85
}

const fn default_tolerance() -> f64 {
    1e-6
}

const fn default_max_iter() -> usize {
    100
}

const fn default_weighted() -> bool {
    false
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Result of a PageRank computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRankResult {
    /// PageRank scores: account id → score. Sums to 1 on a non-empty graph.
    pub scores: BTreeMap<String, f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the L1 change fell below `tolerance` within `max_iter`.
    pub converged: bool,
    /// L1 change of the last iteration.
    pub delta: f64,
}

impl PageRankResult {
    /// The `n` highest-ranked accounts, best first. Ties break by id.
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .scores
            .iter()
            .map(|(id, score)| (id.as_str(), *score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }
}

// ---------------------------------------------------------------------------
// PageRank
// ---------------------------------------------------------------------------

/// Compute PageRank over the relationship graph.
///
/// # Errors
///
/// Returns [`GraphError::Configuration`] if `config` fails validation.
pub fn pagerank(graph: &Graph, config: &PageRankConfig) -> Result<PageRankResult> {
    pagerank_with_cancel(graph, config, &CancelToken::new())
}

/// Cancellable PageRank; the token is checked before every iteration.
///
/// # Errors
///
/// - [`GraphError::Configuration`] if `config` fails validation.
/// - [`GraphError::Cancelled`] if `cancel` fires.
#[instrument(skip(graph, config, cancel), fields(nodes = graph.node_count()))]
pub fn pagerank_with_cancel(
    graph: &Graph,
    config: &PageRankConfig,
    cancel: &CancelToken,
) -> Result<PageRankResult> {
    config.validate()?;

    let n = graph.node_count();
    if n == 0 {
        cancel.check(Stage::PageRank)?;
        return Ok(PageRankResult {
            scores: BTreeMap::new(),
            iterations: 0,
            converged: true,
            delta: 0.0,
        });
    }

    let links = OutLinks::from_graph(graph, config.weighted);
    let n_f64 = n as f64;
    let base = (1.0 - config.damping) / n_f64;

    // Initialize ranks uniformly.
    let mut ranks = vec![1.0 / n_f64; n];
    let mut new_ranks = vec![0.0_f64; n];

    let mut iterations = 0;
    let mut converged = false;
    let mut delta = f64::INFINITY;

    while iterations < config.max_iter {
        cancel.check(Stage::PageRank)?;
        iterations += 1;

        let dangling: f64 = links.dangling.iter().map(|&u| ranks[u]).sum();
        let teleport = base + config.damping * dangling / n_f64;
        new_ranks.fill(teleport);

        for (u, out) in links.out.iter().enumerate() {
            let rank = config.damping * ranks[u];
            for &(v, share) in out {
                new_ranks[v] += rank * share;
            }
        }

        delta = ranks
            .iter()
            .zip(new_ranks.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut ranks, &mut new_ranks);

        if delta < config.tolerance {
            converged = true;
            break;
        }
    }

    if converged {
        debug!(iterations, delta, "pagerank converged");
    } else {
        warn!(
            iterations,
            delta,
            tolerance = config.tolerance,
            "pagerank reached max_iter without converging"
        );
    }

    Ok(PageRankResult {
        scores: graph.by_id(&ranks),
        iterations,
        converged,
        delta,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Outgoing transition shares per node, plus the dangling set.
struct OutLinks {
    out: Vec<Vec<(usize, f64)>>,
    dangling: Vec<usize>,
}

impl OutLinks {
    fn from_graph(graph: &Graph, weighted: bool) -> Self {
        let g = graph.petgraph();
        let mut out = Vec::with_capacity(g.node_count());
        let mut dangling = Vec::new();

        for u in g.node_indices() {
            let edges: Vec<(usize, f64)> = g
                .edges_directed(u, Direction::Outgoing)
                .map(|e| (e.target().index(), *e.weight()))
                .collect();

            let shares: Vec<(usize, f64)> = if weighted {
                let peak = edges.iter().map(|&(_, w)| w).fold(0.0_f64, f64::max);
                if peak > 0.0 {
                    // Scaled by the largest weight so the strength sum stays finite.
                    let strength: f64 = edges.iter().map(|&(_, w)| w / peak).sum();
                    edges
                        .into_iter()
                        .filter(|&(_, w)| w > 0.0)
                        .map(|(v, w)| (v, w / peak / strength))
                        .collect()
                } else {
                    Vec::new()
                }
            } else if edges.is_empty() {
                Vec::new()
            } else {
                let share = 1.0 / edges.len() as f64;
                edges.into_iter().map(|(v, _)| (v, share)).collect()
            };

            if shares.is_empty() {
                dangling.push(u.index());
            }
            out.push(shares);
        }

        Self { out, dangling }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BuildOptions, GraphBuilder, Observation, Signal, WeightPolicy};

    fn make_graph(nodes: &[&str], edges: &[(&str, &str, f64)]) -> Graph {
        let mut b = GraphBuilder::new(BuildOptions {
            policy: WeightPolicy::uniform(),
            ..BuildOptions::default()
        });
        b.add_nodes(nodes.iter().copied());
        for &(s, t, w) in edges {
            b.observe(Observation::new(s, t, Signal::Follow).with_weight(w));
        }
        b.build().expect("build graph")
    }

    fn unit(nodes: &[&str], edges: &[(&str, &str)]) -> Graph {
        let weighted: Vec<(&str, &str, f64)> = edges.iter().map(|&(a, b)| (a, b, 1.0)).collect();
        make_graph(nodes, &weighted)
    }

    fn run(graph: &Graph) -> PageRankResult {
        pagerank(graph, &PageRankConfig::default()).expect("pagerank")
    }

    fn sum(result: &PageRankResult) -> f64 {
        result.scores.values().sum()
    }

    #[test]
    fn empty_graph() {
        let result = run(&unit(&[], &[]));
        assert!(result.scores.is_empty());
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn single_node_gets_everything() {
        let result = run(&unit(&["A"], &[]));
        assert!((result.scores["A"] - 1.0).abs() < 1e-10);
        assert!(result.converged);
    }

    #[test]
    fn sums_to_one_with_dangling_nodes() {
        // C and D have no outgoing edges.
        let result = run(&unit(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("B", "C"), ("B", "D")],
        ));
        assert!((sum(&result) - 1.0).abs() < 1e-6, "sum = {}", sum(&result));
        assert!(result.converged);
    }

    #[test]
    fn cycle_is_uniform() {
        let result = run(&unit(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")]));
        for score in result.scores.values() {
            assert!((score - 1.0 / 3.0).abs() < 1e-6, "got {score}");
        }
    }

    #[test]
    fn popular_account_ranks_highest() {
        // Everyone follows H; H follows nobody.
        let result = run(&unit(
            &["H", "A", "B", "C"],
            &[("A", "H"), ("B", "H"), ("C", "H")],
        ));
        let top = result.top(1);
        assert_eq!(top[0].0, "H");
        for leaf in ["A", "B", "C"] {
            assert!(result.scores["H"] > result.scores[leaf]);
        }
    }

    fn weighted() -> PageRankConfig {
        PageRankConfig {
            weighted: true,
            ..PageRankConfig::default()
        }
    }

    #[test]
    fn default_splits_by_out_degree() {
        // Default policy: reply = 2.0, follow = 1.0. Out-degree splitting
        // ignores the difference.
        let mut b = GraphBuilder::new(BuildOptions::default());
        b.add_nodes(["A", "B", "C"])
            .observe(Observation::new("A", "B", Signal::Reply))
            .observe(Observation::new("A", "C", Signal::Follow));
        let result = run(&b.build().expect("build graph"));
        assert!(
            (result.scores["B"] - result.scores["C"]).abs() < 1e-10,
            "got {:?}",
            result.scores
        );
    }

    #[test]
    fn weights_steer_rank() {
        // A sends 9x more engagement to B than to C.
        let graph = make_graph(&["A", "B", "C"], &[("A", "B", 9.0), ("A", "C", 1.0)]);
        let result = pagerank(&graph, &weighted()).expect("pagerank");
        assert!(result.scores["B"] > result.scores["C"]);

        let unweighted = run(&graph);
        assert!((unweighted.scores["B"] - unweighted.scores["C"]).abs() < 1e-10);
    }

    #[test]
    fn zero_weight_only_node_is_dangling() {
        let result = pagerank(&make_graph(&["A", "B"], &[("A", "B", 0.0)]), &weighted())
            .expect("pagerank");
        assert!((sum(&result) - 1.0).abs() < 1e-6);
        assert!((result.scores["A"] - result.scores["B"]).abs() < 1e-10);
    }

    #[test]
    fn extreme_weights_keep_mass() {
        // The raw out-strength of A (2e308) is not representable.
        let graph = make_graph(&["A", "B", "C"], &[("A", "B", 1e308), ("A", "C", 1e308)]);
        for config in [PageRankConfig::default(), weighted()] {
            let result = pagerank(&graph, &config).expect("pagerank");
            assert!(result.scores.values().all(|s| s.is_finite()));
            assert!((sum(&result) - 1.0).abs() < 1e-6, "sum = {}", sum(&result));
            assert!((result.scores["B"] - result.scores["C"]).abs() < 1e-10);
        }
    }

    #[test]
    fn cap_reached_reports_not_converged() {
        let result = pagerank(
            &unit(&["A", "B", "C"], &[("A", "B"), ("B", "C")]),
            &PageRankConfig {
                max_iter: 1,
                tolerance: 1e-15,
                ..PageRankConfig::default()
            },
        )
        .expect("pagerank");
        assert!(!result.converged);
        assert_eq!(result.iterations, 1);
        assert!(result.delta > 0.0);
        assert!((sum(&result) - 1.0).abs() < 1e-9, "mass is conserved anyway");
    }

    #[test]
    fn invalid_damping_rejected() {
        for damping in [-0.1, 1.0, 1.5, f64::NAN] {
            let err = pagerank(
                &unit(&["A"], &[]),
                &PageRankConfig {
                    damping,
                    ..PageRankConfig::default()
                },
            )
            .expect_err("bad damping");
            assert!(err.is_configuration(), "damping {damping}");
        }
    }

    #[test]
    fn invalid_tolerance_and_cap_rejected() {
        let graph = unit(&["A"], &[]);
        let bad_tol = PageRankConfig {
            tolerance: 0.0,
            ..PageRankConfig::default()
        };
        assert!(pagerank(&graph, &bad_tol).expect_err("tol").is_configuration());

        let bad_cap = PageRankConfig {
            max_iter: 0,
            ..PageRankConfig::default()
        };
        assert!(pagerank(&graph, &bad_cap).expect_err("cap").is_configuration());
    }

    #[test]
    fn zero_damping_is_uniform() {
        let result = pagerank(
            &unit(&["A", "B", "C"], &[("A", "B"), ("A", "C")]),
            &PageRankConfig {
                damping: 0.0,
                ..PageRankConfig::default()
            },
        )
        .expect("pagerank");
        for score in result.scores.values() {
            assert!((score - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn cancelled_before_first_iteration() {
        let token = CancelToken::new();
        token.cancel();
        let err = pagerank_with_cancel(
            &unit(&["A", "B"], &[("A", "B")]),
            &PageRankConfig::default(),
            &token,
        )
        .expect_err("cancelled");
        assert_eq!(
            err,
            GraphError::Cancelled {
                stage: Stage::PageRank
            }
        );
    }

    #[test]
    fn top_breaks_ties_by_id() {
        let result = run(&unit(&["B", "A", "C"], &[]));
        let ids: Vec<&str> = result.top(3).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }
}
