//! Degree centrality.
//!
//! Raw in/out degree counts edges regardless of weight. The normalized form
//! divides by `V - 1`, the largest degree a node can have in a simple
//! directed graph; a single-node graph reports 0 rather than dividing by
//! zero. Weighted in/out strength (sum of edge weights) is reported
//! alongside, since engagement graphs are usually read by strength.

use std::collections::BTreeMap;

use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cancel::CancelToken;
use crate::error::{Result, Stage};
use crate::graph::Graph;

// ---------------------------------------------------------------------------
// Degree Centrality
// ---------------------------------------------------------------------------

/// Per-account degree centrality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeCentrality {
    /// Raw in-degree (how many accounts engage with this one).
    pub in_degree: BTreeMap<String, usize>,
    /// Raw out-degree (how many accounts this one engages with).
    pub out_degree: BTreeMap<String, usize>,
    /// In-degree ÷ (V − 1).
    pub in_centrality: BTreeMap<String, f64>,
    /// Out-degree ÷ (V − 1).
    pub out_centrality: BTreeMap<String, f64>,
    /// Sum of incoming edge weights.
    pub in_strength: BTreeMap<String, f64>,
    /// Sum of outgoing edge weights.
    pub out_strength: BTreeMap<String, f64>,
}

impl DegreeCentrality {
    /// Total degree (in + out) for one account.
    #[must_use]
    pub fn total_degree(&self, id: &str) -> Option<usize> {
        Some(self.in_degree.get(id)? + self.out_degree.get(id)?)
    }
}

/// Compute degree centrality for every node.
///
/// # Returns
///
/// A [`DegreeCentrality`] keyed by every account id in `graph`. For an
/// empty graph every map is empty.
#[must_use]
#[instrument(skip(graph))]
pub fn degree_centrality(graph: &Graph) -> DegreeCentrality {
    let g = graph.petgraph();
    let n = g.node_count();
    let denom = if n > 1 { (n - 1) as f64 } else { 0.0 };

    let mut in_deg = vec![0usize; n];
    let mut out_deg = vec![0usize; n];
    let mut in_str = vec![0.0_f64; n];
    let mut out_str = vec![0.0_f64; n];

    for edge in g.edge_references() {
        let (s, t, w) = (edge.source().index(), edge.target().index(), *edge.weight());
        out_deg[s] += 1;
        in_deg[t] += 1;
        out_str[s] += w;
        in_str[t] += w;
    }

    let normalize = |d: usize| if denom > 0.0 { d as f64 / denom } else { 0.0 };
    let in_norm: Vec<f64> = in_deg.iter().map(|&d| normalize(d)).collect();
    let out_norm: Vec<f64> = out_deg.iter().map(|&d| normalize(d)).collect();

    DegreeCentrality {
        in_degree: graph.by_id(&in_deg),
        out_degree: graph.by_id(&out_deg),
        in_centrality: graph.by_id(&in_norm),
        out_centrality: graph.by_id(&out_norm),
        in_strength: graph.by_id(&in_str),
        out_strength: graph.by_id(&out_str),
    }
}

/// Cancellable form of [`degree_centrality`], used by the facade.
///
/// Degree is a single linear pass, so the token is only checked on entry.
///
/// # Errors
///
/// Returns [`crate::GraphError::Cancelled`] if `cancel` is already set.
pub fn degree_centrality_with_cancel(
    graph: &Graph,
    cancel: &CancelToken,
) -> Result<DegreeCentrality> {
    cancel.check(Stage::Degree)?;
    Ok(degree_centrality(graph))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BuildOptions, GraphBuilder, Observation, Signal, WeightPolicy};

    fn make_graph(nodes: &[&str], edges: &[(&str, &str)]) -> Graph {
        let mut b = GraphBuilder::new(BuildOptions {
            policy: WeightPolicy::uniform(),
            ..BuildOptions::default()
        });
        b.add_nodes(nodes.iter().copied());
        for (s, t) in edges {
            b.observe(Observation::new(*s, *t, Signal::Follow));
        }
        b.build().expect("build graph")
    }

    #[test]
    fn degree_centrality_empty_graph() {
        let dc = degree_centrality(&make_graph(&[], &[]));
        assert!(dc.in_degree.is_empty());
        assert!(dc.out_degree.is_empty());
        assert!(dc.in_centrality.is_empty());
    }

    #[test]
    fn degree_centrality_single_node_is_zero() {
        let dc = degree_centrality(&make_graph(&["A"], &[]));
        assert_eq!(dc.in_degree["A"], 0);
        assert!((dc.in_centrality["A"] - 0.0).abs() < f64::EPSILON);
        assert!((dc.out_centrality["A"] - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn degree_centrality_linear_chain() {
        // A → B → C
        let dc = degree_centrality(&make_graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]));

        assert_eq!(dc.in_degree["A"], 0);
        assert_eq!(dc.out_degree["A"], 1);
        assert_eq!(dc.total_degree("B"), Some(2));
        assert_eq!(dc.in_degree["C"], 1);
        assert_eq!(dc.out_degree["C"], 0);

        // normalized by V - 1 = 2
        assert!((dc.out_centrality["A"] - 0.5).abs() < 1e-12);
        assert!((dc.in_centrality["B"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn degree_centrality_star_topology() {
        // Hub: A→B, A→C, A→D
        let dc = degree_centrality(&make_graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("A", "D")],
        ));

        assert_eq!(dc.out_degree["A"], 3);
        assert!((dc.out_centrality["A"] - 1.0).abs() < 1e-12, "hub reaches everyone");
        for leaf in ["B", "C", "D"] {
            assert_eq!(dc.in_degree[leaf], 1);
            assert_eq!(dc.out_degree[leaf], 0);
        }
    }

    #[test]
    fn raw_degree_sums_equal_edge_count() {
        let graph = make_graph(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("C", "A"), ("D", "A"), ("A", "D")],
        );
        let dc = degree_centrality(&graph);

        let in_sum: usize = dc.in_degree.values().sum();
        let out_sum: usize = dc.out_degree.values().sum();
        assert_eq!(in_sum, graph.edge_count());
        assert_eq!(out_sum, graph.edge_count());

        let norm_sum: f64 = dc.in_centrality.values().sum();
        assert!((norm_sum - 5.0 / 3.0).abs() < 1e-12, "got {norm_sum}");
    }

    #[test]
    fn strength_tracks_weights() {
        let mut b = GraphBuilder::default();
        b.add_nodes(["A", "B"])
            .observe(Observation::new("A", "B", Signal::Reply))
            .observe(Observation::new("A", "B", Signal::Like));
        let dc = degree_centrality(&b.build().expect("build"));

        assert_eq!(dc.out_degree["A"], 1, "one canonical edge");
        assert!((dc.out_strength["A"] - 2.5).abs() < 1e-12);
        assert!((dc.in_strength["B"] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn cancelled_token_aborts() {
        let token = CancelToken::new();
        token.cancel();
        let err = degree_centrality_with_cancel(&make_graph(&["A"], &[]), &token)
            .expect_err("cancelled");
        assert!(err.is_cancelled());
    }
}
