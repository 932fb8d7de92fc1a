//! Whole-network statistics for the relationship graph.
//!
//! # Statistics Provided
//!
//! - **density**: Ratio of actual edges to maximum possible edges for a
//!   directed graph: `density = edge_count / (node_count * (node_count - 1))`.
//!   A graph with 0 or 1 node has density 0.0.
//! - **average_clustering**: see [`clustering`].
//! - **reciprocity**: Fraction of edges whose reverse edge also exists
//!   (mutual follows, two-way conversations). 0.0 without edges.
//! - **weakly_connected_components**: Number of disjoint audiences when
//!   direction is ignored.
//! - **isolated_nodes**: Accounts with no edges at all.
//! - **max_in_degree / max_out_degree**: The most-engaged-with and the
//!   most-engaging account's edge counts.
//! - **orbit**: Edge counts per strength tier, see [`orbit`].

pub mod clustering;
pub mod orbit;

use petgraph::{Direction, algo::connected_components};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cancel::CancelToken;
use crate::error::{Result, Stage};
use crate::graph::Graph;

pub use clustering::{average_clustering, local_clustering};
pub use orbit::{OrbitBand, OrbitConfig, OrbitTier, OrbitTiers};

// ---------------------------------------------------------------------------
// NetworkSummary
// ---------------------------------------------------------------------------

/// Summary statistics for a relationship graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    /// Number of accounts.
    pub node_count: usize,
    /// Number of canonical (deduplicated) edges.
    pub edge_count: usize,
    /// `edge_count / (node_count * (node_count - 1))`.
    pub density: f64,
    /// Mean local clustering coefficient over all nodes.
    pub average_clustering: f64,
    /// Fraction of edges whose reverse also exists.
    pub reciprocity: f64,
    /// Number of weakly connected components.
    pub weakly_connected_components: usize,
    /// Nodes with no in-edges and no out-edges.
    pub isolated_nodes: usize,
    /// Highest in-degree.
    pub max_in_degree: usize,
    /// Highest out-degree.
    pub max_out_degree: usize,
    /// Edges per orbit tier, strongest first.
    pub orbit: Vec<OrbitBand>,
}

/// Compute every network statistic.
///
/// # Errors
///
/// Returns [`crate::GraphError::Configuration`] if `orbit` fails validation.
pub fn network_statistics(graph: &Graph, orbit: &OrbitConfig) -> Result<NetworkSummary> {
    network_statistics_with_cancel(graph, orbit, &CancelToken::new())
}

/// Cancellable form of [`network_statistics`]; checked on entry and before
/// the clustering pass.
///
/// # Errors
///
/// - [`crate::GraphError::Configuration`] if `orbit` fails validation.
/// - [`crate::GraphError::Cancelled`] if `cancel` fires.
#[instrument(skip(graph, orbit, cancel), fields(nodes = graph.node_count()))]
pub fn network_statistics_with_cancel(
    graph: &Graph,
    orbit: &OrbitConfig,
    cancel: &CancelToken,
) -> Result<NetworkSummary> {
    orbit.validate()?;
    cancel.check(Stage::Statistics)?;

    let g = graph.petgraph();
    let degree = |idx, dir| g.neighbors_directed(idx, dir).count();

    let isolated_nodes = g
        .node_indices()
        .filter(|&idx| degree(idx, Direction::Incoming) == 0 && degree(idx, Direction::Outgoing) == 0)
        .count();
    let max_in_degree = g
        .node_indices()
        .map(|idx| degree(idx, Direction::Incoming))
        .max()
        .unwrap_or(0);
    let max_out_degree = g
        .node_indices()
        .map(|idx| degree(idx, Direction::Outgoing))
        .max()
        .unwrap_or(0);

    let tiers = OrbitTiers::from_graph(graph, orbit)?;

    cancel.check(Stage::Statistics)?;
    let average_clustering = average_clustering(graph);

    Ok(NetworkSummary {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        density: network_density(graph),
        average_clustering,
        reciprocity: reciprocity(graph),
        weakly_connected_components: connected_components(g),
        isolated_nodes,
        max_in_degree,
        max_out_degree,
        orbit: tiers.distribution(),
    })
}

/// `|E| / (V (V − 1))`; 0 for graphs with fewer than two nodes.
#[must_use]
pub fn network_density(graph: &Graph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    graph.edge_count() as f64 / (n * (n - 1)) as f64
}

/// Fraction of edges `u → v` for which `v → u` also exists.
#[must_use]
pub fn reciprocity(graph: &Graph) -> f64 {
    let g = graph.petgraph();
    let edges = g.edge_count();
    if edges == 0 {
        return 0.0;
    }
    let mutual = g
        .raw_edges()
        .iter()
        .filter(|e| g.find_edge(e.target(), e.source()).is_some())
        .count();
    mutual as f64 / edges as f64
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
    fn density_of_small_graphs_is_zero() {
        assert!(network_density(&make_graph(&[], &[])).abs() < f64::EPSILON);
        assert!(network_density(&make_graph(&["A"], &[])).abs() < f64::EPSILON);
    }

    #[test]
    fn complete_digraph_has_density_one() {
        let graph = make_graph(
            &["A", "B", "C"],
            &[("A", "B"), ("B", "A"), ("B", "C"), ("C", "B"), ("A", "C"), ("C", "A")],
        );
        assert!((network_density(&graph) - 1.0).abs() < 1e-12);
        assert!((reciprocity(&graph) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn chain_density() {
        // 2 edges / (3 * 2)
        let graph = make_graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        assert!((network_density(&graph) - 1.0 / 3.0).abs() < 1e-12);
        assert!(reciprocity(&graph).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_counts_components_and_isolates() {
        let graph = make_graph(
            &["A", "B", "C", "D", "E"],
            &[("A", "B"), ("B", "A"), ("C", "D")],
        );
        let summary = network_statistics(&graph, &OrbitConfig::default()).expect("stats");

        assert_eq!(summary.node_count, 5);
        assert_eq!(summary.edge_count, 3);
        assert_eq!(summary.weakly_connected_components, 3);
        assert_eq!(summary.isolated_nodes, 1);
        assert_eq!(summary.max_in_degree, 1);
        assert_eq!(summary.max_out_degree, 1);
        assert!((summary.reciprocity - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary.orbit.len(), 4);
        assert_eq!(summary.orbit.iter().map(|b| b.edges).sum::<usize>(), 3);
    }

    #[test]
    fn cancelled_statistics() {
        let token = CancelToken::new();
        token.cancel();
        let err = network_statistics_with_cancel(
            &make_graph(&["A"], &[]),
            &OrbitConfig::default(),
            &token,
        )
        .expect_err("cancelled");
        assert!(err.is_cancelled());
    }
}
