//! Clustering coefficient.
//!
//! Clustering ignores direction: two accounts are neighbours if either
//! engages with the other. A node's local coefficient is the fraction of its
//! neighbour pairs that are themselves neighbours,
//! `links / (k (k − 1) / 2)`, and 0 when it has fewer than two neighbours.
//! The average is taken over **all** nodes, so low-degree nodes pull it
//! down rather than being skipped.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::visit::EdgeRef;
use tracing::instrument;

use crate::graph::Graph;

/// Undirected neighbour sets, self excluded.
fn neighbour_sets(graph: &Graph) -> Vec<BTreeSet<usize>> {
    let g = graph.petgraph();
    let mut sets = vec![BTreeSet::new(); g.node_count()];
    for edge in g.edge_references() {
        let (s, t) = (edge.source().index(), edge.target().index());
        if s != t {
            sets[s].insert(t);
            sets[t].insert(s);
        }
    }
    sets
}

fn local_coefficients(graph: &Graph) -> Vec<f64> {
    let sets = neighbour_sets(graph);
    sets.iter()
        .map(|nbrs| {
            let k = nbrs.len();
            if k < 2 {
                return 0.0;
            }
            let members: Vec<usize> = nbrs.iter().copied().collect();
            let mut links = 0usize;
            for (i, &a) in members.iter().enumerate() {
                links += members[i + 1..].iter().filter(|b| sets[a].contains(b)).count();
            }
            links as f64 / ((k * (k - 1)) as f64 / 2.0)
        })
        .collect()
}

/// Per-account local clustering coefficient.
#[must_use]
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn local_clustering(graph: &Graph) -> BTreeMap<String, f64> {
    graph.by_id(&local_coefficients(graph))
}

/// Mean local clustering coefficient over every node; 0 for an empty graph.
#[must_use]
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn average_clustering(graph: &Graph) -> f64 {
    let coefficients = local_coefficients(graph);
    if coefficients.is_empty() {
        return 0.0;
    }
    coefficients.iter().sum::<f64>() / coefficients.len() as f64
}
