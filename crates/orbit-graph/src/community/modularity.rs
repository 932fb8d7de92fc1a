//! Modularity over the symmetrised relationship graph.
//!
//! Community structure is undirected: a reply from A to B ties them as much
//! as a reply from B to A. The directed graph is folded into a symmetric
//! weight matrix `A_ij = w(i → j) + w(j → i)`, and modularity is
//!
//! ```text
//! Q = Σ_c [ in_c / 2m − γ · (tot_c / 2m)² ]
//! ```
//!
//! where `in_c` sums `A_ij` over ordered member pairs (self-loops of
//! aggregated super-nodes included), `tot_c` sums member strengths,
//! `2m = Σ_ij A_ij` and `γ` is the resolution. A graph with no edge weight
//! has modularity 0 for every partition.

use std::collections::{BTreeMap, HashMap};

use petgraph::visit::EdgeRef;

use crate::error::{GraphError, IntegrityViolation, Result};
use crate::graph::Graph;

/// Symmetric weighted adjacency, the working form of every Louvain level.
#[derive(Debug, Clone)]
pub(crate) struct Symmetric {
    /// Neighbours of each node with `A_ij`, excluding `i` itself.
    pub(crate) adj: Vec<Vec<(usize, f64)>>,
    /// `A_ii`: internal weight of an aggregated super-node.
    pub(crate) loops: Vec<f64>,
    /// `k_i = Σ_j A_ij`, loops included.
    pub(crate) strength: Vec<f64>,
    /// `2m`.
    pub(crate) two_m: f64,
}

impl Symmetric {
    pub(crate) fn from_graph(graph: &Graph) -> Self {
        let g = graph.petgraph();
        // Q is invariant under uniform scaling; dividing by the largest weight
        // keeps 2m finite for any finite weights.
        let peak = g.edge_weights().copied().fold(0.0_f64, f64::max);
        let scale = if peak > 0.0 { peak } else { 1.0 };
        let mut rows: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); g.node_count()];
        for edge in g.edge_references() {
            let (s, t) = (edge.source().index(), edge.target().index());
            let w = *edge.weight() / scale;
            *rows[s].entry(t).or_insert(0.0) += w;
            *rows[t].entry(s).or_insert(0.0) += w;
        }
        Self::from_rows(rows, vec![0.0; g.node_count()])
    }

    fn from_rows(rows: Vec<BTreeMap<usize, f64>>, loops: Vec<f64>) -> Self {
        let adj: Vec<Vec<(usize, f64)>> = rows
            .into_iter()
            .map(|row| row.into_iter().filter(|&(_, w)| w > 0.0).collect())
            .collect();
        let strength: Vec<f64> = adj
            .iter()
            .zip(&loops)
            .map(|(row, l)| row.iter().map(|&(_, w)| w).sum::<f64>() + l)
            .collect();
        let two_m = strength.iter().sum();
        Self {
            adj,
            loops,
            strength,
            two_m,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.adj.len()
    }

    /// Collapse each community into one super-node.
    ///
    /// `membership` must use dense ids `0..count`. Total weight and every
    /// community's modularity are preserved.
    pub(crate) fn aggregate(&self, membership: &[usize], count: usize) -> Self {
        let mut rows: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
        let mut loops = vec![0.0; count];
        for (i, row) in self.adj.iter().enumerate() {
            let ci = membership[i];
            loops[ci] += self.loops[i];
            for &(j, w) in row {
                let cj = membership[j];
                if ci == cj {
                    loops[ci] += w;
                } else {
                    *rows[ci].entry(cj).or_insert(0.0) += w;
                }
            }
        }
        Self::from_rows(rows, loops)
    }

    /// Per-community modularity contributions; the sum is the global `Q`.
    pub(crate) fn contributions(&self, membership: &[usize], count: usize, resolution: f64) -> Vec<f64> {
        if self.two_m <= 0.0 {
            return vec![0.0; count];
        }
        let mut internal = vec![0.0; count];
        let mut total = vec![0.0; count];
        for (i, row) in self.adj.iter().enumerate() {
            let c = membership[i];
            total[c] += self.strength[i];
            internal[c] += self.loops[i];
            internal[c] += row
                .iter()
                .filter(|&&(j, _)| membership[j] == c)
                .map(|&(_, w)| w)
                .sum::<f64>();
        }
        internal
            .iter()
            .zip(&total)
            .map(|(inside, tot)| {
                let share = tot / self.two_m;
                inside / self.two_m - resolution * share * share
            })
            .collect()
    }
}

/// Modularity of an arbitrary partition.
///
/// `assignment` maps every account id to a community label; labels are
/// opaque and need not be contiguous.
///
/// # Errors
///
/// - [`GraphError::Configuration`] if `resolution` is not positive and finite.
/// - [`GraphError::Integrity`] if `assignment` misses a graph node or
///   names a node the graph does not have.
pub fn modularity(graph: &Graph, assignment: &BTreeMap<String, usize>, resolution: f64) -> Result<f64> {
    validate_resolution(resolution)?;

    if let Some(unknown) = assignment.keys().find(|id| graph.node_index(id).is_none()) {
        return Err(IntegrityViolation::Partition {
            problem: "names unknown",
            node: unknown.clone(),
        }
        .into());
    }

    let mut dense: HashMap<usize, usize> = HashMap::new();
    let mut membership = Vec::with_capacity(graph.node_count());
    for node in graph.nodes() {
        let label = assignment.get(&node.id).ok_or_else(|| IntegrityViolation::Partition {
            problem: "misses",
            node: node.id.clone(),
        })?;
        let next = dense.len();
        membership.push(*dense.entry(*label).or_insert(next));
    }

    let sym = Symmetric::from_graph(graph);
    Ok(sym.contributions(&membership, dense.len(), resolution).iter().sum())
}

pub(crate) fn validate_resolution(resolution: f64) -> Result<()> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(GraphError::config(
            "community.resolution",
            resolution,
            "must be a positive finite number",
        ));
    }
    Ok(())
}
