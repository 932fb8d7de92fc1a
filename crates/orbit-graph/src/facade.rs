//! One-call computation of every metric over a graph.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::cancel::CancelToken;
use crate::community::{CommunityResult, detect_communities_with_cancel};
use crate::config::MetricsOptions;
use crate::error::{IntegrityViolation, Result};
use crate::graph::Graph;
use crate::metrics::betweenness::{Betweenness, betweenness_centrality_with_cancel};
use crate::metrics::degree::{DegreeCentrality, degree_centrality_with_cancel};
use crate::metrics::pagerank::{PageRankResult, pagerank_with_cancel};
use crate::stats::{NetworkSummary, OrbitBand, network_statistics_with_cancel};

/// Every metric for one graph under one set of options.
///
/// Built once per [`compute_graph_metrics`] call and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// [`Graph::content_hash`] of the input.
    pub content_hash: String,
    /// [`MetricsOptions::fingerprint`] of the options used.
    pub options_fingerprint: String,
    /// Degree centrality.
    pub degree: DegreeCentrality,
    /// Betweenness centrality.
    pub betweenness: Betweenness,
    /// PageRank influence scores.
    pub pagerank: PageRankResult,
    /// Community partition.
    pub communities: CommunityResult,
    /// Graph density.
    pub density: f64,
    /// Average clustering coefficient.
    pub average_clustering: f64,
    /// Modularity of `communities`.
    pub modularity: f64,
    /// Whether PageRank converged within its iteration cap.
    pub converged: bool,
    /// Remaining network statistics, orbit distribution included.
    pub statistics: NetworkSummary,
}

impl GraphMetrics {
    /// Edges per orbit tier, strongest first.
    #[must_use]
    pub fn orbit_distribution(&self) -> &[OrbitBand] {
        &self.statistics.orbit
    }

    /// Cache key for this result: `(content_hash, options_fingerprint)`.
    #[must_use]
    pub fn cache_key(&self) -> (&str, &str) {
        (&self.content_hash, &self.options_fingerprint)
    }
}

/// Compute every metric for `graph`.
///
/// # Errors
///
/// - [`crate::GraphError::Configuration`] if `options` fail validation.
/// - [`crate::GraphError::Integrity`] if `graph` has no nodes.
pub fn compute_graph_metrics(graph: &Graph, options: &MetricsOptions) -> Result<GraphMetrics> {
    compute_graph_metrics_with_cancel(graph, options, &CancelToken::new())
}

/// Cancellable form of [`compute_graph_metrics`].
///
/// The token is checked between stages and inside each long-running stage.
/// A cancelled run returns [`crate::GraphError::Cancelled`] and no partial
/// result.
///
/// # Errors
///
/// - [`crate::GraphError::Configuration`] if `options` fail validation.
/// - [`crate::GraphError::Integrity`] if `graph` has no nodes.
/// - [`crate::GraphError::Cancelled`] if `cancel` fires.
#[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn compute_graph_metrics_with_cancel(
    graph: &Graph,
    options: &MetricsOptions,
    cancel: &CancelToken,
) -> Result<GraphMetrics> {
    options.validate()?;
    if graph.is_empty() {
        return Err(IntegrityViolation::EmptyGraph.into());
    }

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        hash = graph.content_hash(),
        "computing graph metrics"
    );

    let degree = degree_centrality_with_cancel(graph, cancel)?;
    let betweenness = betweenness_centrality_with_cancel(graph, &options.betweenness, cancel)?;
    let pagerank = pagerank_with_cancel(graph, &options.pagerank, cancel)?;
    let communities = detect_communities_with_cancel(graph, &options.community, cancel)?;
    let statistics = network_statistics_with_cancel(graph, &options.orbit, cancel)?;

    Ok(GraphMetrics {
        content_hash: graph.content_hash().to_string(),
        options_fingerprint: options.fingerprint(),
        density: statistics.density,
        average_clustering: statistics.average_clustering,
        modularity: communities.modularity,
        converged: pagerank.converged,
        degree,
        betweenness,
        pagerank,
        communities,
        statistics,
    })
}
