//! Canonical graph construction from raw relationship observations.
//!
//! # Overview
//!
//! Collaborators hand the engine a node set (account ids) and a stream of
//! observations: one row per follow, like, reply, repost or mention. The
//! [`GraphBuilder`] folds those rows into a [`Graph`], the single immutable
//! input every metric in this crate reads.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A engages with B": A follows B, A liked B's post,
//! A replied to B. Influence therefore flows along edge direction, which is
//! what PageRank and in-degree measure.
//!
//! ## Aggregation
//!
//! Each observation contributes `policy[signal] × raw_weight` (raw weight
//! defaults to 1). Contributions for one ordered pair are folded by the
//! configured [`Combinator`], so the canonical graph never holds two edges
//! for the same `(source, target)`.
//!
//! ## Cache Invalidation
//!
//! [`Graph::content_hash`] is a BLAKE3 hash of the sorted node ids and the
//! sorted weighted edge list. Two graphs with the same hash produce the same
//! metrics under the same options.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, HashMap};

use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{GraphError, IntegrityViolation, Result};

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// The kind of interaction an observation records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Source follows target.
    Follow,
    /// Source liked one of target's posts.
    Like,
    /// Source replied to target.
    Reply,
    /// Source reposted target.
    Repost,
    /// Source mentioned target.
    Mention,
}

impl Signal {
    /// All signal kinds, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Follow,
        Self::Like,
        Self::Reply,
        Self::Repost,
        Self::Mention,
    ];
}

/// Display attributes carried on a node. Algorithms never read these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// Handle or display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Follower count reported by the profile collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
    /// Following count reported by the profile collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<u64>,
    /// Post count reported by the profile collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<u64>,
}

/// An account in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Account identifier, unique within a graph.
    pub id: String,
    /// Optional display attributes.
    #[serde(default)]
    pub attributes: NodeAttributes,
}

impl GraphNode {
    /// A node with no attributes.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: NodeAttributes::default(),
        }
    }

    /// Attach display attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: NodeAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// One raw relationship observation: `source` did `signal` towards `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// The acting account.
    pub source: String,
    /// The account acted upon.
    pub target: String,
    /// Interaction kind.
    pub signal: Signal,
    /// Optional strength multiplier (e.g. number of likes in a window).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Observation {
    /// An observation with no raw weight.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, signal: Signal) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            signal,
            weight: None,
        }
    }

    /// Attach a raw strength multiplier.
    #[must_use]
    pub const fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

// ---------------------------------------------------------------------------
// Build options
// ---------------------------------------------------------------------------

/// Weight contributed by one observation of each signal kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightPolicy {
    /// Default: 1.0.
    #[serde(default = "default_follow")]
    pub follow: f64,
    /// Default: 0.5.
    #[serde(default = "default_like")]
    pub like: f64,
    /// Default: 2.0.
    #[serde(default = "default_reply")]
    pub reply: f64,
    /// Default: 1.5.
    #[serde(default = "default_repost")]
    pub repost: f64,
    /// Default: 1.0.
    #[serde(default = "default_mention")]
    pub mention: f64,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self {
            follow: default_follow(),
            like: default_like(),
            reply: default_reply(),
            repost: default_repost(),
            mention: default_mention(),
        }
    }
}

impl WeightPolicy {
    /// A policy where every signal weighs 1.0 (plain interaction counts).
    #[must_use]
    pub const fn uniform() -> Self {
        Self {
            follow: 1.0,
            like: 1.0,
            reply: 1.0,
            repost: 1.0,
            mention: 1.0,
        }
    }

    /// Weight contribution of one observation of `signal`.
    #[must_use]
    pub const fn weight(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Follow => self.follow,
            Signal::Like => self.like,
            Signal::Reply => self.reply,
            Signal::Repost => self.repost,
            Signal::Mention => self.mention,
        }
    }

    /// Check that every weight is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Configuration`] naming the first bad signal.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("build.policy.follow", self.follow),
            ("build.policy.like", self.like),
            ("build.policy.reply", self.reply),
            ("build.policy.repost", self.repost),
            ("build.policy.mention", self.mention),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(GraphError::config(
                    field,
                    value,
                    "must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }
}

/// How repeated observations of one ordered pair fold into an edge weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// Add all contributions.
    #[default]
    Sum,
    /// Keep the largest contribution.
    Max,
    /// Mean of all contributions.
    Average,
}

/// What to do with observations whose endpoints are not in the node set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Fail the build with an integrity error.
    #[default]
    Strict,
    /// Drop the observation and keep going.
    Lenient,
}

/// What to do with observations where `source == target`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfLoopPolicy {
    /// Silently drop them.
    #[default]
    Drop,
    /// Fail the build with an integrity error.
    Reject,
}

/// Options controlling [`GraphBuilder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Signal → weight mapping.
    #[serde(default)]
    pub policy: WeightPolicy,
    /// Duplicate-pair fold.
    #[serde(default)]
    pub combinator: Combinator,
    /// Unknown-endpoint handling.
    #[serde(default)]
    pub strictness: Strictness,
    /// Self-loop handling.
    #[serde(default)]
    pub self_loops: SelfLoopPolicy,
}

impl BuildOptions {
    /// Validate the weight policy.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Configuration`] for a negative or non-finite weight.
    pub fn validate(&self) -> Result<()> {
        self.policy.validate()
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Counters describing what the builder did with its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Observations consumed.
    pub observations: usize,
    /// Observations folded into an edge that already existed.
    pub merged: usize,
    /// Observations dropped because an endpoint was unknown (lenient mode).
    pub dropped_unknown: usize,
    /// Observations dropped because they were self-loops.
    pub dropped_self_loops: usize,
}

/// A borrowed view of one canonical edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeView<'a> {
    /// Source account id.
    pub source: &'a str,
    /// Target account id.
    pub target: &'a str,
    /// Aggregated weight.
    pub weight: f64,
}

/// The canonical, immutable relationship graph.
///
/// Nodes live in a petgraph arena addressed by [`NodeIndex`]; edges carry
/// their aggregated `f64` weight. There is at most one edge per ordered
/// pair and no self-loops.
#[derive(Debug, Clone)]
pub struct Graph {
    graph: DiGraph<GraphNode, f64>,
    node_map: HashMap<String, NodeIndex>,
    content_hash: String,
    report: BuildReport,
}

impl Graph {
    /// Return the number of nodes (accounts).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of canonical edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` when the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Look up the `NodeIndex` for an account id.
    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Return the account id for a node index.
    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(|n| n.id.as_str())
    }

    /// Return the full node for an account id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index(id).and_then(|idx| self.graph.node_weight(idx))
    }

    /// Iterate nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.raw_nodes().iter().map(|n| &n.weight)
    }

    /// Iterate canonical edges in insertion (sorted) order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.graph.edge_references().map(|e| EdgeView {
            source: self.graph[e.source()].id.as_str(),
            target: self.graph[e.target()].id.as_str(),
            weight: *e.weight(),
        })
    }

    /// Weight of the edge `source → target`, if present.
    #[must_use]
    pub fn edge_weight(&self, source: &str, target: &str) -> Option<f64> {
        let a = self.node_index(source)?;
        let b = self.node_index(target)?;
        self.graph
            .find_edge(a, b)
            .and_then(|e| self.graph.edge_weight(e))
            .copied()
    }

    /// Returns `true` if every edge weighs exactly 1.0.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_unit_weighted(&self) -> bool {
        self.graph.raw_edges().iter().all(|e| e.weight == 1.0)
    }

    /// BLAKE3 hash of nodes and weighted edges, `blake3:<hex>`.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// What the builder dropped or merged while producing this graph.
    #[must_use]
    pub const fn build_report(&self) -> &BuildReport {
        &self.report
    }

    /// Borrow the underlying petgraph arena.
    #[must_use]
    pub const fn petgraph(&self) -> &DiGraph<GraphNode, f64> {
        &self.graph
    }

    /// Map a per-index value vector onto account ids.
    pub(crate) fn by_id<T: Copy>(&self, values: &[T]) -> BTreeMap<String, T> {
        self.graph
            .node_indices()
            .map(|idx| (self.graph[idx].id.clone(), values[idx.index()]))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// GraphBuilder
// ---------------------------------------------------------------------------

/// Accumulates nodes and observations, then produces a [`Graph`].
///
/// `build` consumes the builder, so a finished graph can never be mutated
/// through the builder that produced it.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    options: BuildOptions,
    nodes: Vec<GraphNode>,
    observations: Vec<Observation>,
}

impl GraphBuilder {
    /// Create a builder with the given options.
    #[must_use]
    pub const fn new(options: BuildOptions) -> Self {
        Self {
            options,
            nodes: Vec::new(),
            observations: Vec::new(),
        }
    }

    /// Add one node.
    pub fn add_node(&mut self, node: GraphNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    /// Add nodes by id.
    pub fn add_nodes<I, S>(&mut self, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes.extend(ids.into_iter().map(GraphNode::new));
        self
    }

    /// Record one observation.
    pub fn observe(&mut self, observation: Observation) -> &mut Self {
        self.observations.push(observation);
        self
    }

    /// Record many observations.
    pub fn observe_all<I>(&mut self, observations: I) -> &mut Self
    where
        I: IntoIterator<Item = Observation>,
    {
        self.observations.extend(observations);
        self
    }

    /// Fold everything recorded so far into a canonical [`Graph`].
    ///
    /// # Errors
    ///
    /// - [`GraphError::Configuration`] if the weight policy is invalid.
    /// - [`GraphError::Integrity`] for a duplicate node id, an unknown
    ///   endpoint in strict mode, a self-loop under
    ///   [`SelfLoopPolicy::Reject`], an invalid weight contribution, or a
    ///   folded edge weight that overflows to infinity.
    #[instrument(skip(self), fields(nodes = self.nodes.len(), observations = self.observations.len()))]
    pub fn build(self) -> Result<Graph> {
        self.options.validate()?;

        let mut graph = DiGraph::<GraphNode, f64>::with_capacity(self.nodes.len(), 0);
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(self.nodes.len());

        for node in self.nodes {
            if node_map.contains_key(&node.id) {
                return Err(IntegrityViolation::DuplicateNode(node.id).into());
            }
            let id = node.id.clone();
            let idx = graph.add_node(node);
            node_map.insert(id, idx);
        }

        let mut report = BuildReport {
            observations: self.observations.len(),
            ..BuildReport::default()
        };

        // Keyed by (source, target) index so edges are inserted in a stable order.
        let mut folded: BTreeMap<(NodeIndex, NodeIndex), Fold> = BTreeMap::new();

        for obs in &self.observations {
            let Some((a, b)) = resolve(&node_map, obs, self.options.strictness)? else {
                report.dropped_unknown += 1;
                continue;
            };

            if a == b {
                if self.options.self_loops == SelfLoopPolicy::Reject {
                    return Err(IntegrityViolation::SelfLoop(obs.source.clone()).into());
                }
                report.dropped_self_loops += 1;
                continue;
            }

            let contribution = self.options.policy.weight(obs.signal) * obs.weight.unwrap_or(1.0);
            if !contribution.is_finite() || contribution < 0.0 {
                return Err(IntegrityViolation::InvalidWeight {
                    from: obs.source.clone(),
                    to: obs.target.clone(),
                    weight: contribution,
                }
                .into());
            }

            match folded.get_mut(&(a, b)) {
                Some(fold) => {
                    fold.push(contribution);
                    report.merged += 1;
                }
                None => {
                    folded.insert((a, b), Fold::new(contribution));
                }
            }
        }

        for ((a, b), fold) in folded {
            let weight = fold.finish(self.options.combinator);
            // Finite contributions can still overflow once summed.
            if !weight.is_finite() {
                return Err(IntegrityViolation::InvalidWeight {
                    from: graph[a].id.clone(),
                    to: graph[b].id.clone(),
                    weight,
                }
                .into());
            }
            graph.add_edge(a, b, weight);
        }

        if report.dropped_unknown > 0 || report.dropped_self_loops > 0 {
            debug!(
                dropped_unknown = report.dropped_unknown,
                dropped_self_loops = report.dropped_self_loops,
                "observations dropped during build"
            );
        }

        let content_hash = compute_content_hash(&graph);

        Ok(Graph {
            graph,
            node_map,
            content_hash,
            report,
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Running fold of one ordered pair's contributions.
#[derive(Debug, Clone, Copy)]
struct Fold {
    sum: f64,
    max: f64,
    count: usize,
}

impl Fold {
    const fn new(first: f64) -> Self {
        Self {
            sum: first,
            max: first,
            count: 1,
        }
    }

    fn push(&mut self, contribution: f64) {
        self.sum += contribution;
        self.max = self.max.max(contribution);
        self.count += 1;
    }

    fn finish(self, combinator: Combinator) -> f64 {
        match combinator {
            Combinator::Sum => self.sum,
            Combinator::Max => self.max,
            Combinator::Average => self.sum / self.count as f64,
        }
    }
}

/// Resolve both endpoints of an observation.
///
/// Returns `Ok(None)` when an endpoint is unknown and strictness is lenient.
fn resolve(
    node_map: &HashMap<String, NodeIndex>,
    obs: &Observation,
    strictness: Strictness,
) -> Result<Option<(NodeIndex, NodeIndex)>> {
    let source = node_map.get(&obs.source).copied();
    let target = node_map.get(&obs.target).copied();

    match (source, target) {
        (Some(a), Some(b)) => Ok(Some((a, b))),
        _ if strictness == Strictness::Lenient => Ok(None),
        (None, _) => Err(IntegrityViolation::UnknownNode {
            from: obs.source.clone(),
            to: obs.target.clone(),
            missing: obs.source.clone(),
        }
        .into()),
        (Some(_), None) => Err(IntegrityViolation::UnknownNode {
            from: obs.source.clone(),
            to: obs.target.clone(),
            missing: obs.target.clone(),
        }
        .into()),
    }
}

/// BLAKE3 over sorted node ids, then sorted `(source, target, weight)` triples.
fn compute_content_hash(graph: &DiGraph<GraphNode, f64>) -> String {
    let mut ids: Vec<&str> = graph.raw_nodes().iter().map(|n| n.weight.id.as_str()).collect();
    ids.sort_unstable();

    let mut edges: Vec<(&str, &str, u64)> = graph
        .edge_references()
        .map(|e| {
            (
                graph[e.source()].id.as_str(),
                graph[e.target()].id.as_str(),
                e.weight().to_bits(),
            )
        })
        .collect();
    edges.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for id in ids {
        hasher.update(id.as_bytes());
        hasher.update(b"\x00");
    }
    hasher.update(b"\x01");
    for (source, target, bits) in edges {
        hasher.update(source.as_bytes());
        hasher.update(b"\x00");
        hasher.update(target.as_bytes());
        hasher.update(b"\x00");
        hasher.update(&bits.to_le_bytes());
    }
    format!("blake3:{}", hasher.finalize())
}

const fn default_follow() -> f64 {
    1.0
}

const fn default_like() -> f64 {
    0.5
}

const fn default_reply() -> f64 {
    2.0
}

const fn default_repost() -> f64 {
    1.5
}

const fn default_mention() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(nodes: &[&str]) -> GraphBuilder {
        let mut b = GraphBuilder::new(BuildOptions::default());
        b.add_nodes(nodes.iter().copied());
        b
    }

    #[test]
    fn empty_input_produces_empty_graph() {
        let graph = builder(&[]).build().expect("build graph");
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.is_empty());
        assert!(graph.content_hash().starts_with("blake3:"));
    }

    #[test]
    fn nodes_without_observations_are_nodes_only() {
        let graph = builder(&["alice", "bob"]).build().expect("build graph");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.node_index("alice").is_some());
        assert!(graph.node_index("bob").is_some());
    }

    #[test]
    fn follow_and_like_fold_into_one_edge() {
        let mut b = builder(&["A", "B"]);
        b.observe(Observation::new("A", "B", Signal::Follow))
            .observe(Observation::new("A", "B", Signal::Like));
        let graph = b.build().expect("build graph");

        assert_eq!(graph.edge_count(), 1, "no duplicate edges");
        let w = graph.edge_weight("A", "B").expect("A -> B exists");
        assert!((w - 1.5).abs() < 1e-12, "follow + like = 1.5, got {w}");
        assert_eq!(graph.build_report().merged, 1);
    }

    #[test]
    fn edge_direction_is_preserved() {
        let mut b = builder(&["A", "B"]);
        b.observe(Observation::new("A", "B", Signal::Reply));
        let graph = b.build().expect("build graph");

        assert_eq!(graph.edge_weight("A", "B"), Some(2.0));
        assert_eq!(graph.edge_weight("B", "A"), None, "no reverse edge");
    }

    #[test]
    fn raw_weight_multiplies_policy_weight() {
        let mut b = builder(&["A", "B"]);
        b.observe(Observation::new("A", "B", Signal::Like).with_weight(4.0));
        let graph = b.build().expect("build graph");
        assert_eq!(graph.edge_weight("A", "B"), Some(2.0));
    }

    #[test]
    fn max_combinator_keeps_largest_contribution() {
        let mut b = GraphBuilder::new(BuildOptions {
            combinator: Combinator::Max,
            ..BuildOptions::default()
        });
        b.add_nodes(["A", "B"])
            .observe(Observation::new("A", "B", Signal::Like))
            .observe(Observation::new("A", "B", Signal::Reply))
            .observe(Observation::new("A", "B", Signal::Follow));
        let graph = b.build().expect("build graph");
        assert_eq!(graph.edge_weight("A", "B"), Some(2.0));
    }

    #[test]
    fn average_combinator_takes_mean() {
        let mut b = GraphBuilder::new(BuildOptions {
            combinator: Combinator::Average,
            ..BuildOptions::default()
        });
        b.add_nodes(["A", "B"])
            .observe(Observation::new("A", "B", Signal::Like))
            .observe(Observation::new("A", "B", Signal::Repost));
        let graph = b.build().expect("build graph");
        assert_eq!(graph.edge_weight("A", "B"), Some(1.0));
    }

    #[test]
    fn strict_mode_rejects_unknown_target() {
        let mut b = builder(&["alice"]);
        b.observe(Observation::new("alice", "ghost", Signal::Follow));
        let err = b.build().expect_err("unknown target must fail");

        assert_eq!(
            err,
            GraphError::Integrity(IntegrityViolation::UnknownNode {
                from: "alice".to_string(),
                to: "ghost".to_string(),
                missing: "ghost".to_string(),
            })
        );
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn strict_mode_names_missing_source() {
        let mut b = builder(&["bob"]);
        b.observe(Observation::new("ghost", "bob", Signal::Mention));
        let err = b.build().expect_err("unknown source must fail");
        assert!(err.to_string().contains("unknown node ghost"), "got: {err}");
    }

    #[test]
    fn lenient_mode_drops_unknown_endpoints() {
        let mut b = GraphBuilder::new(BuildOptions {
            strictness: Strictness::Lenient,
            ..BuildOptions::default()
        });
        b.add_nodes(["A", "B"])
            .observe(Observation::new("A", "B", Signal::Follow))
            .observe(Observation::new("A", "ghost", Signal::Follow));
        let graph = b.build().expect("lenient build succeeds");

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.build_report().dropped_unknown, 1);
    }

    #[test]
    fn self_loops_dropped_by_default() {
        let mut b = builder(&["A", "B"]);
        b.observe(Observation::new("A", "A", Signal::Like))
            .observe(Observation::new("A", "B", Signal::Like));
        let graph = b.build().expect("build graph");

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.build_report().dropped_self_loops, 1);
    }

    #[test]
    fn self_loops_rejected_when_configured() {
        let mut b = GraphBuilder::new(BuildOptions {
            self_loops: SelfLoopPolicy::Reject,
            ..BuildOptions::default()
        });
        b.add_nodes(["A"])
            .observe(Observation::new("A", "A", Signal::Like));
        let err = b.build().expect_err("self-loop must fail");
        assert_eq!(
            err,
            GraphError::Integrity(IntegrityViolation::SelfLoop("A".to_string()))
        );
    }

    #[test]
    fn duplicate_node_ids_rejected() {
        let err = builder(&["A", "B", "A"])
            .build()
            .expect_err("duplicate id must fail");
        assert_eq!(
            err,
            GraphError::Integrity(IntegrityViolation::DuplicateNode("A".to_string()))
        );
    }

    #[test]
    fn negative_raw_weight_rejected() {
        let mut b = builder(&["A", "B"]);
        b.observe(Observation::new("A", "B", Signal::Follow).with_weight(-1.0));
        let err = b.build().expect_err("negative weight must fail");
        assert!(err.is_integrity());
        assert!(err.to_string().contains("A -> B"), "got: {err}");
    }

    #[test]
    fn overflowing_sum_rejected() {
        let mut b = builder(&["A", "B"]);
        b.observe(Observation::new("A", "B", Signal::Follow).with_weight(1e308))
            .observe(Observation::new("A", "B", Signal::Follow).with_weight(1e308));
        let err = b.build().expect_err("folded weight overflows");
        assert!(
            matches!(
                err,
                GraphError::Integrity(IntegrityViolation::InvalidWeight { ref from, ref to, weight })
                    if from == "A" && to == "B" && weight.is_infinite()
            ),
            "got: {err}"
        );
    }

    #[test]
    fn huge_weights_fold_with_max() {
        let mut b = GraphBuilder::new(BuildOptions {
            combinator: Combinator::Max,
            ..BuildOptions::default()
        });
        b.add_nodes(["A", "B"])
            .observe(Observation::new("A", "B", Signal::Follow).with_weight(1e308))
            .observe(Observation::new("A", "B", Signal::Follow).with_weight(1e308));
        let graph = b.build().expect("max does not overflow");
        assert_eq!(graph.edge_weight("A", "B"), Some(1e308));
    }

    #[test]
    fn invalid_policy_is_configuration_error() {
        let mut policy = WeightPolicy::default();
        policy.reply = f64::NAN;
        let b = GraphBuilder::new(BuildOptions {
            policy,
            ..BuildOptions::default()
        });
        let err = b.build().expect_err("NaN policy must fail");
        assert!(err.is_configuration());
        assert!(err.to_string().contains("build.policy.reply"));
    }

    #[test]
    fn content_hash_changes_with_edges() {
        let empty_hash = builder(&["A", "B"])
            .build()
            .expect("build graph")
            .content_hash()
            .to_string();

        let mut b = builder(&["A", "B"]);
        b.observe(Observation::new("A", "B", Signal::Follow));
        let with_edge = b.build().expect("build graph");

        assert_ne!(empty_hash, with_edge.content_hash());
    }

    #[test]
    fn content_hash_ignores_observation_order() {
        let mut first = builder(&["A", "B", "C"]);
        first
            .observe(Observation::new("A", "B", Signal::Follow))
            .observe(Observation::new("B", "C", Signal::Like));

        let mut second = builder(&["C", "B", "A"]);
        second
            .observe(Observation::new("B", "C", Signal::Like))
            .observe(Observation::new("A", "B", Signal::Follow));

        assert_eq!(
            first.build().expect("build").content_hash(),
            second.build().expect("build").content_hash()
        );
    }

    #[test]
    fn unit_weight_detection() {
        let mut b = builder(&["A", "B", "C"]);
        b.observe(Observation::new("A", "B", Signal::Follow))
            .observe(Observation::new("B", "C", Signal::Mention));
        assert!(b.build().expect("build").is_unit_weighted());

        let mut b = builder(&["A", "B"]);
        b.observe(Observation::new("A", "B", Signal::Reply));
        assert!(!b.build().expect("build").is_unit_weighted());
    }

    #[test]
    fn attributes_are_carried() {
        let mut b = GraphBuilder::default();
        b.add_node(GraphNode::new("alice").with_attributes(NodeAttributes {
            followers: Some(120),
            ..NodeAttributes::default()
        }));
        let graph = b.build().expect("build graph");
        assert_eq!(
            graph.node("alice").and_then(|n| n.attributes.followers),
            Some(120)
        );
    }
}
