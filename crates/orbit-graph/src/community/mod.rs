//! Community detection.
//!
//! # Overview
//!
//! Accounts that engage with each other more than their overall activity
//! would predict form a community. [`detect_communities`] partitions the
//! graph by greedily maximising modularity (see [`modularity`]), starting
//! from singletons and coarsening found communities into super-nodes
//! (Louvain).
//!
//! # Determinism
//!
//! Without a seed, nodes are visited in graph insertion order. With
//! [`CommunityConfig::seed`], the order is a seeded shuffle. Either way the
//! first-level order is returned in [`CommunityResult::visit_order`], so any
//! run can be reproduced and audited.
//!
//! # Conventions
//!
//! - A graph with zero total edge weight yields all-singleton communities
//!   and modularity 0.
//! - Community ids are dense (`0..len`) and ordered by each community's
//!   smallest member id; members are sorted.

mod louvain;
pub mod modularity;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::cancel::CancelToken;
use crate::error::{GraphError, Result, Stage};
use crate::graph::Graph;

pub use modularity::modularity;
use modularity::{Symmetric, validate_resolution};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for [`detect_communities`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommunityConfig {
    /// Modularity resolution `γ`. Higher values favour smaller communities.
    /// Default: 1.0.
    #[serde(default = "default_resolution")]
    pub resolution: f64,
    /// Seed for a shuffled visit order. Default: none (insertion order).
    #[serde(default)]
    pub seed: Option<u64>,
    /// Coarsen communities into super-nodes between levels. Default: true.
    #[serde(default = "default_coarsen")]
    pub coarsen: bool,
    /// Maximum coarsening levels. Default: 10.
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
    /// Maximum local-move passes per level. Default: 100.
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            seed: None,
            coarsen: default_coarsen(),
            max_levels: default_max_levels(),
            max_passes: default_max_passes(),
        }
    }
}

impl CommunityConfig {
    /// Set the seed for a reproducible shuffled visit order.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the resolution parameter.
    #[must_use]
    pub const fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Run a single level without coarsening.
    #[must_use]
    pub const fn without_coarsening(mut self) -> Self {
        self.coarsen = false;
        self
    }

    /// Check every parameter against its documented range.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Configuration`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        validate_resolution(self.resolution)?;
        if self.max_levels == 0 {
            return Err(GraphError::config(
                "community.max_levels",
                self.max_levels,
                "must be at least 1",
            ));
        }
        if self.max_passes == 0 {
            return Err(GraphError::config(
                "community.max_passes",
                self.max_passes,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

const fn default_resolution() -> f64 {
    1.0
}

const fn default_coarsen() -> bool {
    true
}

const fn default_max_levels() -> usize {
    10
}

const fn default_max_passes() -> usize {
    100
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One community of the partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    /// Dense community id.
    pub id: usize,
    /// Member account ids, sorted.
    pub members: Vec<String>,
    /// This community's term of the global modularity sum.
    pub modularity: f64,
}

/// A partition of every account into communities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityResult {
    /// Communities, ordered by id.
    pub communities: Vec<Community>,
    /// Account id → community id.
    pub assignment: BTreeMap<String, usize>,
    /// Global modularity (sum of community contributions).
    pub modularity: f64,
    /// Local-move passes over all levels.
    pub passes: usize,
    /// Coarsening levels run.
    pub levels: usize,
    /// First-level node visit order.
    pub visit_order: Vec<String>,
    /// Seed that produced `visit_order`, if shuffled.
    pub seed: Option<u64>,
}

impl CommunityResult {
    /// Number of communities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.communities.len()
    }

    /// Returns `true` if there are no communities (empty graph).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// The community containing `id`.
    #[must_use]
    pub fn community_of(&self, id: &str) -> Option<&Community> {
        self.assignment.get(id).and_then(|&c| self.communities.get(c))
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Partition the graph into communities.
///
/// # Errors
///
/// Returns [`GraphError::Configuration`] if `config` fails validation.
pub fn detect_communities(graph: &Graph, config: &CommunityConfig) -> Result<CommunityResult> {
    detect_communities_with_cancel(graph, config, &CancelToken::new())
}

/// Cancellable community detection; the token is checked before every
/// local-move pass.
///
/// # Errors
///
/// - [`GraphError::Configuration`] if `config` fails validation.
/// - [`GraphError::Cancelled`] if `cancel` fires.
#[instrument(skip(graph, config, cancel), fields(nodes = graph.node_count()))]
pub fn detect_communities_with_cancel(
    graph: &Graph,
    config: &CommunityConfig,
    cancel: &CancelToken,
) -> Result<CommunityResult> {
    config.validate()?;
    cancel.check(Stage::Community)?;

    let n = graph.node_count();
    let base = Symmetric::from_graph(graph);

    let (membership, count, passes, levels, order) = if base.two_m > 0.0 {
        let outcome = louvain::run(&base, config, cancel)?;
        (
            outcome.membership,
            outcome.count,
            outcome.passes,
            outcome.levels,
            outcome.visit_order,
        )
    } else {
        debug!("no edge weight, every account is its own community");
        ((0..n).collect(), n, 0, 0, (0..n).collect())
    };

    let contributions = base.contributions(&membership, count, config.resolution);
    let result = assemble(graph, &membership, &contributions, passes, levels, &order, config.seed);

    debug!(
        communities = result.len(),
        modularity = result.modularity,
        passes,
        levels,
        "communities detected"
    );
    Ok(result)
}

fn assemble(
    graph: &Graph,
    membership: &[usize],
    contributions: &[f64],
    passes: usize,
    levels: usize,
    order: &[usize],
    seed: Option<u64>,
) -> CommunityResult {
    let ids: Vec<&str> = graph.nodes().map(|node| node.id.as_str()).collect();

    let mut groups: Vec<(Vec<String>, f64)> = contributions.iter().map(|&q| (Vec::new(), q)).collect();
    for (i, &c) in membership.iter().enumerate() {
        groups[c].0.push(ids[i].to_string());
    }
    for (members, _) in &mut groups {
        members.sort();
    }
    groups.retain(|(members, _)| !members.is_empty());
    groups.sort_by(|a, b| a.0[0].cmp(&b.0[0]));

    let communities: Vec<Community> = groups
        .into_iter()
        .enumerate()
        .map(|(id, (members, modularity))| Community {
            id,
            members,
            modularity,
        })
        .collect();

    let assignment = communities
        .iter()
        .flat_map(|c| c.members.iter().map(move |m| (m.clone(), c.id)))
        .collect();

    CommunityResult {
        modularity: communities.iter().map(|c| c.modularity).sum(),
        communities,
        assignment,
        passes,
        levels,
        visit_order: order.iter().map(|&i| ids[i].to_string()).collect(),
        seed,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
