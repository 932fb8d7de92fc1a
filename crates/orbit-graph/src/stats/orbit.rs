//! Orbit tiers: quantile bands of relationship strength.
//!
//! Every edge weight of one graph is sorted and cut into `tiers` bands of
//! (as near as possible) equal size. The cut points come from this graph's
//! own distribution, so "core" always means the strongest quarter of *this*
//! network's relationships, whatever its absolute weight scale.
//!
//! Cut `j` (for `j = 1 .. tiers − 1`) is the nearest-rank quantile
//! `sorted[ceil(j · n / tiers) − 1]`. A weight lands above every cut it
//! strictly exceeds, so ties resolve to the weaker tier. Tier 0 is the
//! strongest.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{GraphError, Result};
use crate::graph::Graph;

/// Largest accepted tier count.
pub const MAX_TIERS: usize = 100;

/// Tier names for the default count of 4, strongest first.
const DEFAULT_NAMES: [&str; 4] = ["core", "close", "casual", "periphery"];

/// Configuration for orbit tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitConfig {
    /// Number of tiers, `1 ..= MAX_TIERS`. Default: 4.
    #[serde(default = "default_tiers")]
    pub tiers: usize,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
        }
    }
}

impl OrbitConfig {
    /// # Errors
    ///
    /// Returns [`GraphError::Configuration`] if `tiers` is 0 or above
    /// [`MAX_TIERS`].
    pub fn validate(&self) -> Result<()> {
        if self.tiers == 0 {
            return Err(GraphError::config("orbit.tiers", self.tiers, "must be at least 1"));
        }
        if self.tiers > MAX_TIERS {
            return Err(GraphError::config(
                "orbit.tiers",
                self.tiers,
                "must be at most 100",
            ));
        }
        Ok(())
    }
}

const fn default_tiers() -> usize {
    4
}

/// A tier, identified by its rank (0 = strongest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitTier {
    /// 0 for the strongest tier.
    pub index: usize,
    /// `core`/`close`/`casual`/`periphery` for four tiers, `tier-N` otherwise.
    pub name: String,
}

/// Edge count and weight range of one tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitBand {
    /// The tier.
    pub tier: OrbitTier,
    /// Number of edges in the tier.
    pub edges: usize,
    /// Smallest weight in the tier, if any edge falls in it.
    pub min_weight: Option<f64>,
    /// Largest weight in the tier, if any edge falls in it.
    pub max_weight: Option<f64>,
}

/// Quantile cut points over one graph's edge weights.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitTiers {
    /// Edge weights, ascending.
    sorted: Vec<f64>,
    /// `tiers − 1` ascending cut points (fewer only when there are no edges).
    cuts: Vec<f64>,
    tiers: usize,
}

impl OrbitTiers {
    /// Compute tiers from the weights of `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Configuration`] if `config` fails validation.
    #[instrument(skip(graph, config), fields(edges = graph.edge_count()))]
    pub fn from_graph(graph: &Graph, config: &OrbitConfig) -> Result<Self> {
        Self::from_weights(graph.edges().map(|e| e.weight), config)
    }

    /// Compute tiers from an arbitrary weight sample.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Configuration`] if `config` fails validation.
    pub fn from_weights<I>(weights: I, config: &OrbitConfig) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        config.validate()?;
        let mut sorted: Vec<f64> = weights.into_iter().collect();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let cuts = if n == 0 {
            Vec::new()
        } else {
            (1..config.tiers)
                .map(|j| sorted[(j * n).div_ceil(config.tiers).max(1) - 1])
                .collect()
        };
        debug!(weights = n, tiers = config.tiers, ?cuts, "orbit cut points");

        Ok(Self {
            sorted,
            cuts,
            tiers: config.tiers,
        })
    }

    /// Number of tiers.
    #[must_use]
    pub const fn tier_count(&self) -> usize {
        self.tiers
    }

    /// Ascending cut points.
    #[must_use]
    pub fn cuts(&self) -> &[f64] {
        &self.cuts
    }

    /// The tier a weight falls into.
    #[must_use]
    pub fn tier_of(&self, weight: f64) -> OrbitTier {
        let above = self.cuts.iter().filter(|&&cut| weight > cut).count();
        self.tier(self.tiers - 1 - above)
    }

    /// Edge counts per tier, strongest first.
    #[must_use]
    pub fn distribution(&self) -> Vec<OrbitBand> {
        let mut bands: Vec<OrbitBand> = (0..self.tiers)
            .map(|index| OrbitBand {
                tier: self.tier(index),
                edges: 0,
                min_weight: None,
                max_weight: None,
            })
            .collect();
        for &w in &self.sorted {
            let band = &mut bands[self.tier_of(w).index];
            band.edges += 1;
            band.min_weight = Some(band.min_weight.map_or(w, |m| m.min(w)));
            band.max_weight = Some(band.max_weight.map_or(w, |m| m.max(w)));
        }
        bands
    }

    fn tier(&self, index: usize) -> OrbitTier {
        let name = if self.tiers == DEFAULT_NAMES.len() {
            DEFAULT_NAMES[index].to_string()
        } else {
            format!("tier-{}", index + 1)
        };
        OrbitTier { index, name }
    }
}
