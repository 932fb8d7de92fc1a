//! Engine configuration and the optional `orbit.toml` settings file.
//!
//! ```toml
//! [build]
//! combinator = "max"
//! strictness = "lenient"
//!
//! [build.policy]
//! reply = 3.0
//!
//! [metrics.pagerank]
//! damping = 0.9
//!
//! [metrics.betweenness.mode]
//! kind = "sampled"
//! pivots = 64
//! seed = 7
//!
//! [metrics.orbit]
//! tiers = 5
//! ```
//!
//! Every key is optional; missing tables and fields take their documented
//! defaults.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::community::CommunityConfig;
use crate::error::Result;
use crate::graph::BuildOptions;
use crate::metrics::betweenness::BetweennessConfig;
use crate::metrics::pagerank::PageRankConfig;
use crate::stats::OrbitConfig;

/// Options for [`crate::compute_graph_metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsOptions {
    #[serde(default)]
    pub pagerank: PageRankConfig,
    #[serde(default)]
    pub betweenness: BetweennessConfig,
    #[serde(default)]
    pub community: CommunityConfig,
    #[serde(default)]
    pub orbit: OrbitConfig,
}

impl MetricsOptions {
    /// Validate every nested configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`crate::GraphError::Configuration`] found.
    pub fn validate(&self) -> Result<()> {
        self.pagerank.validate()?;
        self.betweenness.validate()?;
        self.community.validate()?;
        self.orbit.validate()
    }

    /// BLAKE3 hash of the canonical JSON form, `blake3:<hex>`.
    ///
    /// Paired with [`crate::graph::Graph::content_hash`] this keys an
    /// external metrics cache.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        // Plain numbers and enums; serialization does not fail.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        format!("blake3:{}", blake3::hash(&canonical).to_hex())
    }
}

/// Contents of an `orbit.toml` settings file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub build: BuildOptions,
    #[serde(default)]
    pub metrics: MetricsOptions,
}

impl Settings {
    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value has the wrong type.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str::<Self>(content).context("parse orbit settings")
    }

    /// Validate build and metrics options.
    ///
    /// # Errors
    ///
    /// Returns the first [`crate::GraphError::Configuration`] found.
    pub fn validate(&self) -> Result<()> {
        self.build.validate()?;
        self.metrics.validate()
    }
}

/// Load settings from `path`, or defaults if the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed, or fails
/// validation.
pub fn load_config(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let settings = Settings::from_toml(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(settings)
}
