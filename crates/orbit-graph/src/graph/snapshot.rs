//! Serialized relationship snapshots.
//!
//! A snapshot is what relationship collaborators hand over: the node set
//! and every observation gathered for it, as one JSON document.
//!
//! ```json
//! {
//!   "nodes": [{ "id": "alice" }, { "id": "bob", "attributes": { "followers": 42 } }],
//!   "observations": [
//!     { "source": "alice", "target": "bob", "signal": "follow" },
//!     { "source": "alice", "target": "bob", "signal": "like", "weight": 3 }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::graph::build::{BuildOptions, GraphBuilder, GraphNode, Observation};

/// A node set plus the observations collected for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Accounts.
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    /// Relationship observations between accounts.
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl Snapshot {
    /// Parse a snapshot from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or does not match the schema.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parse relationship snapshot")
    }

    /// Read and parse a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Seed a [`GraphBuilder`] with this snapshot's contents.
    #[must_use]
    pub fn into_builder(self, options: BuildOptions) -> GraphBuilder {
        let mut builder = GraphBuilder::new(options);
        for node in self.nodes {
            builder.add_node(node);
        }
        builder.observe_all(self.observations);
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build::Signal;

    const SAMPLE: &str = r#"{
        "nodes": [
            { "id": "alice" },
            { "id": "bob", "attributes": { "followers": 42, "display_name": "Bob" } }
        ],
        "observations": [
            { "source": "alice", "target": "bob", "signal": "follow" },
            { "source": "alice", "target": "bob", "signal": "like", "weight": 3 }
        ]
    }"#;

    #[test]
    fn parses_nodes_and_observations() {
        let snap = Snapshot::from_json(SAMPLE).expect("parse");
        assert_eq!(snap.nodes.len(), 2);
        assert_eq!(snap.nodes[1].attributes.followers, Some(42));
        assert_eq!(snap.observations[0].signal, Signal::Follow);
        assert_eq!(snap.observations[1].weight, Some(3.0));
    }

    #[test]
    fn snapshot_builds_canonical_graph() {
        let graph = Snapshot::from_json(SAMPLE)
            .expect("parse")
            .into_builder(BuildOptions::default())
            .build()
            .expect("build");
        // follow (1.0) + like (0.5 × 3)
        assert_eq!(graph.edge_weight("alice", "bob"), Some(2.5));
    }

    #[test]
    fn unknown_signal_is_parse_error() {
        let bad = r#"{ "nodes": [], "observations": [
            { "source": "a", "target": "b", "signal": "poke" }
        ] }"#;
        let err = Snapshot::from_json(bad).expect_err("unknown signal");
        assert!(format!("{err:#}").contains("poke"), "got: {err:#}");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, SAMPLE).expect("write");
        let snap = Snapshot::load(&path).expect("load");
        assert_eq!(snap.nodes.len(), 2);
    }

    #[test]
    fn load_missing_file_names_path() {
        let err = Snapshot::load(Path::new("/nonexistent/orbit.json")).expect_err("missing");
        assert!(err.to_string().contains("/nonexistent/orbit.json"));
    }
}
