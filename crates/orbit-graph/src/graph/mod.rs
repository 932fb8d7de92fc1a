//! Relationship graph module.
//!
//! # Overview
//!
//! This module turns raw relationship observations into the canonical
//! [`Graph`] every metric in the crate consumes.
//!
//! ## Pipeline
//!
//! ```text
//! Snapshot { nodes, observations }      (JSON from a collaborator)
//!        ↓  snapshot::Snapshot::into_builder()
//! GraphBuilder
//!        ↓  build::GraphBuilder::build()
//! Graph (petgraph DiGraph<GraphNode, f64>, deduplicated, no self-loops)
//! ```
//!
//! ## Typical Usage
//!
//! ```rust
//! use orbit_graph::graph::{BuildOptions, GraphBuilder, Observation, Signal};
//!
//! let mut builder = GraphBuilder::new(BuildOptions::default());
//! builder
//!     .add_nodes(["alice", "bob"])
//!     .observe(Observation::new("alice", "bob", Signal::Follow))
//!     .observe(Observation::new("alice", "bob", Signal::Like));
//! let graph = builder.build()?;
//!
//! assert_eq!(graph.edge_count(), 1);
//! assert_eq!(graph.edge_weight("alice", "bob"), Some(1.5));
//! # Ok::<(), orbit_graph::GraphError>(())
//! ```

pub mod build;
pub mod snapshot;

// Re-export primary types at module level for convenience.
pub use build::{
    BuildOptions, BuildReport, Combinator, EdgeView, Graph, GraphBuilder, GraphNode,
    NodeAttributes, Observation, SelfLoopPolicy, Signal, Strictness, WeightPolicy,
};
pub use snapshot::Snapshot;
