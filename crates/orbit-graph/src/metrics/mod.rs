//! Centrality and influence metrics for the relationship graph.
//!
//! # Overview
//!
//! Each metric answers a different question about an account's position:
//!
//! - **Degree centrality** (`degree`): How many accounts does it engage
//!   with, and how many engage with it?
//! - **Betweenness centrality** (`betweenness`): Which accounts broker
//!   attention between otherwise separate audiences?
//! - **PageRank** (`pagerank`): Which accounts attract engagement from
//!   other influential accounts?
//!
//! # Usage
//!
//! Every metric is a free function over a built [`Graph`](crate::graph::Graph)
//! and returns scores keyed by account id. Each has a `*_with_cancel` form
//! that takes a [`CancelToken`](crate::cancel::CancelToken).
//!
//! ```rust
//! use orbit_graph::graph::{BuildOptions, GraphBuilder, Observation, Signal};
//! use orbit_graph::metrics::betweenness::{betweenness_centrality, BetweennessConfig};
//! use orbit_graph::metrics::degree::degree_centrality;
//! use orbit_graph::metrics::pagerank::{pagerank, PageRankConfig};
//!
//! let mut builder = GraphBuilder::new(BuildOptions::default());
//! builder
//!     .add_nodes(["a", "b", "c"])
//!     .observe(Observation::new("a", "b", Signal::Follow))
//!     .observe(Observation::new("b", "c", Signal::Follow));
//! let graph = builder.build()?;
//!
//! let dc = degree_centrality(&graph);
//! let bc = betweenness_centrality(&graph, &BetweennessConfig::default())?;
//! let pr = pagerank(&graph, &PageRankConfig::default())?;
//!
//! assert_eq!(dc.out_degree["a"], 1);
//! assert!(bc.raw["b"] > 0.0);
//! assert!(pr.converged);
//! # Ok::<(), orbit_graph::GraphError>(())
//! ```

pub mod betweenness;
pub mod degree;
pub mod pagerank;
