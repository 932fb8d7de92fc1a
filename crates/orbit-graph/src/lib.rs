#![forbid(unsafe_code)]
//! orbit-graph library: influence, centrality and community metrics over a
//! social relationship graph.
//!
//! # Conventions
//!
//! - **Errors**: Library functions return [`Result`] with the typed
//!   [`GraphError`]. File loading ([`config::load_config`],
//!   [`graph::Snapshot::load`]) returns `anyhow::Result` with context.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).
//! - **Output**: Per-account maps are `BTreeMap<String, _>` so serialized
//!   output is stable.
//!
//! # Example
//!
//! ```rust
//! use orbit_graph::graph::{BuildOptions, GraphBuilder, Observation, Signal};
//! use orbit_graph::{MetricsOptions, compute_graph_metrics};
//!
//! let mut builder = GraphBuilder::new(BuildOptions::default());
//! builder
//!     .add_nodes(["alice", "bob", "carol"])
//!     .observe(Observation::new("alice", "bob", Signal::Follow))
//!     .observe(Observation::new("bob", "carol", Signal::Reply))
//!     .observe(Observation::new("carol", "alice", Signal::Like));
//! let graph = builder.build()?;
//!
//! let metrics = compute_graph_metrics(&graph, &MetricsOptions::default())?;
//! let total: f64 = metrics.pagerank.scores.values().sum();
//! assert!((total - 1.0).abs() < 1e-6);
//! # Ok::<(), orbit_graph::GraphError>(())
//! ```

pub mod cancel;
pub mod community;
pub mod config;
pub mod error;
pub mod facade;
pub mod graph;
pub mod metrics;
pub mod stats;
pub mod worker;

pub use cancel::CancelToken;
pub use config::{MetricsOptions, Settings, load_config};
pub use error::{GraphError, IntegrityViolation, Result, Stage};
pub use facade::{GraphMetrics, compute_graph_metrics, compute_graph_metrics_with_cancel};
pub use graph::{Graph, GraphBuilder};
pub use worker::MetricsWorker;
