//! Error types for graph construction and metric computation.
//!
//! Three kinds of failure exist, and all of them are detected either when
//! the graph is built or when a computation is entered:
//!
//! - [`GraphError::Integrity`]: the input violates a structural invariant
//!   (unknown endpoint, duplicate node, invalid weight, empty graph).
//! - [`GraphError::Configuration`]: an option is outside its valid range.
//! - [`GraphError::Cancelled`]: the caller's [`CancelToken`] fired while a
//!   long-running pass was in progress.
//!
//! Numerical edge cases (singleton graphs, dangling PageRank nodes, zero
//! total edge weight) are never errors; each algorithm defines its own
//! convention for them.
//!
//! [`CancelToken`]: crate::cancel::CancelToken

use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors produced by the graph engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// The graph or its input observations violate an invariant.
    #[error("graph integrity violated: {0}")]
    Integrity(#[from] IntegrityViolation),

    /// A configuration parameter is invalid.
    #[error("invalid configuration: {field} = {value} ({reason})")]
    Configuration {
        /// Dotted path of the offending option, e.g. `pagerank.damping`.
        field: &'static str,
        /// The rejected value, rendered for display.
        value: String,
        /// The constraint the value failed.
        reason: &'static str,
    },

    /// A cancellation signal was observed between iterations.
    #[error("computation cancelled during {stage}")]
    Cancelled {
        /// The stage that observed the signal.
        stage: Stage,
    },
}

impl GraphError {
    pub(crate) fn config(field: &'static str, value: impl fmt::Display, reason: &'static str) -> Self {
        Self::Configuration {
            field,
            value: value.to_string(),
            reason,
        }
    }

    /// Returns `true` for [`GraphError::Integrity`].
    #[must_use]
    pub const fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }

    /// Returns `true` for [`GraphError::Configuration`].
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns `true` for [`GraphError::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// The specific structural invariant that was violated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityViolation {
    /// An observation references a node missing from the node set.
    #[error("edge {from} -> {to} references unknown node {missing}")]
    UnknownNode {
        /// Observation source id.
        from: String,
        /// Observation target id.
        to: String,
        /// Whichever endpoint is missing (the source if both are).
        missing: String,
    },

    /// The node set contains the same id twice.
    #[error("duplicate node id {0}")]
    DuplicateNode(String),

    /// A self-loop was supplied while self-loops are configured to be rejected.
    #[error("self-loop on node {0} is not allowed")]
    SelfLoop(String),

    /// A weight contribution was negative, NaN, or infinite.
    #[error("edge {from} -> {to} has invalid weight {weight}")]
    InvalidWeight {
        /// Observation source id.
        from: String,
        /// Observation target id.
        to: String,
        /// The offending contribution.
        weight: f64,
    },

    /// Metrics were requested for a graph with no nodes.
    #[error("metrics requested for an empty graph (zero nodes)")]
    EmptyGraph,

    /// A partition does not assign every graph node exactly once.
    #[error("partition {problem} node {node}")]
    Partition {
        /// `"misses"` or `"names unknown"`.
        problem: &'static str,
        /// The offending account id.
        node: String,
    },
}

/// A cancellation checkpoint inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Degree centrality.
    Degree,
    /// Brandes single-source passes.
    Betweenness,
    /// PageRank power iteration.
    PageRank,
    /// Modularity local-move passes.
    Community,
    /// Density, clustering and orbit tiers.
    Statistics,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Degree => "degree centrality",
            Self::Betweenness => "betweenness centrality",
            Self::PageRank => "pagerank",
            Self::Community => "community detection",
            Self::Statistics => "network statistics",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_node_message_names_edge_and_endpoint() {
        let err = GraphError::from(IntegrityViolation::UnknownNode {
            from: "alice".to_string(),
            to: "mallory".to_string(),
            missing: "mallory".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.contains("alice -> mallory"), "got: {msg}");
        assert!(msg.contains("unknown node mallory"), "got: {msg}");
        assert!(err.is_integrity());
    }

    #[test]
    fn configuration_message_names_field() {
        let err = GraphError::config("pagerank.damping", 1.5, "must be in [0, 1)");
        assert_eq!(
            err.to_string(),
            "invalid configuration: pagerank.damping = 1.5 (must be in [0, 1))"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn cancelled_message_names_stage() {
        let err = GraphError::Cancelled {
            stage: Stage::PageRank,
        };
        assert_eq!(err.to_string(), "computation cancelled during pagerank");
        assert!(err.is_cancelled());
    }
}
