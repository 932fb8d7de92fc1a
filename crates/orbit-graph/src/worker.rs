//! Background metric computation with cancellation.
//!
//! [`MetricsWorker::spawn`] moves a shared [`Graph`] onto a named thread and
//! runs [`compute_graph_metrics_with_cancel`] there. The caller keeps a
//! handle that can cancel the run, poll it, or block on the result.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::MetricsOptions;
use crate::error::Result;
use crate::facade::{GraphMetrics, compute_graph_metrics_with_cancel};
use crate::graph::Graph;

/// Handle to a metrics computation running on its own thread.
#[derive(Debug)]
pub struct MetricsWorker {
    cancel: CancelToken,
    handle: JoinHandle<Result<GraphMetrics>>,
}

impl MetricsWorker {
    /// Start computing metrics for `graph` on a new thread.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the OS refuses to create the thread.
    pub fn spawn(graph: Arc<Graph>, options: MetricsOptions) -> std::io::Result<Self> {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let handle = thread::Builder::new()
            .name("orbit-metrics".to_string())
            .spawn(move || {
                debug!(nodes = graph.node_count(), "metrics worker started");
                compute_graph_metrics_with_cancel(&graph, &options, &token)
            })?;
        Ok(Self { cancel, handle })
    }

    /// Request cancellation. The worker stops at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A clone of the worker's token, e.g. for a timeout thread.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Returns `true` once the computation has returned (or panicked).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the computation ends and return its result.
    ///
    /// # Errors
    ///
    /// Whatever [`compute_graph_metrics_with_cancel`] returned, including
    /// [`crate::GraphError::Cancelled`] after [`cancel`](Self::cancel).
    ///
    /// # Panics
    ///
    /// Re-raises a panic from the worker thread.
    pub fn join(self) -> Result<GraphMetrics> {
        match self.handle.join() {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BuildOptions, GraphBuilder, Observation, Signal};

    fn ring(n: usize) -> Arc<Graph> {
        let ids: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
        let mut b = GraphBuilder::new(BuildOptions::default());
        b.add_nodes(ids.iter().cloned());
        for i in 0..n {
            b.observe(Observation::new(ids[i].clone(), ids[(i + 1) % n].clone(), Signal::Follow));
        }
        Arc::new(b.build().expect("build"))
    }

    #[test]
    fn worker_returns_metrics() {
        let worker = MetricsWorker::spawn(ring(5), MetricsOptions::default()).expect("spawn");
        let metrics = worker.join().expect("metrics");
        assert_eq!(metrics.pagerank.scores.len(), 5);
        assert!(metrics.converged);
    }

    #[test]
    fn token_clone_shares_flag() {
        let worker = MetricsWorker::spawn(ring(3), MetricsOptions::default()).expect("spawn");
        let token = worker.cancel_token();
        worker.cancel();
        assert!(token.is_cancelled());
        // The run may already be done; either outcome is valid, but a
        // cancelled one must be reported as such.
        if let Err(err) = worker.join() {
            assert!(err.is_cancelled());
        }
    }
}
