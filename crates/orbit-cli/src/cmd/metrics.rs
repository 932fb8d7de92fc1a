//! `orbit metrics`: every metric for one snapshot.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Args;
use orbit_graph::{GraphMetrics, MetricsWorker};
use tracing::warn;

use crate::cmd::{load_inputs, score, write_orbit_bands};
use crate::output::{
    OutputMode, RankedTable, pretty_kv, pretty_rule, pretty_section, render_mode, text_kv,
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Arguments for `orbit metrics`.
#[derive(Args, Debug)]
pub struct MetricsArgs {
    /// Relationship snapshot (JSON).
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Number of accounts to list in the influence table.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Cancel the computation after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

/// Execute `orbit metrics`.
pub fn run_metrics(
    args: &MetricsArgs,
    config: Option<&PathBuf>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let metrics = compute(&args.snapshot, config, args.timeout_secs)?;
    let top = args.top;
    render_mode(
        output,
        &metrics,
        |m, w| render_text(m, top, w),
        |m, w| render_pretty(m, top, w),
    )
}

fn compute(
    snapshot: &Path,
    config: Option<&PathBuf>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<GraphMetrics> {
    let inputs = load_inputs(snapshot, config)?;
    let worker = MetricsWorker::spawn(Arc::new(inputs.graph), inputs.settings.metrics)
        .context("Failed to start metrics worker")?;

    let deadline = timeout_secs.and_then(|secs| deadline_after(secs).map(|at| (secs, at)));
    if let Some((secs, deadline)) = deadline {
        while !worker.is_finished() {
            if Instant::now() >= deadline {
                warn!(timeout_secs = secs, "timeout reached, cancelling");
                worker.cancel();
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    worker
        .join()
        .with_context(|| format!("Failed to compute metrics for {}", snapshot.display()))
}

/// `None` when `secs` lies beyond what [`Instant`] can represent, which
/// means no deadline.
fn deadline_after(secs: u64) -> Option<Instant> {
    Instant::now().checked_add(Duration::from_secs(secs))
}

fn render_text(m: &GraphMetrics, top: usize, w: &mut dyn Write) -> io::Result<()> {
    text_kv(w, "nodes", m.statistics.node_count)?;
    text_kv(w, "edges", m.statistics.edge_count)?;
    text_kv(w, "density", score(m.density))?;
    text_kv(w, "average_clustering", score(m.average_clustering))?;
    text_kv(w, "reciprocity", score(m.statistics.reciprocity))?;
    text_kv(w, "modularity", score(m.modularity))?;
    text_kv(w, "communities", m.communities.len())?;
    text_kv(w, "pagerank_converged", m.converged)?;
    text_kv(w, "pagerank_iterations", m.pagerank.iterations)?;
    writeln!(w, "rank\tid\tpagerank\tbetweenness\tin_degree\tcommunity")?;
    for (rank, (id, pr)) in m.pagerank.top(top).into_iter().enumerate() {
        writeln!(
            w,
            "{}\t{id}\t{}\t{}\t{}\t{}",
            rank + 1,
            score(pr),
            score(m.betweenness.normalized.get(id).copied().unwrap_or(0.0)),
            m.degree.in_degree.get(id).copied().unwrap_or(0),
            m.communities.assignment.get(id).copied().unwrap_or(0),
        )?;
    }
    Ok(())
}

fn render_pretty(m: &GraphMetrics, top: usize, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Network")?;
    pretty_kv(w, "nodes", m.statistics.node_count.to_string())?;
    pretty_kv(w, "edges", m.statistics.edge_count.to_string())?;
    pretty_kv(w, "density", score(m.density))?;
    pretty_kv(w, "clustering", score(m.average_clustering))?;
    pretty_kv(w, "reciprocity", score(m.statistics.reciprocity))?;
    pretty_kv(w, "modularity", score(m.modularity))?;
    pretty_kv(w, "communities", m.communities.len().to_string())?;
    let pagerank_status = if m.converged {
        format!("converged after {} iterations", m.pagerank.iterations)
    } else {
        format!(
            "NOT converged after {} iterations (delta {:.2e})",
            m.pagerank.iterations, m.pagerank.delta
        )
    };
    pretty_kv(w, "pagerank", pagerank_status)?;
    if m.betweenness.sources < m.statistics.node_count {
        pretty_kv(
            w,
            "betweenness",
            format!("approximate ({} sampled sources)", m.betweenness.sources),
        )?;
    }
    writeln!(w)?;

    pretty_section(w, "Top influence")?;
    let ranked = m.pagerank.top(top);
    let table = RankedTable::new(
        &["pagerank", "betweenness", "in", "community"],
        ranked.iter().map(|&(id, _)| id),
    );
    table.header(w)?;
    for (rank, (id, pr)) in ranked.iter().enumerate() {
        let cells = [
            score(*pr),
            score(m.betweenness.normalized.get(*id).copied().unwrap_or(0.0)),
            m.degree.in_degree.get(*id).copied().unwrap_or(0).to_string(),
            m.communities.assignment.get(*id).map_or_else(|| "-".to_string(), ToString::to_string),
        ];
        table.row(w, &(rank + 1).to_string(), id, &cells)?;
    }
    writeln!(w)?;

    pretty_section(w, "Orbit tiers")?;
    write_orbit_bands(w, m.orbit_distribution())?;
    pretty_rule(w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_timeout_has_no_deadline() {
        assert!(deadline_after(u64::MAX).is_none());
    }

    #[test]
    fn ordinary_timeout_is_in_the_future() {
        let deadline = deadline_after(30).expect("representable");
        assert!(deadline > Instant::now());
    }
}
