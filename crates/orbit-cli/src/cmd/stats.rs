//! `orbit stats`: whole-network statistics without the per-node metrics.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use orbit_graph::stats::{NetworkSummary, network_statistics};

use crate::cmd::{load_inputs, score, write_orbit_bands};
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode, text_kv};

/// Arguments for `orbit stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Relationship snapshot (JSON).
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,
}

/// Execute `orbit stats`.
pub fn run_stats(
    args: &StatsArgs,
    config: Option<&PathBuf>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let inputs = load_inputs(&args.snapshot, config)?;
    let summary = network_statistics(&inputs.graph, &inputs.settings.metrics.orbit)?;
    render_mode(output, &summary, render_text, render_pretty)
}

fn render_text(s: &NetworkSummary, w: &mut dyn Write) -> io::Result<()> {
    text_kv(w, "nodes", s.node_count)?;
    text_kv(w, "edges", s.edge_count)?;
    text_kv(w, "density", score(s.density))?;
    text_kv(w, "average_clustering", score(s.average_clustering))?;
    text_kv(w, "reciprocity", score(s.reciprocity))?;
    text_kv(w, "components", s.weakly_connected_components)?;
    text_kv(w, "isolated", s.isolated_nodes)?;
    text_kv(w, "max_in_degree", s.max_in_degree)?;
    text_kv(w, "max_out_degree", s.max_out_degree)?;
    for band in &s.orbit {
        text_kv(w, &format!("orbit.{}", band.tier.name), band.edges)?;
    }
    Ok(())
}

fn render_pretty(s: &NetworkSummary, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Network")?;
    pretty_kv(w, "nodes", s.node_count.to_string())?;
    pretty_kv(w, "edges", s.edge_count.to_string())?;
    pretty_kv(w, "density", score(s.density))?;
    pretty_kv(w, "clustering", score(s.average_clustering))?;
    pretty_kv(w, "reciprocity", score(s.reciprocity))?;
    pretty_kv(w, "components", s.weakly_connected_components.to_string())?;
    pretty_kv(w, "isolated", s.isolated_nodes.to_string())?;
    pretty_kv(
        w,
        "max degree",
        format!("{} in / {} out", s.max_in_degree, s.max_out_degree),
    )?;
    writeln!(w)?;

    pretty_section(w, "Orbit tiers")?;
    write_orbit_bands(w, &s.orbit)?;
    pretty_rule(w)
}
