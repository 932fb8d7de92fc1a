//! Subcommand handlers.
//!
//! Every command reads the same inputs: a relationship snapshot (JSON) and
//! optional settings (TOML). [`load_inputs`] resolves both and builds the
//! canonical graph.

pub mod communities;
pub mod metrics;
pub mod stats;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use orbit_graph::graph::{Graph, Snapshot};
use orbit_graph::{Settings, load_config};
use tracing::{debug, info};

/// Settings file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG: &str = "orbit.toml";

/// A built graph plus the settings it was built with.
pub struct Inputs {
    pub graph: Graph,
    pub settings: Settings,
}

/// Load settings and the snapshot, then build the graph.
///
/// An explicit `config` path must exist; the default `orbit.toml` is optional.
pub fn load_inputs(snapshot: &Path, config: Option<&PathBuf>) -> Result<Inputs> {
    let settings = match config {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            load_config(path)?
        }
        None => load_config(Path::new(DEFAULT_CONFIG))?,
    };
    debug!(?settings, "settings resolved");

    let graph = Snapshot::load(snapshot)?
        .into_builder(settings.build)
        .build()
        .with_context(|| format!("Failed to build graph from {}", snapshot.display()))?;

    let report = graph.build_report();
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        observations = report.observations,
        dropped_unknown = report.dropped_unknown,
        dropped_self_loops = report.dropped_self_loops,
        "graph built"
    );

    Ok(Inputs { graph, settings })
}

/// Format a score for human output.
pub fn score(value: f64) -> String {
    format!("{value:.4}")
}

/// Pretty rows for the orbit-tier distribution.
pub fn write_orbit_bands(
    w: &mut dyn std::io::Write,
    bands: &[orbit_graph::stats::OrbitBand],
) -> std::io::Result<()> {
    for band in bands {
        let range = match (band.min_weight, band.max_weight) {
            (Some(lo), Some(hi)) => format!("{lo:.2}..{hi:.2}"),
            _ => "-".to_string(),
        };
        writeln!(w, "{:<12} {:>6} edges  {range}", band.tier.name, band.edges)?;
    }
    Ok(())
}
