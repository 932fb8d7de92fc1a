//! `orbit communities`: partition the audience into tightly knit groups.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use orbit_graph::community::{CommunityResult, detect_communities};

use crate::cmd::{load_inputs, score};
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode, text_kv};

/// Arguments for `orbit communities`.
#[derive(Args, Debug)]
pub struct CommunitiesArgs {
    /// Relationship snapshot (JSON).
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Shuffle the node visit order with this seed (overrides settings).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Modularity resolution (overrides settings).
    #[arg(long)]
    pub resolution: Option<f64>,
}

/// Execute `orbit communities`.
pub fn run_communities(
    args: &CommunitiesArgs,
    config: Option<&PathBuf>,
    output: OutputMode,
) -> anyhow::Result<()> {
    let inputs = load_inputs(&args.snapshot, config)?;
    let mut community = inputs.settings.metrics.community;
    if let Some(seed) = args.seed {
        community = community.with_seed(seed);
    }
    if let Some(resolution) = args.resolution {
        community = community.with_resolution(resolution);
    }
    let result = detect_communities(&inputs.graph, &community)?;
    render_mode(output, &result, render_text, render_pretty)
}

fn render_text(r: &CommunityResult, w: &mut dyn Write) -> io::Result<()> {
    text_kv(w, "communities", r.len())?;
    text_kv(w, "modularity", score(r.modularity))?;
    text_kv(w, "levels", r.levels)?;
    writeln!(w, "community\tsize\tmodularity\tmembers")?;
    for c in &r.communities {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            c.id,
            c.members.len(),
            score(c.modularity),
            c.members.join(",")
        )?;
    }
    Ok(())
}

fn render_pretty(r: &CommunityResult, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Communities")?;
    pretty_kv(w, "count", r.len().to_string())?;
    pretty_kv(w, "modularity", score(r.modularity))?;
    pretty_kv(w, "levels", r.levels.to_string())?;
    if let Some(seed) = r.seed {
        pretty_kv(w, "seed", seed.to_string())?;
    }
    writeln!(w)?;
    for c in &r.communities {
        writeln!(
            w,
            "#{:<3} {:>4} members  Q {:>7}  {}",
            c.id,
            c.members.len(),
            score(c.modularity),
            c.members.join(", ")
        )?;
    }
    pretty_rule(w)
}
