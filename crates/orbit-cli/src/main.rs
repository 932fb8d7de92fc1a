#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::output::{OutputMode, resolve_output_mode};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "orbit: influence and community metrics for social graphs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (TOML). Defaults to ./orbit.toml when present.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format. Falls back to $FORMAT, then pretty on a TTY and text otherwise.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Compute every metric for a snapshot",
        long_about = "Degree, betweenness, PageRank, communities and network statistics \
                      for one relationship snapshot.",
        after_help = "EXAMPLES:\n    orbit metrics snapshot.json\n\n    \
                      orbit metrics snapshot.json --top 25 --timeout-secs 30\n\n    \
                      orbit metrics snapshot.json --format json"
    )]
    Metrics(cmd::metrics::MetricsArgs),

    #[command(
        about = "Whole-network statistics",
        after_help = "EXAMPLES:\n    orbit stats snapshot.json\n\n    \
                      orbit stats snapshot.json --format text"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        about = "Detect communities",
        after_help = "EXAMPLES:\n    orbit communities snapshot.json --seed 7\n\n    \
                      orbit communities snapshot.json --resolution 0.5 --format json"
    )]
    Communities(cmd::communities::CommunitiesArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ORBIT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "orbit=debug,orbit_graph=debug,info"
        } else {
            "orbit=info,orbit_graph=info,warn"
        })
    });

    let format = env::var("ORBIT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output; logs always go to stderr.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = resolve_output_mode(cli.format);
    let config = cli.config.as_ref();

    match cli.command {
        Commands::Metrics(ref args) => cmd::metrics::run_metrics(args, config, output),
        Commands::Stats(ref args) => cmd::stats::run_stats(args, config, output),
        Commands::Communities(ref args) => {
            cmd::communities::run_communities(args, config, output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from([
            "orbit",
            "metrics",
            "snap.json",
            "--format",
            "json",
            "--config",
            "custom.toml",
        ]);
        assert_eq!(cli.format, Some(OutputMode::Json));
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Metrics(args) => {
                assert_eq!(args.snapshot, PathBuf::from("snap.json"));
                assert_eq!(args.top, 10);
                assert!(args.timeout_secs.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn communities_seed_parses() {
        let cli = Cli::parse_from(["orbit", "communities", "s.json", "--seed", "42"]);
        match cli.command {
            Commands::Communities(args) => {
                assert_eq!(args.seed, Some(42));
                assert!(args.resolution.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn format_rejects_unknown_value() {
        assert!(Cli::try_parse_from(["orbit", "stats", "s.json", "--format", "yaml"]).is_err());
    }
}
