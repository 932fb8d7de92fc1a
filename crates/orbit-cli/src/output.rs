//! Output formatting shared by every `orbit` subcommand.
//!
//! A command computes one serializable result and hands it to
//! [`render_mode`] together with a text and a pretty renderer. JSON output
//! is always the full serialized result, so scripts never depend on the
//! human layouts.
//!
//! # Mode resolution
//!
//! 1. `--format`
//! 2. `FORMAT` env var (`pretty`, `text`, `json`; case-insensitive)
//! 3. pretty when stdout is a terminal, text otherwise

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Width of pretty-mode rules.
pub const PRETTY_RULE_WIDTH: usize = 60;

/// How a command prints its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sections and aligned columns for people.
    Pretty,
    /// `key<TAB>value` lines and tab-separated tables.
    Text,
    /// The full result as pretty-printed JSON.
    Json,
}

fn mode_from_env(value: &str) -> Option<OutputMode> {
    OutputMode::from_str(value.trim(), true).ok()
}

fn pick_mode(flag: Option<OutputMode>, env: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    flag.or_else(|| env.and_then(mode_from_env))
        .unwrap_or(if stdout_is_tty {
            OutputMode::Pretty
        } else {
            OutputMode::Text
        })
}

/// Resolve the mode for this process from the flag, `FORMAT` and stdout.
pub fn resolve_output_mode(flag: Option<OutputMode>) -> OutputMode {
    let env = std::env::var("FORMAT").ok();
    pick_mode(flag, env.as_deref(), io::stdout().is_terminal())
}

/// Render `value` to stdout in `mode`.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_to(&mut out, mode, value, text_fn, pretty_fn)?;
    out.flush()?;
    Ok(())
}

fn render_to<T: Serialize>(
    out: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, out)?,
        OutputMode::Pretty => pretty_fn(value, out)?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pretty helpers
// ---------------------------------------------------------------------------

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", "-".repeat(PRETTY_RULE_WIDTH))
}

/// Heading line followed by a rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// `key:` padded to 16 columns, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<16} {}", format!("{key}:"), value.as_ref())
}

/// Right-aligned columns of a ranked account table. The account column is
/// left-aligned and as wide as the longest id (at least `account`).
pub struct RankedTable<'a> {
    columns: &'a [&'a str],
    account_width: usize,
}

impl<'a> RankedTable<'a> {
    pub fn new<'id>(columns: &'a [&'a str], ids: impl IntoIterator<Item = &'id str>) -> Self {
        let account_width = ids
            .into_iter()
            .map(str::len)
            .chain(std::iter::once("account".len()))
            .max()
            .unwrap_or_default();
        Self {
            columns,
            account_width,
        }
    }

    pub fn header(&self, w: &mut dyn Write) -> io::Result<()> {
        self.row(w, "#", "account", self.columns)
    }

    pub fn row(
        &self,
        w: &mut dyn Write,
        rank: &str,
        account: &str,
        cells: &[impl AsRef<str>],
    ) -> io::Result<()> {
        write!(w, "{rank:>4}  {account:<width$}", width = self.account_width)?;
        for (cell, name) in cells.iter().zip(self.columns) {
            write!(w, "  {:>width$}", cell.as_ref(), width = name.len().max(6))?;
        }
        writeln!(w)
    }
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// `key<TAB>value`.
pub fn text_kv(w: &mut dyn Write, key: &str, value: impl std::fmt::Display) -> io::Result<()> {
    writeln!(w, "{key}\t{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(mode: OutputMode) -> String {
        let mut buf = Vec::new();
        render_to(
            &mut buf,
            mode,
            &serde_json::json!({ "nodes": 3 }),
            |_, w| text_kv(w, "nodes", 3),
            |_, w| pretty_kv(w, "nodes", "3"),
        )
        .expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn flag_beats_env_and_terminal() {
        assert_eq!(pick_mode(Some(OutputMode::Text), Some("json"), true), OutputMode::Text);
    }

    #[test]
    fn env_is_case_insensitive() {
        assert_eq!(pick_mode(None, Some("JSON"), true), OutputMode::Json);
        assert_eq!(pick_mode(None, Some(" pretty "), false), OutputMode::Pretty);
    }

    #[test]
    fn unknown_env_uses_terminal_default() {
        assert_eq!(pick_mode(None, Some("yaml"), true), OutputMode::Pretty);
        assert_eq!(pick_mode(None, None, false), OutputMode::Text);
    }

    #[test]
    fn each_mode_uses_its_renderer() {
        assert_eq!(rendered(OutputMode::Text), "nodes\t3\n");
        assert_eq!(rendered(OutputMode::Pretty), "nodes:           3\n");
        let json: serde_json::Value =
            serde_json::from_str(&rendered(OutputMode::Json)).expect("json");
        assert_eq!(json["nodes"], 3);
    }

    #[test]
    fn ranked_table_widens_account_column() {
        let table = RankedTable::new(&["pagerank"], ["a-very-long-account-id", "bob"]);
        let mut buf = Vec::new();
        table.header(&mut buf).expect("header");
        table.row(&mut buf, "1", "bob", &["0.5000"]).expect("row");
        let out = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0].len(), lines[1].len());
        assert!(lines[0].ends_with("pagerank"));
        assert!(lines[1].ends_with("  0.5000"));
    }
}
