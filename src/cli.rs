// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use std::collections::HashMap;
use std::ffi::OsString;

use rgrank::output::ColorMode;

/// rgrank - BM25-ranked search over ripgrep matches
///
/// Runs ripgrep, ranks the matching files by BM25 and shows the few lines
/// from each file that cover the most distinct matched terms. No index is
/// built or kept.
#[derive(Parser, Debug)]
#[command(name = "rgrank")]
#[command(
    author,
    version,
    about,
    long_about = None,
    override_usage = "rgrank [OPTIONS] <PATTERN>... [RG-FLAGS]",
    after_help = "Examples:\n  rgrank token refresh\n  rgrank -d src -d tests -m 5 retry backoff\n  rgrank parser -w --type=rust\n\nUnrecognized flags are forwarded to ripgrep; give their values as --flag=value."
)]
pub struct Cli {
    /// Patterns to search for (each one is passed to ripgrep with -e)
    #[arg(value_name = "PATTERN", required_unless_present = "completions")]
    pub patterns: Vec<String>,

    /// Path to search in (repeatable, defaults to current directory)
    #[arg(short = 'd', long = "dir", value_name = "PATH", help_heading = "Scope")]
    pub dirs: Vec<String>,

    /// Number of files to show
    #[arg(short = 'm', long, help_heading = "Ranking")]
    pub num_matches: Option<usize>,

    /// Representative lines to show per file
    #[arg(short = 'k', long, help_heading = "Ranking")]
    pub max_lines: Option<usize>,

    /// Show N lines before and after each representative line
    #[arg(short = 'C', long, help_heading = "Ranking")]
    pub context: Option<usize>,

    /// Show the best match first instead of last
    #[arg(short = 'r', long, help_heading = "Output")]
    pub reverse: bool,

    /// Only print the paths of ranked files
    #[arg(short = 'l', long, help_heading = "Output")]
    pub files_with_matches: bool,

    /// Hide line numbers (also skips the external formatter)
    #[arg(short = 'N', long, help_heading = "Output")]
    pub no_line_number: bool,

    /// When to use colors
    #[arg(long, value_enum, value_name = "WHEN", default_value_t = ColorMode::Auto, help_heading = "Output")]
    pub color: ColorMode,

    /// Output format (text or json)
    #[arg(long, value_enum, help_heading = "Output")]
    pub format: Option<OutputFormat>,

    /// Compact JSON output (no pretty formatting)
    #[arg(long, help_heading = "Output")]
    pub compact: bool,

    /// Never pipe lines through the external formatter
    #[arg(long, help_heading = "Output")]
    pub no_formatter: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Flags forwarded to ripgrep, filled in by [`split_passthrough`]
    #[arg(skip)]
    pub passthrough: Vec<String>,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Parse process arguments, setting aside flags meant for ripgrep
    pub fn parse_with_passthrough() -> Self {
        let (args, passthrough) = split_passthrough(std::env::args_os());
        let mut cli = Self::parse_from(args);
        cli.passthrough = passthrough;
        cli
    }
}

/// Split `args` into what clap understands and flags to forward to ripgrep.
///
/// Known flags keep their values (`-m 5`, `--context=2`). An unknown flag is
/// forwarded alone, so its value must be attached (`--type=rust`).
/// Everything after `--` is positional.
pub fn split_passthrough<I>(args: I) -> (Vec<OsString>, Vec<String>)
where
    I: IntoIterator<Item = OsString>,
{
    let command = Cli::command();
    let mut longs: HashMap<String, bool> =
        HashMap::from([("help".to_string(), false), ("version".to_string(), false)]);
    let mut shorts: HashMap<char, bool> = HashMap::from([('h', false), ('V', false)]);
    for arg in command.get_arguments() {
        let takes_value = arg.get_action().takes_values();
        if let Some(long) = arg.get_long() {
            longs.insert(long.to_string(), takes_value);
        }
        if let Some(short) = arg.get_short() {
            shorts.insert(short, takes_value);
        }
    }

    let mut iter = args.into_iter();
    let mut known: Vec<OsString> = iter.next().into_iter().collect();
    let mut passthrough = Vec::new();
    let mut positional_only = false;

    while let Some(arg) = iter.next() {
        let Some(text) = arg.to_str() else {
            known.push(arg);
            continue;
        };
        if positional_only || text == "-" || !text.starts_with('-') {
            known.push(arg);
            continue;
        }
        if text == "--" {
            positional_only = true;
            known.push(arg);
            continue;
        }

        if let Some(long) = text.strip_prefix("--") {
            let (name, inline_value) = match long.split_once('=') {
                Some((name, _)) => (name, true),
                None => (long, false),
            };
            match longs.get(name).copied() {
                Some(takes_value) => {
                    known.push(arg);
                    if takes_value && !inline_value {
                        known.extend(iter.next());
                    }
                }
                None => passthrough.push(text.to_string()),
            }
            continue;
        }

        let cluster = split_short_cluster(&text[1..], &shorts);
        if !cluster.known.is_empty() {
            known.push(OsString::from(format!("-{}", cluster.known)));
            if cluster.needs_value {
                known.extend(iter.next());
            }
        }
        if !cluster.forwarded.is_empty() {
            passthrough.push(format!("-{}", cluster.forwarded));
        }
    }

    (known, passthrough)
}

/// A short-flag cluster such as `-rC3` split into our flags and ripgrep's
#[derive(Debug, Default, PartialEq, Eq)]
struct ShortCluster {
    known: String,
    forwarded: String,
    needs_value: bool,
}

/// Walk `flags` one character at a time.
///
/// A known value-taking flag ends the cluster and claims the rest as its
/// inline value. The first unknown flag also ends it: that flag and
/// everything after it (possibly its own inline value) go to ripgrep.
fn split_short_cluster(flags: &str, shorts: &HashMap<char, bool>) -> ShortCluster {
    let mut cluster = ShortCluster::default();
    for (idx, flag) in flags.char_indices() {
        match shorts.get(&flag).copied() {
            Some(true) => {
                let rest = &flags[idx + flag.len_utf8()..];
                cluster.known.push(flag);
                cluster.known.push_str(rest);
                cluster.needs_value = rest.is_empty();
                break;
            }
            Some(false) => cluster.known.push(flag),
            None => {
                cluster.forwarded.push_str(&flags[idx..]);
                break;
            }
        }
    }
    cluster
}
