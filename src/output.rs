// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal coloring and JSON printing helpers

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::record::Submatch;

/// Escape sequence that clears any active SGR attributes
pub const COLOR_RESET: &str = "\x1b[0m";

static COLOR_ENABLED: AtomicBool = AtomicBool::new(false);

/// When to colorize output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Never,
    #[default]
    Auto,
    Always,
}

/// Resolve `mode` against the environment and apply it process-wide
pub fn configure_colors(mode: ColorMode) -> bool {
    let enabled = match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal(),
    };
    colored::control::set_override(enabled);
    COLOR_ENABLED.store(enabled, Ordering::SeqCst);
    enabled
}

/// Whether color output is active for this run
pub fn use_colors() -> bool {
    COLOR_ENABLED.load(Ordering::SeqCst)
}

/// Leave the terminal without dangling color attributes
pub fn reset_terminal_colors() {
    if use_colors() {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(COLOR_RESET.as_bytes());
        let _ = stdout.flush();
    }
}

pub fn colorize_path(path: &str, use_color: bool) -> String {
    if use_color {
        path.magenta().bold().to_string()
    } else {
        path.to_string()
    }
}

/// Line number followed by `separator` (`:` for matches, `-` for context)
pub fn colorize_line_num(line: u64, separator: char, use_color: bool) -> String {
    if use_color {
        format!("{}{}", line.to_string().green(), separator)
    } else {
        format!("{line}{separator}")
    }
}

pub fn colorize_match(text: &str, use_color: bool) -> String {
    if use_color {
        text.red().bold().to_string()
    } else {
        text.to_string()
    }
}

pub fn colorize_context(text: &str, use_color: bool) -> String {
    if use_color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

pub fn colorize_separator(text: &str, use_color: bool) -> String {
    if use_color {
        text.blue().to_string()
    } else {
        text.to_string()
    }
}

/// Highlight submatch spans in `line`.
///
/// Spans that do not land on character boundaries are left unhighlighted.
pub fn highlight_submatches(line: &str, submatches: &[Submatch], use_color: bool) -> String {
    if !use_color || submatches.is_empty() {
        return line.to_string();
    }

    let mut result = String::with_capacity(line.len() + submatches.len() * 12);
    let mut cursor = 0;
    for sub in submatches {
        if sub.start < cursor || sub.end > line.len() {
            continue;
        }
        let (Some(before), Some(matched)) = (line.get(cursor..sub.start), line.get(sub.start..sub.end))
        else {
            continue;
        };
        result.push_str(before);
        result.push_str(&colorize_match(matched, true));
        cursor = sub.end;
    }
    result.push_str(line.get(cursor..).unwrap_or_default());
    result
}

/// Write `value` as JSON followed by a newline
pub fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T, compact: bool) -> io::Result<()> {
    if compact {
        serde_json::to_writer(&mut *out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, value)?;
    }
    writeln!(out)
}
