// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ranked search: enumerate, match, rank, then render

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use crate::cli::{Cli, OutputFormat};
use rgrank::config::{Config, ConfigOutputFormat};
use rgrank::formatter::Formatter;
use rgrank::output::{
    colorize_context, colorize_line_num, colorize_path, colorize_separator, highlight_submatches,
    use_colors, write_json,
};
use rgrank::rank::context::FileCache;
use rgrank::rank::{rank_files, records_by_path, representative_lines, RankedFile};
use rgrank::record::MatchRecord;
use rgrank::scanner::RipgrepScanner;

/// Row printed between non-adjacent lines of one file
const GAP_SEPARATOR: &str = "--";

/// One ranked file with the lines chosen for display
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: String,
    pub score: f64,
    pub lines: Vec<MatchRecord>,
}

#[derive(Debug, Serialize)]
struct JsonFile<'a> {
    path: &'a str,
    score: f64,
    lines: Vec<JsonLine<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonLine<'a> {
    line: u64,
    text: &'a str,
    matched: bool,
}

/// How text rows are decorated
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub use_color: bool,
    pub line_numbers: bool,
}

pub fn run(cli: &Cli) -> Result<()> {
    let start_time = Instant::now();
    let config = Config::load();
    let options = config.ranking_options(cli.num_matches, cli.max_lines, cli.context);
    let format = cli.format.unwrap_or(match config.output_format() {
        Some(ConfigOutputFormat::Json) => OutputFormat::Json,
        _ => OutputFormat::Text,
    });

    let scanner = RipgrepScanner::new(config.search_tool())?
        .with_paths(cli.dirs.clone())
        .with_extra_args(cli.passthrough.clone());

    let files = scanner.list_files()?;
    let records = if files.is_empty() {
        Vec::new()
    } else {
        let mut records = scanner.search_contents(&cli.patterns)?;
        records.extend(scanner.search_filenames(&cli.patterns, &files)?);
        records
    };

    let mut ranked = rank_files(&records, files.len(), &options);
    if cli.reverse {
        ranked.reverse();
    }

    let results: Vec<FileResult> = if cli.files_with_matches {
        ranked.into_iter().map(|file| file_result(file, Vec::new())).collect()
    } else {
        let grouped = records_by_path(&records);
        let mut cache = FileCache::new();
        ranked
            .into_iter()
            .map(|file| {
                let lines = grouped
                    .get(file.path.as_str())
                    .map(|file_records| {
                        representative_lines(&file.path, file_records, &options, &mut cache)
                    })
                    .unwrap_or_default();
                file_result(file, lines)
            })
            .collect()
    };
    tracing::debug!(
        files = results.len(),
        elapsed_ms = start_time.elapsed().as_secs_f64() * 1000.0,
        "ranking finished"
    );

    // Locks per write, so the SIGINT handler can reset colors mid-render.
    let mut out = BufWriter::new(io::stdout());
    match format {
        OutputFormat::Json => {
            write_json(&mut out, &json_view(&results), cli.compact)
                .context("Failed to write results")?;
        }
        OutputFormat::Text => {
            let style = TextStyle {
                use_color: use_colors(),
                line_numbers: !cli.no_line_number,
            };
            if cli.files_with_matches {
                write_paths(&mut out, &results, style).context("Failed to write results")?;
            } else if let Some(formatter) = text_formatter(cli, &config, style) {
                write_formatted(&mut out, &results, &formatter, style)?;
            } else {
                write_text(&mut out, &results, style).context("Failed to write results")?;
            }
        }
    }
    out.flush().context("Failed to write results")?;
    Ok(())
}

fn file_result(file: RankedFile, lines: Vec<MatchRecord>) -> FileResult {
    FileResult {
        path: display_path(&file.path).to_string(),
        score: file.score,
        lines,
    }
}

/// Path as shown to the user, without a leading `./`
pub fn display_path(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// The external formatter is only used for colored text output with line
/// numbers; it owns the line decoration, so `-N` falls back to plain rows.
fn text_formatter(cli: &Cli, config: &Config, style: TextStyle) -> Option<Formatter> {
    if cli.no_formatter || !style.use_color || !style.line_numbers {
        return None;
    }
    Formatter::locate(config.formatter()?, &config.formatter_args)
}

fn json_view(results: &[FileResult]) -> Vec<JsonFile<'_>> {
    results
        .iter()
        .map(|result| JsonFile {
            path: &result.path,
            score: result.score,
            lines: result
                .lines
                .iter()
                .filter_map(|record| {
                    Some(JsonLine {
                        line: record.line_number?,
                        text: record.trimmed_text(),
                        matched: record.is_match(),
                    })
                })
                .collect(),
        })
        .collect()
}

pub fn write_paths<W: Write>(
    out: &mut W,
    results: &[FileResult],
    style: TextStyle,
) -> io::Result<()> {
    for result in results {
        writeln!(out, "{}", colorize_path(&result.path, style.use_color))?;
    }
    Ok(())
}

/// Render results without a formatter
pub fn write_text<W: Write>(
    out: &mut W,
    results: &[FileResult],
    style: TextStyle,
) -> io::Result<()> {
    for (idx, result) in results.iter().enumerate() {
        write_file_header(out, idx, result, style)?;
        let rows: Vec<String> = result
            .lines
            .iter()
            .map(|record| plain_row(record, style))
            .collect();
        write_rows(out, &result.lines, &rows, style)?;
    }
    Ok(())
}

/// Render results with each file's lines passed through `formatter`.
///
/// A formatter that cannot be started is skipped with a warning.
fn write_formatted<W: Write>(
    out: &mut W,
    results: &[FileResult],
    formatter: &Formatter,
    style: TextStyle,
) -> Result<()> {
    let mut session = match formatter.spawn() {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(formatter = formatter.name(), error = %err, "could not start formatter");
            return Ok(write_text(out, results, style)?);
        }
    };

    for (idx, result) in results.iter().enumerate() {
        write_file_header(out, idx, result, style)?;
        if result.lines.is_empty() {
            continue;
        }
        let rows = session.format_group(&result.path, &result.lines)?;
        write_rows(out, &result.lines, &rows, style)?;
    }
    session.finish()?;
    Ok(())
}

fn write_file_header<W: Write>(
    out: &mut W,
    idx: usize,
    result: &FileResult,
    style: TextStyle,
) -> io::Result<()> {
    if idx > 0 {
        writeln!(out)?;
    }
    writeln!(out, "{}", colorize_path(&result.path, style.use_color))
}

/// Write pre-rendered `rows`, with a separator wherever line numbers jump
fn write_rows<W: Write>(
    out: &mut W,
    records: &[MatchRecord],
    rows: &[String],
    style: TextStyle,
) -> io::Result<()> {
    let mut previous: Option<u64> = None;
    for (record, row) in records.iter().zip(rows) {
        if let (Some(prev), Some(line)) = (previous, record.line_number) {
            if line > prev + 1 {
                writeln!(out, "{}", colorize_separator(GAP_SEPARATOR, style.use_color))?;
            }
        }
        previous = record.line_number.or(previous);
        writeln!(out, "{row}")?;
    }
    Ok(())
}

fn plain_row(record: &MatchRecord, style: TextStyle) -> String {
    let text = if record.is_match() {
        highlight_submatches(record.trimmed_text(), &record.submatches, style.use_color)
    } else {
        colorize_context(record.trimmed_text(), style.use_color)
    };
    match record.line_number {
        Some(line) if style.line_numbers => {
            let separator = if record.is_match() { ':' } else { '-' };
            format!("{}{}", colorize_line_num(line, separator, style.use_color), text)
        }
        _ => text,
    }
}
