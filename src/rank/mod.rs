// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-pass BM25 ranking: whole files first, then lines within each file

pub mod bm25;
pub mod context;
pub mod corpus;
pub mod select;

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::record::{MatchRecord, Source};
use bm25::Bm25Params;
use context::{merge_context, FileCache};
use corpus::{line_terms, populate_file_corpus, populate_line_corpus, FileCorpusOptions};
use select::select_lines;

/// Everything one run needs to rank and trim results
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingOptions {
    pub bm25: Bm25Params,
    pub corpus: FileCorpusOptions,
    /// Files to keep
    pub num_matches: usize,
    /// Representative lines per file
    pub max_lines: usize,
    /// Context radius around each representative line
    pub context: usize,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            bm25: Bm25Params::default(),
            corpus: FileCorpusOptions::default(),
            num_matches: 10,
            max_lines: 3,
            context: 1,
        }
    }
}

/// One file that made the cut
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFile {
    pub path: String,
    pub score: f64,
}

/// Rank files by BM25 over every record of the run.
///
/// `candidates` is the number of files the search could have matched. The
/// best `num_matches` files are returned in ascending score order, so the
/// strongest match comes last; equal scores fall back to path order.
pub fn rank_files(
    records: &[MatchRecord],
    candidates: usize,
    options: &RankingOptions,
) -> Vec<RankedFile> {
    let scores = bm25::score(&options.bm25, candidates, |corpus| {
        populate_file_corpus(corpus, records, &options.corpus)
    });
    tracing::debug!(documents = scores.len(), candidates, "scored files");

    let mut ranked: Vec<RankedFile> = scores
        .into_iter()
        .map(|(path, score)| RankedFile { path, score })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.path.cmp(&b.path))
    });
    ranked.truncate(options.num_matches);
    ranked.reverse();
    ranked
}

/// Line records grouped by the file they came from
pub fn records_by_path(records: &[MatchRecord]) -> HashMap<&str, Vec<&MatchRecord>> {
    let mut grouped: HashMap<&str, Vec<&MatchRecord>> = HashMap::new();
    for record in records {
        if record.line_number.is_none() {
            continue;
        }
        if let Source::Path(path) = &record.source {
            grouped.entry(path.as_str()).or_default().push(record);
        }
    }
    grouped
}

/// Representative lines of one ranked file, expanded with context.
///
/// Files that only matched by name have no line records and yield nothing.
pub fn representative_lines(
    path: &str,
    file_records: &[&MatchRecord],
    options: &RankingOptions,
    cache: &mut FileCache,
) -> Vec<MatchRecord> {
    let terms = line_terms(file_records.iter().copied());
    if terms.is_empty() {
        return Vec::new();
    }

    let scores = bm25::score(&options.bm25, terms.len(), |corpus| {
        populate_line_corpus(corpus, file_records.iter().copied())
    });
    let selected = select_lines(&scores, &terms, options.max_lines);

    let file_lines: &[String] = if options.context == 0 {
        &[]
    } else {
        cache.lines(Path::new(path))
    };
    merge_context(
        path,
        file_records.iter().copied(),
        &selected,
        options.context,
        file_lines,
    )
}
