// SPDX-License-Identifier: MIT OR Apache-2.0

//! Corpus builders for the file-level and line-level ranking passes

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;

use super::bm25::Corpus;
use crate::record::{MatchRecord, TermKey};

/// Weighting knobs for the file-level pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileCorpusOptions {
    /// Added once per submatch edge that sits on a word boundary
    pub boundary_boost: f64,
    /// Multiplier on path length when it is folded into document length
    pub path_length_scale: f64,
    /// Multiplier on the weight of file-name matches
    pub filename_match_scale: f64,
}

impl Default for FileCorpusOptions {
    fn default() -> Self {
        Self {
            boundary_boost: 5.0,
            path_length_scale: 1.0,
            filename_match_scale: 1.0,
        }
    }
}

/// Fill `corpus` with per-file statistics from every record of one run.
///
/// Documents that end up without a length are back-filled from disk; a
/// document whose file can no longer be read is dropped from the pass.
pub fn populate_file_corpus(
    corpus: &mut Corpus<String, TermKey>,
    records: &[MatchRecord],
    options: &FileCorpusOptions,
) {
    for record in records {
        if let (Some(size), Some(path)) = (record.byte_size, record.source.path()) {
            let length = path.chars().count() as f64 * options.path_length_scale + size as f64;
            corpus.set_length(path.to_string(), length);
        }

        let Some(text) = record.text.as_deref() else {
            continue;
        };
        let Some(document) = record.document() else {
            continue;
        };
        let from_stdin = record.source.is_stdin();
        let scale = if from_stdin {
            options.filename_match_scale
        } else {
            1.0
        };

        for submatch in &record.submatches {
            let weight = (1.0
                + boundary_weight(text.as_bytes(), submatch.start, submatch.end, options))
                * scale;
            corpus.add_term(
                document.clone(),
                TermKey::new(from_stdin, submatch.term.as_str()),
                weight,
            );
        }
    }

    for document in corpus.documents_without_length() {
        match document_length_on_disk(Path::new(&document)) {
            Ok(length) => corpus.set_length(document, length),
            Err(err) => {
                tracing::trace!(document = %document, error = %err, "dropping document without length");
                corpus.remove_document(&document);
            }
        }
    }
}

/// Extra weight for a span whose edges fall on word boundaries
fn boundary_weight(line: &[u8], start: usize, end: usize, options: &FileCorpusOptions) -> f64 {
    let mut weight = 0.0;
    let before = start.checked_sub(1).and_then(|idx| line.get(idx));
    if !before.is_some_and(u8::is_ascii_alphanumeric) {
        weight += options.boundary_boost;
    }
    if !line.get(end).is_some_and(u8::is_ascii_alphanumeric) {
        weight += options.boundary_boost;
    }
    weight
}

/// Path length plus on-disk size, for documents the search never sized
pub fn document_length_on_disk(path: &Path) -> io::Result<f64> {
    let size = fs::metadata(path)?.len();
    Ok(path.to_string_lossy().chars().count() as f64 + size as f64)
}

/// Fill `corpus` with per-line statistics for one file's records
///
/// Every submatch weighs 1 and a line's length is its byte length. Context
/// and padding lines contribute nothing.
pub fn populate_line_corpus<'a, I>(corpus: &mut Corpus<u64, String>, records: I)
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    for record in records {
        let Some(line) = record.line_number else {
            continue;
        };
        if !record.is_match() {
            continue;
        }
        let length = record.text.as_deref().map_or(0, str::len);
        corpus.set_length(line, length as f64);
        for submatch in &record.submatches {
            corpus.add_term(line, submatch.term.clone(), 1.0);
        }
    }
}

/// Distinct matched terms on each matching line
pub fn line_terms<'a, I>(records: I) -> BTreeMap<u64, BTreeSet<String>>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut terms: BTreeMap<u64, BTreeSet<String>> = BTreeMap::new();
    for record in records {
        let Some(line) = record.line_number else {
            continue;
        };
        if !record.is_match() {
            continue;
        }
        terms
            .entry(line)
            .or_default()
            .extend(record.submatches.iter().map(|s| s.term.clone()));
    }
    terms
}
