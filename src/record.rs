// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalized match records produced from search tool output

use serde::Serialize;

/// Path the search tool reports for data read from standard input
pub const STDIN_PATH: &str = "<stdin>";

/// Where a record came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    /// A file on disk, as the search tool printed it
    Path(String),
    /// Candidate file names piped through standard input
    Stdin,
}

impl Source {
    pub fn from_reported(path: &str) -> Self {
        if path == STDIN_PATH {
            Source::Stdin
        } else {
            Source::Path(path.to_string())
        }
    }

    pub fn is_stdin(&self) -> bool {
        matches!(self, Source::Stdin)
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Source::Path(path) => Some(path),
            Source::Stdin => None,
        }
    }
}

/// One matched span within a line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submatch {
    /// Matched text, lowercased
    pub term: String,
    pub start: usize,
    pub end: usize,
}

impl Submatch {
    pub fn new(text: &str, start: usize, end: usize) -> Self {
        Self {
            term: text.to_lowercase(),
            start,
            end,
        }
    }
}

/// One matched line, context line, or per-file stat
///
/// A record with a line number but no submatches is a context or padding
/// line rather than an original match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub source: Source,
    pub line_number: Option<u64>,
    /// Bytes the search tool scanned for this source (stat records only)
    pub byte_size: Option<u64>,
    pub text: Option<String>,
    pub submatches: Vec<Submatch>,
}

impl MatchRecord {
    pub fn line(
        source: Source,
        line_number: u64,
        text: impl Into<String>,
        submatches: Vec<Submatch>,
    ) -> Self {
        Self {
            source,
            line_number: Some(line_number),
            byte_size: None,
            text: Some(text.into()),
            submatches,
        }
    }

    pub fn stat(source: Source, byte_size: u64) -> Self {
        Self {
            source,
            line_number: None,
            byte_size: Some(byte_size),
            text: None,
            submatches: Vec::new(),
        }
    }

    /// Padding line synthesized around a selected match
    pub fn padding(path: &str, line_number: u64, text: impl Into<String>) -> Self {
        Self::line(Source::Path(path.to_string()), line_number, text, Vec::new())
    }

    pub fn is_match(&self) -> bool {
        !self.submatches.is_empty()
    }

    /// Line text without its trailing line terminator
    pub fn trimmed_text(&self) -> &str {
        self.text
            .as_deref()
            .map(|text| text.trim_end_matches(['\n', '\r']))
            .unwrap_or("")
    }

    /// Identity this record contributes to in the file-level corpus
    ///
    /// File-name matches are keyed by the matched path itself.
    pub fn document(&self) -> Option<String> {
        match &self.source {
            Source::Path(path) => Some(path.clone()),
            Source::Stdin => self
                .text
                .as_ref()
                .map(|_| self.trimmed_text().to_string())
                .filter(|name| !name.is_empty()),
        }
    }
}

/// Term key used by the file-level corpus
///
/// File-name matches score under their own namespace so that the same text
/// matched in a path and in a file body stays two distinct terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermKey {
    pub from_stdin: bool,
    pub text: String,
}

impl TermKey {
    pub fn new(from_stdin: bool, text: impl Into<String>) -> Self {
        Self {
            from_stdin,
            text: text.into(),
        }
    }
}
