// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context windows around selected lines

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::record::MatchRecord;

/// File contents loaded for context expansion, kept for the rest of the run
#[derive(Debug, Default)]
pub struct FileCache {
    files: HashMap<PathBuf, Vec<String>>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines of `path`, each with its terminator; empty when unreadable
    pub fn lines(&mut self, path: &Path) -> &[String] {
        self.files
            .entry(path.to_path_buf())
            .or_insert_with(|| {
                read_file_lines(path).unwrap_or_else(|err| {
                    tracing::debug!(path = %path.display(), error = %err, "no context available");
                    Vec::new()
                })
            })
            .as_slice()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn read_file_lines(path: &Path) -> io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes)
        .split_inclusive('\n')
        .map(str::to_string)
        .collect())
}

/// Line numbers covered by `radius` lines around each selected line.
///
/// Windows are clipped to `[1, last_line]`; a selected line past `last_line`
/// (file changed or unreadable) still keeps itself.
pub fn context_lines(selected: &[u64], radius: usize, last_line: u64) -> BTreeSet<u64> {
    let radius = radius as u64;
    let mut lines = BTreeSet::new();
    for &line in selected {
        let low = line.saturating_sub(radius).max(1);
        let high = line.saturating_add(radius).min(last_line.max(line));
        lines.extend(low..=high);
    }
    lines
}

/// Expand `selected` into merged windows over one file's records.
///
/// Lines already present in `records` are reused; the rest become padding
/// records built from `file_lines`. The output is sorted by line number and
/// keeps real line numbers, so gaps between windows stay visible.
pub fn merge_context<'a, I>(
    path: &str,
    records: I,
    selected: &[u64],
    radius: usize,
    file_lines: &[String],
) -> Vec<MatchRecord>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut known: BTreeMap<u64, &MatchRecord> = BTreeMap::new();
    for record in records {
        let Some(line) = record.line_number else {
            continue;
        };
        let replace = known.get(&line).map_or(true, |existing| !existing.is_match());
        if replace {
            known.insert(line, record);
        }
    }

    context_lines(selected, radius, file_lines.len() as u64)
        .into_iter()
        .filter_map(|line| match known.get(&line) {
            Some(record) => Some((*record).clone()),
            None => file_lines
                .get(line as usize - 1)
                .map(|text| MatchRecord::padding(path, line, text.as_str())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Source, Submatch};
    use tempfile::TempDir;

    fn numbered_lines(count: usize) -> Vec<String> {
        (1..=count).map(|n| format!("line {n}\n")).collect()
    }

    fn matched(line: u64) -> MatchRecord {
        MatchRecord::line(
            Source::Path("f.txt".into()),
            line,
            format!("line {line}\n"),
            vec![Submatch::new("line", 0, 4)],
        )
    }

    fn line_numbers(records: &[MatchRecord]) -> Vec<u64> {
        records.iter().filter_map(|r| r.line_number).collect()
    }

    #[test]
    fn single_line_gets_one_line_each_side() {
        let records = vec![matched(5)];
        let merged = merge_context("f.txt", &records, &[5], 1, &numbered_lines(10));
        assert_eq!(line_numbers(&merged), vec![4, 5, 6]);
        assert!(merged[1].is_match());
        assert!(!merged[0].is_match());
        assert_eq!(merged[0].trimmed_text(), "line 4");
    }

    #[test]
    fn overlapping_windows_merge_without_repeats() {
        let records = vec![matched(5), matched(7)];
        let merged = merge_context("f.txt", &records, &[5, 7], 1, &numbered_lines(10));
        assert_eq!(line_numbers(&merged), vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn windows_clip_at_file_edges() {
        let records = vec![matched(1), matched(10)];
        let merged = merge_context("f.txt", &records, &[1, 10], 2, &numbered_lines(10));
        assert_eq!(line_numbers(&merged), vec![1, 2, 3, 8, 9, 10]);
    }

    #[test]
    fn known_records_win_over_padding() {
        let context = MatchRecord::line(Source::Path("f.txt".into()), 4, "from search\n", vec![]);
        let records = vec![context, matched(5)];
        let merged = merge_context("f.txt", &records, &[5], 1, &numbered_lines(10));
        assert_eq!(merged[0].trimmed_text(), "from search");
    }

    #[test]
    fn unreadable_file_keeps_selected_lines_only() {
        let records = vec![matched(3)];
        let merged = merge_context("f.txt", &records, &[3], 1, &[]);
        assert_eq!(line_numbers(&merged), vec![3]);
    }

    #[test]
    fn cache_loads_each_file_once() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("a.txt");
        fs::write(&path, "one\ntwo\nthree").expect("write");

        let mut cache = FileCache::new();
        assert_eq!(cache.lines(&path).len(), 3);
        fs::remove_file(&path).expect("remove");
        assert_eq!(cache.lines(&path)[2], "three");
        assert_eq!(cache.len(), 1);

        assert!(cache.lines(&dir.path().join("missing.txt")).is_empty());
    }
}
