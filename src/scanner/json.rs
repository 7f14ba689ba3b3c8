// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parser for ripgrep's `--json` message stream

use rayon::prelude::*;
use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::record::{MatchRecord, Source, Submatch};

/// Above this many lines the stream is parsed in parallel
pub const BULK_PARSE_THRESHOLD: usize = 4096;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
enum Message {
    Begin(IgnoredAny),
    Match(LineData),
    Context(LineData),
    End(EndData),
    Summary(IgnoredAny),
}

/// `{"text": ..}` or `{"bytes": ..}` for data that is not valid UTF-8
#[derive(Debug, Deserialize)]
struct Data {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LineData {
    path: Data,
    lines: Data,
    line_number: Option<u64>,
    #[serde(default)]
    submatches: Vec<SubmatchData>,
}

#[derive(Debug, Deserialize)]
struct SubmatchData {
    #[serde(rename = "match")]
    matched: Data,
    start: usize,
    end: usize,
}

#[derive(Debug, Deserialize)]
struct EndData {
    path: Option<Data>,
    stats: Stats,
}

#[derive(Debug, Deserialize)]
struct Stats {
    bytes_searched: u64,
}

/// Parse one line of search output.
///
/// Returns `Ok(None)` for messages that carry nothing to rank.
pub fn parse_line(line: &str) -> Result<Option<MatchRecord>, serde_json::Error> {
    let message: Message = serde_json::from_str(line)?;
    let record = match message {
        Message::Match(data) | Message::Context(data) => line_record(data),
        Message::End(data) => data
            .path
            .and_then(|path| path.text)
            .map(|path| MatchRecord::stat(Source::from_reported(&path), data.stats.bytes_searched)),
        Message::Begin(_) | Message::Summary(_) => None,
    };
    Ok(record)
}

fn line_record(data: LineData) -> Option<MatchRecord> {
    let path = data.path.text?;
    let text = data.lines.text;
    let submatches = data
        .submatches
        .into_iter()
        .filter_map(|sub| {
            let matched = sub.matched.text.or_else(|| {
                text.as_deref()
                    .and_then(|line| line.get(sub.start..sub.end))
                    .map(str::to_string)
            })?;
            Some(Submatch::new(&matched, sub.start, sub.end))
        })
        .collect();

    Some(MatchRecord {
        source: Source::from_reported(&path),
        line_number: data.line_number,
        byte_size: None,
        text,
        submatches,
    })
}

/// Parse a whole captured output, keeping record order.
///
/// Lines that fail to parse are logged and skipped.
pub fn parse_records(output: &[u8]) -> Vec<MatchRecord> {
    let output = String::from_utf8_lossy(output);
    let lines: Vec<&str> = output.lines().filter(|line| !line.is_empty()).collect();

    let parsed: Vec<Option<MatchRecord>> = if lines.len() > BULK_PARSE_THRESHOLD {
        tracing::debug!(lines = lines.len(), "parsing search output in parallel");
        lines.par_iter().map(|line| parse_or_warn(line)).collect()
    } else {
        lines.iter().map(|line| parse_or_warn(line)).collect()
    };
    parsed.into_iter().flatten().collect()
}

fn parse_or_warn(line: &str) -> Option<MatchRecord> {
    match parse_line(line) {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(error = %err, "skipping unreadable search output line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCH: &str = r#"{"type":"match","data":{"path":{"text":"src/main.rs"},"lines":{"text":"fn Main() {}\n"},"line_number":3,"absolute_offset":40,"submatches":[{"match":{"text":"Main"},"start":3,"end":7}]}}"#;

    #[test]
    fn match_message_becomes_line_record() {
        let record = parse_line(MATCH).expect("parse").expect("record");
        assert_eq!(record.source, Source::Path("src/main.rs".into()));
        assert_eq!(record.line_number, Some(3));
        assert_eq!(record.trimmed_text(), "fn Main() {}");
        assert_eq!(record.submatches, vec![Submatch::new("main", 3, 7)]);
    }

    #[test]
    fn end_message_becomes_stat_record() {
        let line = r#"{"type":"end","data":{"path":{"text":"src/main.rs"},"binary_offset":null,"stats":{"elapsed":{"secs":0,"nanos":1,"human":"0s"},"searches":1,"searches_with_match":1,"bytes_searched":812,"bytes_printed":200,"matched_lines":1,"matches":1}}}"#;
        let record = parse_line(line).expect("parse").expect("record");
        assert_eq!(record.byte_size, Some(812));
        assert_eq!(record.line_number, None);
    }

    #[test]
    fn stdin_and_context_messages() {
        let stdin = r#"{"type":"match","data":{"path":{"text":"<stdin>"},"lines":{"text":"docs/guide.md\n"},"line_number":7,"absolute_offset":0,"submatches":[{"match":{"text":"guide"},"start":5,"end":10}]}}"#;
        let record = parse_line(stdin).expect("parse").expect("record");
        assert!(record.source.is_stdin());
        assert_eq!(record.document().as_deref(), Some("docs/guide.md"));

        let context = r#"{"type":"context","data":{"path":{"text":"a.txt"},"lines":{"text":"near\n"},"line_number":2,"absolute_offset":0,"submatches":[]}}"#;
        let record = parse_line(context).expect("parse").expect("record");
        assert!(!record.is_match());
    }

    #[test]
    fn begin_and_summary_are_dropped() {
        let begin = r#"{"type":"begin","data":{"path":{"text":"a.txt"}}}"#;
        let summary = r#"{"type":"summary","data":{"elapsed_total":{"secs":0,"nanos":5,"human":"0s"},"stats":{"bytes_searched":1}}}"#;
        assert!(parse_line(begin).expect("parse").is_none());
        assert!(parse_line(summary).expect("parse").is_none());
    }

    #[test]
    fn binary_lines_keep_submatch_spans() {
        let line = r#"{"type":"match","data":{"path":{"text":"blob.bin"},"lines":{"bytes":"AAFmb28K"},"line_number":1,"absolute_offset":0,"submatches":[{"match":{"text":"foo"},"start":2,"end":5}]}}"#;
        let record = parse_line(line).expect("parse").expect("record");
        assert!(record.text.is_none());
        assert_eq!(record.submatches.len(), 1);
    }

    #[test]
    fn parse_records_skips_garbage_and_keeps_order() {
        let mut output = String::new();
        output.push_str(r#"{"type":"begin","data":{"path":{"text":"src/main.rs"}}}"#);
        output.push('\n');
        output.push_str(MATCH);
        output.push_str("\nnot json\n");
        output.push_str(r#"{"type":"end","data":{"path":{"text":"src/main.rs"},"binary_offset":null,"stats":{"bytes_searched":9}}}"#);
        output.push('\n');

        let records = parse_records(output.as_bytes());
        assert_eq!(records.len(), 2);
        assert!(records[0].is_match());
        assert_eq!(records[1].byte_size, Some(9));
    }

    #[test]
    fn bulk_output_parses_in_order() {
        let count = BULK_PARSE_THRESHOLD + 10;
        let output: String = (1..=count)
            .map(|n| {
                format!(
                    r#"{{"type":"match","data":{{"path":{{"text":"big.txt"}},"lines":{{"text":"foo\n"}},"line_number":{n},"absolute_offset":0,"submatches":[{{"match":{{"text":"foo"}},"start":0,"end":3}}]}}}}"#
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let records = parse_records(output.as_bytes());
        assert_eq!(records.len(), count);
        assert_eq!(records[0].line_number, Some(1));
        assert_eq!(records[count - 1].line_number, Some(count as u64));
    }
}
