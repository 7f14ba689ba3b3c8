// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional external line formatter
//!
//! The formatter reads the same JSON message stream ripgrep writes and
//! answers with one rendered line per `match`/`context` message, plus one
//! header line before every file group except the first. Requests and
//! responses are strictly interleaved: one group is written, then its lines
//! are read back before the next group goes out.

use serde_json::json;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::errors::RankError;
use crate::record::MatchRecord;

/// A formatter binary found on PATH
#[derive(Debug, Clone)]
pub struct Formatter {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl Formatter {
    /// Find `name` on PATH; `None` means render unformatted
    pub fn locate(name: &str, args: &[String]) -> Option<Self> {
        match which::which(name) {
            Ok(program) => Some(Self {
                name: name.to_string(),
                program,
                args: args.to_vec(),
            }),
            Err(err) => {
                tracing::debug!(formatter = name, error = %err, "formatter not found; using plain output");
                None
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start the formatter process
    pub fn spawn(&self) -> io::Result<FormatterSession<ChildStdin, BufReader<ChildStdout>>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("formatter stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("formatter stdout unavailable"))?;
        let mut session = FormatterSession::new(&self.name, stdin, BufReader::new(stdout));
        session.child = Some(child);
        Ok(session)
    }
}

/// Request/response exchange with a running formatter
pub struct FormatterSession<W: Write, R: BufRead> {
    name: String,
    writer: Option<W>,
    reader: R,
    groups: usize,
    child: Option<Child>,
}

impl<W: Write, R: BufRead> FormatterSession<W, R> {
    pub fn new(name: &str, writer: W, reader: R) -> Self {
        Self {
            name: name.to_string(),
            writer: Some(writer),
            reader,
            groups: 0,
            child: None,
        }
    }

    fn desync(&self, source: Option<io::Error>) -> RankError {
        RankError::FormatterDesync {
            formatter: self.name.clone(),
            source,
        }
    }

    /// Send one file's lines and read back their rendered form
    pub fn format_group(
        &mut self,
        path: &str,
        records: &[MatchRecord],
    ) -> Result<Vec<String>, RankError> {
        let request = group_messages(path, records);
        let Some(writer) = self.writer.as_mut() else {
            return Err(self.desync(None));
        };
        if let Err(err) = writer
            .write_all(request.as_bytes())
            .and_then(|()| writer.flush())
        {
            return Err(self.desync(Some(err)));
        }

        if self.groups > 0 {
            self.read_response_line()?;
        }
        let mut lines = Vec::with_capacity(records.len());
        for _ in records {
            lines.push(self.read_response_line()?);
        }
        self.groups += 1;
        Ok(lines)
    }

    fn read_response_line(&mut self) -> Result<String, RankError> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Err(self.desync(None)),
            Ok(_) => Ok(line.trim_end_matches(['\n', '\r']).to_string()),
            Err(err) => Err(self.desync(Some(err))),
        }
    }

    /// Close the formatter's input and wait for it to exit
    pub fn finish(mut self) -> Result<(), RankError> {
        drop(self.writer.take());
        if let Some(mut child) = self.child.take() {
            match child.wait() {
                Ok(status) if !status.success() => {
                    tracing::warn!(formatter = %self.name, %status, "formatter exited unsuccessfully");
                }
                Ok(_) => {}
                Err(err) => return Err(self.desync(Some(err))),
            }
        }
        Ok(())
    }
}

/// Rebuild the search tool's message stream for one file group
pub fn group_messages(path: &str, records: &[MatchRecord]) -> String {
    let path_data = json!({ "text": path });
    let mut out = String::new();
    push_message(&mut out, json!({ "type": "begin", "data": { "path": path_data } }));

    for record in records {
        let text = record.text.as_deref().unwrap_or("\n");
        let submatches: Vec<serde_json::Value> = record
            .submatches
            .iter()
            .map(|sub| {
                let matched = text.get(sub.start..sub.end).unwrap_or(&sub.term);
                json!({ "match": { "text": matched }, "start": sub.start, "end": sub.end })
            })
            .collect();
        let kind = if record.is_match() { "match" } else { "context" };
        push_message(
            &mut out,
            json!({
                "type": kind,
                "data": {
                    "path": path_data,
                    "lines": { "text": text },
                    "line_number": record.line_number,
                    "absolute_offset": null,
                    "submatches": submatches,
                }
            }),
        );
    }

    let matched = records.iter().filter(|r| r.is_match()).count();
    push_message(
        &mut out,
        json!({
            "type": "end",
            "data": {
                "path": path_data,
                "binary_offset": null,
                "stats": {
                    "elapsed": { "secs": 0, "nanos": 0, "human": "0s" },
                    "searches": 1,
                    "searches_with_match": 1,
                    "bytes_searched": 0,
                    "bytes_printed": 0,
                    "matched_lines": matched,
                    "matches": matched,
                }
            }
        }),
    );
    out
}

fn push_message(out: &mut String, message: serde_json::Value) {
    out.push_str(&message.to_string());
    out.push('\n');
}
