// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate enumeration and matching through ripgrep

pub mod json;

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;

use crate::errors::{RankError, SEARCH_TOOL_FAILURE_CODE};
use crate::record::MatchRecord;

/// Runs the external search tool; every invocation re-scans the tree
#[derive(Debug, Clone)]
pub struct RipgrepScanner {
    tool: String,
    program: PathBuf,
    paths: Vec<String>,
    extra_args: Vec<String>,
}

impl RipgrepScanner {
    /// Locate `tool` on PATH (or use it directly when it is a path)
    pub fn new(tool: &str) -> Result<Self, RankError> {
        let program = which::which(tool).map_err(|_| RankError::SearchToolNotFound {
            tool: tool.to_string(),
        })?;
        Ok(Self {
            tool: tool.to_string(),
            program,
            paths: Vec::new(),
            extra_args: Vec::new(),
        })
    }

    /// Paths to search; defaults to the current directory
    pub fn with_paths(mut self, paths: Vec<String>) -> Self {
        self.paths = paths;
        self
    }

    /// Flags forwarded to enumeration and content search; the file-name
    /// search only gets those [`is_match_mode_flag`] accepts
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    fn search_paths(&self) -> Vec<String> {
        if self.paths.is_empty() {
            vec![".".to_string()]
        } else {
            self.paths.clone()
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null());
        cmd
    }

    fn run(&self, mut cmd: Command) -> Result<Output, RankError> {
        tracing::debug!(command = ?cmd, "running search tool");
        cmd.output().map_err(|source| RankError::Spawn {
            tool: self.tool.clone(),
            source,
        })
    }

    /// List every file the search covers
    pub fn list_files(&self) -> Result<Vec<String>, RankError> {
        let mut cmd = self.command();
        cmd.arg("--files")
            .args(&self.extra_args)
            .arg("--")
            .args(self.search_paths());
        let output = self.run(cmd)?;

        match output.status.code() {
            Some(0) | Some(1) => {}
            code => {
                return Err(RankError::Enumeration {
                    tool: self.tool.clone(),
                    code: code.unwrap_or(SEARCH_TOOL_FAILURE_CODE),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                })
            }
        }

        let files: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        tracing::debug!(files = files.len(), "enumerated candidates");
        Ok(files)
    }

    /// Match `patterns` against file contents
    pub fn search_contents(&self, patterns: &[String]) -> Result<Vec<MatchRecord>, RankError> {
        let mut cmd = self.command();
        cmd.args(["--json", "--ignore-case"]).args(&self.extra_args);
        push_patterns(&mut cmd, patterns);
        cmd.arg("--").args(self.search_paths());

        let output = self.run(cmd)?;
        self.check_search_status(&output)?;
        let records = json::parse_records(&output.stdout);
        tracing::debug!(records = records.len(), "content search finished");
        Ok(records)
    }

    /// Match `patterns` against the candidate paths themselves
    ///
    /// The paths are fed through standard input, so the resulting records
    /// carry the stdin source and the matched path as their text. Only the
    /// forwarded flags that change how patterns match are passed along.
    pub fn search_filenames(
        &self,
        patterns: &[String],
        files: &[String],
    ) -> Result<Vec<MatchRecord>, RankError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(["--json", "--ignore-case"])
            .args(self.extra_args.iter().filter(|arg| is_match_mode_flag(arg)));
        push_patterns(&mut cmd, patterns);
        cmd.arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        tracing::debug!(command = ?cmd, candidates = files.len(), "running file-name search");

        let spawn_err = |source: std::io::Error| RankError::Spawn {
            tool: self.tool.clone(),
            source,
        };
        let mut child = cmd.spawn().map_err(spawn_err)?;

        let mut listing = files.join("\n");
        listing.push('\n');
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || {
                // The tool may exit before reading everything; that is not our failure.
                let _ = stdin.write_all(listing.as_bytes());
            })
        });

        let output = child.wait_with_output().map_err(spawn_err)?;
        if let Some(handle) = writer {
            let _ = handle.join();
        }
        self.check_search_status(&output)?;
        Ok(json::parse_records(&output.stdout))
    }

    fn check_search_status(&self, output: &Output) -> Result<(), RankError> {
        match output.status.code() {
            Some(0) | Some(1) => Ok(()),
            Some(2) => {
                tracing::warn!(
                    tool = %self.tool,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "search reported errors; ranking partial results"
                );
                Ok(())
            }
            code => Err(RankError::SearchFailed {
                tool: self.tool.clone(),
                code: code.unwrap_or(SEARCH_TOOL_FAILURE_CODE),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}

/// Long flags (without dashes) that change how patterns match
const MATCH_MODE_LONG: &[&str] = &[
    "case-sensitive",
    "ignore-case",
    "smart-case",
    "fixed-strings",
    "no-fixed-strings",
    "word-regexp",
    "line-regexp",
    "pcre2",
    "no-pcre2",
    "engine",
];

/// Short flags that change how patterns match
const MATCH_MODE_SHORT: &str = "sSiFwxP";

/// Whether a forwarded flag also applies to the file-name search
pub fn is_match_mode_flag(arg: &str) -> bool {
    if let Some(long) = arg.strip_prefix("--") {
        let name = long.split_once('=').map_or(long, |(name, _)| name);
        return MATCH_MODE_LONG.contains(&name);
    }
    match arg.strip_prefix('-') {
        Some(shorts) if !shorts.is_empty() => shorts.chars().all(|c| MATCH_MODE_SHORT.contains(c)),
        _ => false,
    }
}

fn push_patterns(cmd: &mut Command, patterns: &[String]) {
    for pattern in patterns {
        cmd.arg("-e").arg(pattern);
    }
}
