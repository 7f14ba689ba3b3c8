// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types with helpful suggestions
//!
//! Provides user-friendly error messages with actionable suggestions.

use std::io;
use thiserror::Error;

/// Exit code used when the search tool fails without one of its own
pub const SEARCH_TOOL_FAILURE_CODE: i32 = 2;

#[derive(Debug, Error)]
pub enum RankError {
    /// The configured search tool is not installed
    #[error(
        "Search tool '{tool}' not found on PATH\n\n\
         Suggestion: install ripgrep (https://github.com/BurntSushi/ripgrep)\n\
         Or point rgrank at another binary in .rgrankrc.toml:\n  search_tool = \"/path/to/rg\""
    )]
    SearchToolNotFound { tool: String },

    /// The search tool could not list candidate files
    #[error("'{tool}' could not list files to search (exit code {code})\n{stderr}")]
    Enumeration {
        tool: String,
        code: i32,
        stderr: String,
    },

    /// The search tool failed outright while matching
    #[error("'{tool}' failed while searching (exit code {code})\n{stderr}")]
    SearchFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to run '{tool}'")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The formatter stopped answering mid-stream
    #[error(
        "Formatter '{formatter}' stopped responding\n\n\
         Suggestion: rerun with --no-formatter, or check `formatter_args` in .rgrankrc.toml"
    )]
    FormatterDesync {
        formatter: String,
        #[source]
        source: Option<io::Error>,
    },
}

impl RankError {
    /// Process exit code this error should produce
    pub fn exit_code(&self) -> i32 {
        match self {
            RankError::Enumeration { code, .. } => *code,
            RankError::SearchToolNotFound { .. } => SEARCH_TOOL_FAILURE_CODE,
            _ => 1,
        }
    }
}
