// SPDX-License-Identifier: MIT OR Apache-2.0

//! rgrank - BM25-ranked search over ripgrep matches
//!
//! Shared modules for the rgrank CLI tool. Nothing is indexed: each run
//! re-scans the tree with ripgrep, ranks files, then picks the lines worth
//! showing from each ranked file.

pub mod config;
pub mod errors;
pub mod formatter;
pub mod output;
pub mod rank;
pub mod record;
pub mod scanner;
