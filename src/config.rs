// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for rgrank
//!
//! Loads configuration from .rgrankrc.toml in current directory or ~/.config/rgrank/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::rank::bm25::Bm25Params;
use crate::rank::corpus::FileCorpusOptions;
use crate::rank::RankingOptions;

pub const CONFIG_FILE_NAME: &str = ".rgrankrc.toml";
pub const DEFAULT_SEARCH_TOOL: &str = "rg";
pub const DEFAULT_FORMATTER: &str = "delta";

/// Output format for results (mirrored from cli for library use)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigOutputFormat {
    #[default]
    Text,
    Json,
}

/// Configuration loaded from .rgrankrc.toml or ~/.config/rgrank/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of files to display
    pub num_matches: Option<usize>,
    /// Representative lines per file
    pub max_lines: Option<usize>,
    /// Context radius around each representative line
    pub context: Option<usize>,
    /// Default output format (text or json)
    pub default_format: Option<String>,
    /// Search tool binary (name on PATH or a path)
    pub search_tool: Option<String>,
    /// Line formatter binary; an empty string disables it
    pub formatter: Option<String>,
    pub formatter_args: Vec<String>,
    pub ranking: RankingConfig,
}

/// `[ranking]` table: BM25 and corpus weighting constants
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub k1: Option<f64>,
    pub b: Option<f64>,
    pub delta: Option<f64>,
    pub boundary_boost: Option<f64>,
    pub path_length_scale: Option<f64>,
    pub filename_match_scale: Option<f64>,
}

impl RankingConfig {
    pub fn bm25_params(&self) -> Bm25Params {
        let defaults = Bm25Params::default();
        Bm25Params {
            k1: self.k1.unwrap_or(defaults.k1),
            b: self.b.unwrap_or(defaults.b),
            delta: self.delta.unwrap_or(defaults.delta),
        }
    }

    pub fn corpus_options(&self) -> FileCorpusOptions {
        let defaults = FileCorpusOptions::default();
        FileCorpusOptions {
            boundary_boost: self.boundary_boost.unwrap_or(defaults.boundary_boost),
            path_length_scale: self.path_length_scale.unwrap_or(defaults.path_length_scale),
            filename_match_scale: self
                .filename_match_scale
                .unwrap_or(defaults.filename_match_scale),
        }
    }
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .rgrankrc.toml in current directory
    /// 2. ~/.config/rgrank/config.toml
    pub fn load() -> Self {
        match std::env::current_dir() {
            Ok(dir) => Self::load_for_dir(&dir),
            Err(_) => Self::load_home().unwrap_or_default(),
        }
    }

    /// Same as [`Config::load`] but looks for .rgrankrc.toml in `dir`
    pub fn load_for_dir(dir: &Path) -> Self {
        if let Some(config) = Self::load_from_path(&dir.join(CONFIG_FILE_NAME)) {
            return config;
        }
        Self::load_home().unwrap_or_default()
    }

    fn load_home() -> Option<Self> {
        let home = dirs::home_dir()?;
        let config_path = home.join(".config").join("rgrank").join("config.toml");
        Self::load_from_path(&config_path)
    }

    fn load_from_path(path: &PathBuf) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get output format from config, parsing the string to ConfigOutputFormat
    pub fn output_format(&self) -> Option<ConfigOutputFormat> {
        self.default_format
            .as_ref()
            .and_then(|s| match s.to_lowercase().as_str() {
                "json" => Some(ConfigOutputFormat::Json),
                "text" => Some(ConfigOutputFormat::Text),
                _ => None,
            })
    }

    pub fn search_tool(&self) -> &str {
        self.search_tool.as_deref().unwrap_or(DEFAULT_SEARCH_TOOL)
    }

    /// Formatter to look for, if any
    pub fn formatter(&self) -> Option<&str> {
        match self.formatter.as_deref() {
            Some("") => None,
            Some(name) => Some(name),
            None => Some(DEFAULT_FORMATTER),
        }
    }

    /// Merge CLI options with config (CLI wins)
    pub fn ranking_options(
        &self,
        num_matches: Option<usize>,
        max_lines: Option<usize>,
        context: Option<usize>,
    ) -> RankingOptions {
        let defaults = RankingOptions::default();
        RankingOptions {
            bm25: self.ranking.bm25_params(),
            corpus: self.ranking.corpus_options(),
            num_matches: num_matches
                .or(self.num_matches)
                .unwrap_or(defaults.num_matches),
            max_lines: max_lines.or(self.max_lines).unwrap_or(defaults.max_lines),
            context: context.or(self.context).unwrap_or(defaults.context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").expect("parse");
        let options = config.ranking_options(None, None, None);
        assert_eq!(options, RankingOptions::default());
        assert_eq!(config.search_tool(), "rg");
        assert_eq!(config.formatter(), Some("delta"));
    }

    #[test]
    fn ranking_table_overrides_constants() {
        let config: Config = toml::from_str(
            r#"
num_matches = 4
context = 0

[ranking]
k1 = 1.2
boundary_boost = 2.0
filename_match_scale = 3.0
"#,
        )
        .expect("parse");
        let options = config.ranking_options(None, Some(7), None);
        assert_eq!(options.num_matches, 4);
        assert_eq!(options.max_lines, 7);
        assert_eq!(options.context, 0);
        assert_eq!(options.bm25.k1, 1.2);
        assert_eq!(options.bm25.b, 0.5);
        assert_eq!(options.corpus.boundary_boost, 2.0);
        assert_eq!(options.corpus.filename_match_scale, 3.0);
        assert_eq!(options.corpus.path_length_scale, 1.0);
    }

    #[test]
    fn cli_values_win() {
        let config: Config = toml::from_str("num_matches = 4").expect("parse");
        assert_eq!(config.ranking_options(Some(2), None, None).num_matches, 2);
    }

    #[test]
    fn empty_formatter_disables_it() {
        let config: Config = toml::from_str(r#"formatter = """#).expect("parse");
        assert_eq!(config.formatter(), None);
    }

    #[test]
    fn loads_from_directory_and_ignores_malformed_files() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "search_tool = \"/opt/rg\"\ndefault_format = \"JSON\"\n",
        )
        .expect("write");
        let config = Config::load_for_dir(dir.path());
        assert_eq!(config.search_tool(), "/opt/rg");
        assert_eq!(config.output_format(), Some(ConfigOutputFormat::Json));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "num_matches = [").expect("write");
        assert!(Config::load_from_path(&bad).is_none());
    }
}
