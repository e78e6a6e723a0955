//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the library search core. Every scoring weight,
//! fuzzy-matching bound, and projection limit lives here so that editorial tuning
//! does not require touching engine code.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Range checks on weights, bounds, and limits
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (`LIBRARY_SEARCH_*`)
//! 2. Configuration file
//! 3. Default values
//!
//! ## Usage
//! ```rust,ignore
//! use library_hub_search::config::Config;
//!
//! let config = Config::from_file("config.toml")?;
//! println!("Title prefix weight: {}", config.scoring.talk.title_prefix);
//! ```

use crate::errors::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure containing all tunables
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Query tokenization and debounce behavior
    pub query: QueryConfig,
    /// Exact-stage scoring weights
    pub scoring: ScoringConfig,
    /// Fuzzy-stage matching bounds and scores
    pub fuzzy: FuzzyConfig,
    /// Projection output limits
    pub projection: ProjectionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Query tokenization and input handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Minimum token length; shorter tokens are dropped
    pub min_token_len: usize,
    /// Suggested input debounce in milliseconds. A responsiveness hint for the
    /// host, not a correctness requirement.
    pub debounce_ms: u64,
}

/// Exact-stage scoring weights and recency nudge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Per-field weights for talks
    pub talk: TalkWeights,
    /// Per-field weights for papers
    pub paper: PaperWeights,
    /// Recency epoch for talks (first developer meeting year)
    pub talk_epoch: i32,
    /// Recency epoch for papers (earliest catalogued publication year)
    pub paper_epoch: i32,
    /// Additive per-year recency nudge
    pub recency_nudge: f64,
}

/// Exact-stage field weights for talks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TalkWeights {
    pub title_prefix: f64,
    pub title: f64,
    pub speakers: f64,
    pub tags: f64,
    pub abstract_text: f64,
    pub meeting: f64,
    pub category: f64,
}

/// Exact-stage field weights for papers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperWeights {
    pub title_prefix: f64,
    pub title: f64,
    pub authors: f64,
    pub tags: f64,
    pub keywords: f64,
    pub abstract_text: f64,
    pub publication: f64,
    pub venue: f64,
    pub paper_type: f64,
    pub year: f64,
}

/// Fuzzy-stage matching bounds and word scores
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Score for an exact bag-word match
    pub equal: f64,
    /// Score when a bag word starts with the token
    pub prefix: f64,
    /// Score when a bag word contains the token
    pub substring: f64,
    /// Score when the token is a subsequence of a bag word
    pub subsequence: f64,
    /// Minimum token length for subsequence matching
    pub min_subsequence_len: usize,
    /// Score for edit distance 1 (tokens of length 4..=6)
    pub distance_one: f64,
    /// Score for edit distance 2 (tokens of length >= 7)
    pub distance_two: f64,
    /// Field bonuses applied only when the field score is positive
    pub title_bonus: f64,
    pub people_bonus: f64,
    pub tag_bonus: f64,
    pub keyword_bonus: f64,
    pub publication_bonus: f64,
}

/// Projection output limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Number of topic suggestions emitted on an empty result
    pub suggestion_limit: usize,
    /// Maximum canonical topics surfaced per record
    pub topics_per_record: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Include span targets in output
    pub show_targets: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            min_token_len: 2,
            debounce_ms: 150,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            talk: TalkWeights::default(),
            paper: PaperWeights::default(),
            talk_epoch: 2007,
            paper_epoch: 2002,
            recency_nudge: 0.1,
        }
    }
}

impl Default for TalkWeights {
    fn default() -> Self {
        Self {
            title_prefix: 100.0,
            title: 50.0,
            speakers: 30.0,
            tags: 15.0,
            abstract_text: 10.0,
            meeting: 5.0,
            category: 5.0,
        }
    }
}

impl Default for PaperWeights {
    fn default() -> Self {
        Self {
            title_prefix: 100.0,
            title: 50.0,
            authors: 34.0,
            tags: 20.0,
            keywords: 16.0,
            abstract_text: 12.0,
            publication: 10.0,
            venue: 8.0,
            paper_type: 6.0,
            year: 6.0,
        }
    }
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            equal: 20.0,
            prefix: 16.0,
            substring: 14.0,
            subsequence: 11.0,
            min_subsequence_len: 3,
            distance_one: 10.0,
            distance_two: 8.0,
            title_bonus: 3.0,
            people_bonus: 2.0,
            tag_bonus: 2.0,
            keyword_bonus: 2.0,
            publication_bonus: 1.0,
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: 8,
            topics_per_record: 6,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_targets: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    /// when the file does not exist
    pub fn load() -> Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            Self::from_file(path)
        } else {
            let mut config = Config::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| SearchError::Config {
            message: format!("Failed to read config file {}: {}", path.as_ref().display(), e),
        })?;

        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("LIBRARY_SEARCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(limit) = std::env::var("LIBRARY_SEARCH_SUGGESTION_LIMIT") {
            if let Ok(parsed) = limit.parse() {
                self.projection.suggestion_limit = parsed;
            }
        }
        if let Ok(debounce) = std::env::var("LIBRARY_SEARCH_DEBOUNCE_MS") {
            if let Ok(parsed) = debounce.parse() {
                self.query.debounce_ms = parsed;
            }
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.query.min_token_len == 0 {
            return Err(SearchError::Config {
                message: "query.min_token_len must be at least 1".to_string(),
            });
        }
        if self.scoring.recency_nudge < 0.0 {
            return Err(SearchError::Config {
                message: "scoring.recency_nudge must not be negative".to_string(),
            });
        }
        if self.scoring.talk.title_prefix <= 0.0 || self.scoring.paper.title_prefix <= 0.0 {
            return Err(SearchError::Config {
                message: "title_prefix weights must be positive".to_string(),
            });
        }
        if self.fuzzy.min_subsequence_len < 2 {
            return Err(SearchError::Config {
                message: "fuzzy.min_subsequence_len must be at least 2".to_string(),
            });
        }
        if self.projection.suggestion_limit == 0 {
            return Err(SearchError::Config {
                message: "projection.suggestion_limit must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Serialize the configuration to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SearchError::Config {
            message: format!("Failed to serialize config: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_scoring_tables() {
        let config = Config::default();
        assert_eq!(config.scoring.talk.title_prefix, 100.0);
        assert_eq!(config.scoring.paper.authors, 34.0);
        assert_eq!(config.scoring.talk_epoch, 2007);
        assert_eq!(config.scoring.paper_epoch, 2002);
        assert_eq!(config.fuzzy.distance_two, 8.0);
    }

    #[test]
    fn defaults_pass_validation() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = Config::default();
        config.query.min_token_len = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fuzzy.min_subsequence_len = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_round_trip() {
        let config = Config::default();
        let toml_text = config.to_toml().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_text.as_bytes()).unwrap();

        let loaded = Config::from_file(file.path()).unwrap();
        assert_eq!(loaded.scoring.paper.keywords, config.scoring.paper.keywords);
        assert_eq!(loaded.query.debounce_ms, config.query.debounce_ms);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[projection]\nsuggestion_limit = 3\n").unwrap();

        let loaded = Config::from_file(file.path()).unwrap();
        assert_eq!(loaded.projection.suggestion_limit, 3);
        assert_eq!(loaded.scoring.talk.title, 50.0);
    }
}
