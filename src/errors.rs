//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the library search core. Only load-time and
//! configuration problems are modeled as errors: once the corpus is built, the
//! query and facet engines are total over their inputs.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from loading, decoding, and configuration
//! - **Output**: Structured error types with context for logging and surfacing
//! - **Error Categories**: Loading, Configuration, Serialization
//!
//! ## Key Features
//! - Hierarchical error types with detailed context
//! - Automatic conversion from common library errors
//! - Category tags for structured logging
//!
//! ## Usage
//! ```rust,ignore
//! use library_hub_search::errors::{Result, SearchError};
//!
//! fn load_manifest() -> Result<()> {
//!     Err(SearchError::ManifestInvalid {
//!         field: "eventShards".to_string(),
//!     })
//! }
//! ```

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, SearchError>;

/// Error types for the library search core
///
/// Note: `Display`, `Error`, and `From` are implemented by hand because
/// `LoadUnavailable` has a `String` field named `source`, which thiserror's
/// derive would insist on treating as the error source.
#[derive(Debug)]
pub enum SearchError {
    /// The external record source is missing entirely; callers emit an empty
    /// index and surface "data unavailable"
    LoadUnavailable { source: String, details: String },

    /// Required fields missing or malformed in the corpus manifest
    ManifestInvalid { field: String },

    /// A shard fetch or decode failed; the first shard error aborts the load
    ShardFailed { shard: String, details: String },

    /// Configuration errors
    Config { message: String },

    /// Internal system errors
    Internal { message: String },

    /// Generic I/O errors
    Io(std::io::Error),

    /// JSON decoding errors
    Json(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::LoadUnavailable { source, details } => {
                write!(f, "Record source '{source}' is unavailable: {details}")
            }
            SearchError::ManifestInvalid { field } => {
                write!(f, "Manifest is invalid: missing or malformed field '{field}'")
            }
            SearchError::ShardFailed { shard, details } => {
                write!(f, "Shard '{shard}' failed to load: {details}")
            }
            SearchError::Config { message } => write!(f, "Configuration error: {message}"),
            SearchError::Internal { message } => write!(f, "Internal error: {message}"),
            SearchError::Io(err) => write!(f, "I/O error: {err}"),
            SearchError::Json(err) => write!(f, "JSON error: {err}"),
            SearchError::Toml(err) => write!(f, "TOML error: {err}"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::Io(err) => Some(err),
            SearchError::Json(err) => Some(err),
            SearchError::Toml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::Io(err)
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Json(err)
    }
}

impl From<toml::de::Error> for SearchError {
    fn from(err: toml::de::Error) -> Self {
        SearchError::Toml(err)
    }
}

impl SearchError {
    /// Check if the error is recoverable (the host may retry the load)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SearchError::LoadUnavailable { .. } | SearchError::ShardFailed { .. } | SearchError::Io(_)
        )
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            SearchError::LoadUnavailable { .. }
            | SearchError::ManifestInvalid { .. }
            | SearchError::ShardFailed { .. } => "loading",
            SearchError::Config { .. } | SearchError::Toml(_) => "configuration",
            SearchError::Internal { .. } => "internal",
            SearchError::Io(_) | SearchError::Json(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_cover_all_variants() {
        let errs = vec![
            SearchError::LoadUnavailable {
                source: "events".into(),
                details: "missing".into(),
            },
            SearchError::ManifestInvalid { field: "version".into() },
            SearchError::ShardFailed {
                shard: "2024-10.json".into(),
                details: "truncated".into(),
            },
            SearchError::Config { message: "bad weight".into() },
        ];
        for err in errs {
            assert!(!err.category().is_empty());
        }
    }

    #[test]
    fn shard_failures_are_recoverable() {
        let err = SearchError::ShardFailed {
            shard: "papers-0.json".into(),
            details: "EOF".into(),
        };
        assert!(err.is_recoverable());
        assert!(!SearchError::ManifestInvalid { field: "version".into() }.is_recoverable());
    }
}
