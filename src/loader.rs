//! # Corpus Loader Module
//!
//! ## Purpose
//! Decodes the two record streams into a normalized [`Corpus`]. The event
//! stream is one JSON document of talks and meetings; the paper stream is a
//! manifest naming JSON shards that are fetched and decoded in order. Loading
//! is the only asynchronous phase of the system; everything after it is
//! synchronous over the frozen corpus.
//!
//! ## Input/Output Specification
//! - **Input**: A [`RecordSource`] yielding raw JSON documents
//! - **Output**: A normalized corpus, or the first load error
//! - **Error Handling**: A missing source is `LoadUnavailable`; a bad manifest
//!   aborts with `ManifestInvalid`; the first shard failure wins
//!
//! ## Key Features
//! - Source trait so hosts can back the load with files or anything else
//! - Records without an id or title are silently dropped, never fatal
//! - Per-stream record counts logged at info level

use crate::errors::{Result, SearchError};
use crate::normalize::{Normalizer, RawMeeting, RawPaper, RawTalk};
use crate::Corpus;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Event stream document: talks plus the meetings they belong to
#[derive(Debug, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub talks: Vec<RawTalk>,
    #[serde(default)]
    pub meetings: Vec<RawMeeting>,
}

/// One paper shard document
#[derive(Debug, Deserialize)]
pub struct PaperPayload {
    #[serde(default)]
    pub papers: Vec<RawPaper>,
    /// Provenance entries; carried by the producer but not indexed
    #[serde(default)]
    pub sources: Vec<serde_json::Value>,
}

/// Paper stream manifest naming the shard documents
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub shards: Option<Vec<String>>,
    #[serde(default)]
    pub generated: Option<String>,
}

impl Manifest {
    /// Shard list, or `ManifestInvalid` when absent or empty
    pub fn validated_shards(&self) -> Result<&[String]> {
        match self.shards.as_deref() {
            Some(shards) if !shards.is_empty() => Ok(shards),
            _ => Err(SearchError::ManifestInvalid {
                field: "shards".to_string(),
            }),
        }
    }
}

/// An asynchronous producer of the raw record documents
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// The event stream document, or `None` when the producer is absent
    async fn events(&self) -> Result<Option<String>>;
    /// The paper manifest document, or `None` when the producer is absent
    async fn papers_manifest(&self) -> Result<Option<String>>;
    /// One paper shard named by the manifest
    async fn paper_shard(&self, name: &str) -> Result<String>;
}

/// Record source backed by a directory tree:
/// `<root>/events.json`, `<root>/papers/manifest.json`, `<root>/papers/<shard>`
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read_optional(&self, relative: &str) -> Result<Option<String>> {
        let path = self.root.join(relative);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl RecordSource for FileSource {
    async fn events(&self) -> Result<Option<String>> {
        self.read_optional("events.json").await
    }

    async fn papers_manifest(&self) -> Result<Option<String>> {
        self.read_optional("papers/manifest.json").await
    }

    async fn paper_shard(&self, name: &str) -> Result<String> {
        let path = self.root.join("papers").join(name);
        Ok(tokio::fs::read_to_string(&path).await?)
    }
}

/// Load and normalize the full corpus from a source.
///
/// Returns `LoadUnavailable` when neither stream exists; a host catching that
/// error should fall back to an empty library so the projection can surface
/// "data unavailable" instead of crashing.
pub async fn load_corpus(source: &dyn RecordSource) -> Result<Corpus> {
    let normalizer = Normalizer::new()?;

    let events = source.events().await?;
    let manifest = source.papers_manifest().await?;
    if events.is_none() && manifest.is_none() {
        return Err(SearchError::LoadUnavailable {
            source: "events, papers".to_string(),
            details: "no record stream produced any document".to_string(),
        });
    }

    let mut corpus = Corpus::default();

    if let Some(text) = events {
        let payload: EventPayload = serde_json::from_str(&text)?;
        let raw_talks = payload.talks.len();
        corpus.talks = payload.talks.iter().filter_map(|t| normalizer.talk(t)).collect();
        corpus.meetings = payload.meetings.iter().filter_map(|m| normalizer.meeting(m)).collect();
        if corpus.talks.len() < raw_talks {
            warn!(dropped = raw_talks - corpus.talks.len(), "talks without id or title skipped");
        }
        info!(talks = corpus.talks.len(), meetings = corpus.meetings.len(), "event stream loaded");
    }

    if let Some(text) = manifest {
        let manifest: Manifest = serde_json::from_str(&text)?;
        for shard in manifest.validated_shards()? {
            let text = source
                .paper_shard(shard)
                .await
                .map_err(|err| SearchError::ShardFailed {
                    shard: shard.clone(),
                    details: err.to_string(),
                })?;
            let payload: PaperPayload =
                serde_json::from_str(&text).map_err(|err| SearchError::ShardFailed {
                    shard: shard.clone(),
                    details: err.to_string(),
                })?;
            corpus
                .papers
                .extend(payload.papers.iter().filter_map(|p| normalizer.paper(p)));
        }
        info!(papers = corpus.papers.len(), "paper stream loaded");
    }

    Ok(corpus)
}
