//! # Community Library Search Core
//!
//! ## Overview
//! This library implements the in-memory search, ranking, and faceting core for
//! a client-side browser over a curated corpus of conference talks and academic
//! papers. It ingests two heterogeneous record streams, canonicalizes entities
//! (people, topics) across them, builds auxiliary indexes, and answers ranked
//! queries with composable facet filters, all without a backing server.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `loader`: Manifest and shard decoding for the two record streams
//! - `normalize`: Record cleaning and derivation of stable secondary fields
//! - `people`: Canonical person identities merged across talks and papers
//! - `topics`: Canonical topic vocabulary, alias table, and text detection rules
//! - `index`: Precomputed lowered strings, token bags, and autocomplete pools
//! - `query`: Two-stage ranked search (exact scoring with fuzzy fallback)
//! - `facets`: Composable filters with facet dependency rules
//! - `projection`: Render-ready result bundles for the host UI
//! - `state`: Search state reducer and session snapshots
//! - `urlstate`: Compact, stable URL query representation of the state
//! - `config`: Scoring weights, fuzzy bounds, and projection limits
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Talk and paper JSON records, search queries, facet state
//! - **Output**: Deterministically ordered result lists with faceting metadata
//! - **Performance**: A full scan per keystroke over ~10^4 records is acceptable
//!
//! ## Usage
//! ```rust,no_run
//! use library_hub_search::{Config, Library};
//! use library_hub_search::loader::{load_corpus, FileSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let corpus = load_corpus(&FileSource::new("data")).await?;
//!     let library = Library::build(corpus, Config::default())?;
//!     let projection = library.project(&Default::default(), library_hub_search::state::Page::Talks);
//!     println!("{} results", projection.result_count);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod facets;
pub mod index;
pub mod loader;
pub mod normalize;
pub mod people;
pub mod projection;
pub mod query;
pub mod state;
pub mod topics;
pub mod urlstate;

// Re-exports for convenience
pub use config::Config;
pub use errors::{Result, SearchError};
pub use projection::{Library, Projection};
pub use query::SearchMode;
pub use state::{SearchEvent, SearchState};

use serde::{Deserialize, Serialize};

/// A speaker or author entry. Never a standalone record; embedded in talks
/// and papers and canonicalized by [`people::PersonIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Display name as it appeared on the record
    pub name: String,
    /// Affiliation, when known
    pub affiliation: Option<String>,
}

/// Closed set of talk categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TalkCategory {
    Keynote,
    TechnicalTalk,
    Tutorial,
    Panel,
    QuickTalk,
    LightningTalk,
    StudentTalk,
    Bof,
    Poster,
    Workshop,
    #[default]
    Other,
}

impl TalkCategory {
    /// All categories in display order
    pub const ALL: [TalkCategory; 11] = [
        TalkCategory::Keynote,
        TalkCategory::TechnicalTalk,
        TalkCategory::Tutorial,
        TalkCategory::Panel,
        TalkCategory::QuickTalk,
        TalkCategory::LightningTalk,
        TalkCategory::StudentTalk,
        TalkCategory::Bof,
        TalkCategory::Poster,
        TalkCategory::Workshop,
        TalkCategory::Other,
    ];

    /// The stable slug used in record JSON and URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            TalkCategory::Keynote => "keynote",
            TalkCategory::TechnicalTalk => "technical-talk",
            TalkCategory::Tutorial => "tutorial",
            TalkCategory::Panel => "panel",
            TalkCategory::QuickTalk => "quick-talk",
            TalkCategory::LightningTalk => "lightning-talk",
            TalkCategory::StudentTalk => "student-talk",
            TalkCategory::Bof => "bof",
            TalkCategory::Poster => "poster",
            TalkCategory::Workshop => "workshop",
            TalkCategory::Other => "other",
        }
    }

    /// Parse a category slug; unknown inputs map to `Other`
    pub fn parse(raw: &str) -> TalkCategory {
        match raw.trim().to_ascii_lowercase().as_str() {
            "keynote" => TalkCategory::Keynote,
            "technical-talk" => TalkCategory::TechnicalTalk,
            "tutorial" => TalkCategory::Tutorial,
            "panel" => TalkCategory::Panel,
            "quick-talk" => TalkCategory::QuickTalk,
            "lightning-talk" => TalkCategory::LightningTalk,
            "student-talk" => TalkCategory::StudentTalk,
            "bof" => TalkCategory::Bof,
            "poster" => TalkCategory::Poster,
            "workshop" => TalkCategory::Workshop,
            _ => TalkCategory::Other,
        }
    }
}

/// Closed set of paper types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaperType {
    Thesis,
    ResearchPaper,
    PresentationPaper,
    #[default]
    Other,
}

impl PaperType {
    /// The stable slug used in record JSON and URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperType::Thesis => "thesis",
            PaperType::ResearchPaper => "research-paper",
            PaperType::PresentationPaper => "presentation-paper",
            PaperType::Other => "other",
        }
    }

    /// Parse a paper type slug; unknown inputs map to `Other`
    pub fn parse(raw: &str) -> PaperType {
        match raw.trim().to_ascii_lowercase().as_str() {
            "thesis" => PaperType::Thesis,
            "research-paper" => PaperType::ResearchPaper,
            "presentation-paper" => PaperType::PresentationPaper,
            _ => PaperType::Other,
        }
    }
}

/// A conference talk record, immutable after load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Talk {
    /// Stable identifier
    pub id: String,
    /// Talk title
    pub title: String,
    /// Abstract text (may be empty)
    pub abstract_text: String,
    /// Talk category
    pub category: TalkCategory,
    /// Meeting slug in `YYYY-...` format
    pub meeting: String,
    /// Human-readable meeting name
    pub meeting_name: String,
    /// Meeting location
    pub meeting_location: String,
    /// Meeting date, pretty-printed when parseable
    pub meeting_date: String,
    /// Ordered speaker list
    pub speakers: Vec<Person>,
    /// Editorial tags
    pub tags: Vec<String>,
    /// Video URL, empty when no recording exists
    pub video_url: String,
    /// YouTube video id derived from the URL
    pub video_id: String,
    /// Slides URL, empty when unavailable
    pub slides_url: String,
    /// Project URL, empty when unavailable
    pub project_url: String,
    /// Four-digit year derived from the meeting slug prefix, or empty
    pub year: String,
}

/// An academic paper record, immutable after load
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paper {
    /// Stable identifier
    pub id: String,
    /// Paper title
    pub title: String,
    /// Abstract text (may be empty)
    pub abstract_text: String,
    /// Four-digit publication year, or empty when unknown
    pub year: String,
    /// Publication name (journal, proceedings)
    pub publication: String,
    /// Venue string, normalized to `Publication | Vol. X (Issue Y)` segments
    pub venue: String,
    /// Paper type
    pub paper_type: PaperType,
    /// Landing page URL
    pub paper_url: String,
    /// Source (PDF or DOI) URL
    pub source_url: String,
    /// Canonical bare DOI (`10.xxxx/...`), or empty
    pub doi: String,
    /// Canonical OpenAlex URL (`https://openalex.org/W...`), or empty
    pub openalex_id: String,
    /// Citation count, zero when unknown
    pub citation_count: u32,
    /// Ordered author list
    pub authors: Vec<Person>,
    /// Editorial tags
    pub tags: Vec<String>,
    /// Extracted keywords
    pub keywords: Vec<String>,
}

/// A developer meeting, derived from the event stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    /// Slug in `YYYY-...` format
    pub slug: String,
    /// Human-readable name
    pub name: String,
    /// Four-digit year derived from the slug prefix, or empty
    pub year: String,
    /// Location
    pub location: String,
    /// Date, pretty-printed when parseable
    pub date: String,
    /// Whether the meeting was cancelled
    pub cancelled: bool,
}

/// Computed per-meeting statistics; never stored on the record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingStats {
    pub talk_count: usize,
    pub slide_count: usize,
}

/// The full normalized corpus, loaded once per session and immutable thereafter
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub talks: Vec<Talk>,
    pub papers: Vec<Paper>,
    pub meetings: Vec<Meeting>,
}

impl Corpus {
    /// Compute talk and slide counts for a meeting slug
    pub fn meeting_stats(&self, slug: &str) -> MeetingStats {
        let mut stats = MeetingStats::default();
        for talk in &self.talks {
            if talk.meeting == slug {
                stats.talk_count += 1;
                if !talk.slides_url.is_empty() {
                    stats.slide_count += 1;
                }
            }
        }
        stats
    }
}
