//! # State Projection Module
//!
//! ## Purpose
//! The [`Library`] facade owns the frozen corpus and every derived index, and
//! turns a search state into a [`Projection`]: the immutable bundle of
//! render-ready values the host needs for one frame. Projection is pure;
//! re-running it for the same state yields the same bundle.
//!
//! ## Input/Output Specification
//! - **Input**: A search state and the page it belongs to
//! - **Output**: Ordered result indices, counts, filter pills, mode,
//!   empty-state suggestions, and an optional cross-corpus prompt
//! - **Guarantee**: No interior mutation besides the topic memo cache
//!
//! ## Key Features
//! - Filter pills carry the exact event that removes them
//! - Empty results surface the top topics as recovery suggestions
//! - Papers page emits a unified-work prompt for single-identity states

use crate::config::Config;
use crate::errors::Result;
use crate::facets;
use crate::index::{PoolEntry, SearchIndex};
use crate::people::{CanonicalPerson, PersonIndex};
use crate::query::{self, Query, SearchMode};
use crate::state::{Page, SearchEvent, SearchState};
use crate::topics::TopicCanonicalizer;
use crate::Corpus;
use serde::Serialize;
use tracing::debug;

/// Which facet a pill represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PillKind {
    Speaker,
    Meeting,
    Category,
    Year,
    Topic,
    Video,
    Slides,
}

/// One active filter, with the event that removes it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterPill {
    pub kind: PillKind,
    pub label: String,
    pub remove: SearchEvent,
}

/// Prompt pointing at the unified work view across both corpora
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossCorpusPrompt {
    pub label: String,
    pub url: String,
}

/// Render-ready bundle for one state snapshot. Result entries are indices
/// into the page's record list on [`Library::corpus`].
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub results: Vec<usize>,
    pub result_count: usize,
    pub total_count: usize,
    pub mode: SearchMode,
    pub pills: Vec<FilterPill>,
    /// Top topics offered when the result list is empty
    pub suggestions: Vec<PoolEntry>,
    pub cross_corpus_prompt: Option<CrossCorpusPrompt>,
    /// True when the loader reported no data source at all
    pub data_unavailable: bool,
}

/// The search core: frozen corpus plus every derived index
pub struct Library {
    corpus: Corpus,
    config: Config,
    people: PersonIndex,
    topics: TopicCanonicalizer,
    index: SearchIndex,
    data_unavailable: bool,
}

impl Library {
    /// Build every derived index over a loaded corpus
    pub fn build(corpus: Corpus, config: Config) -> Result<Self> {
        let people = PersonIndex::build(&corpus.talks, &corpus.papers);
        let topics = TopicCanonicalizer::new()?;
        let index = SearchIndex::build(&corpus, &people, &topics);
        debug!(
            talks = corpus.talks.len(),
            papers = corpus.papers.len(),
            people = people.all().len(),
            "library built"
        );
        Ok(Self {
            corpus,
            config,
            people,
            topics,
            index,
            data_unavailable: false,
        })
    }

    /// An empty library whose projections report that data never arrived
    pub fn unavailable(config: Config) -> Result<Self> {
        let mut library = Self::build(Corpus::default(), config)?;
        library.data_unavailable = true;
        Ok(library)
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn people(&self) -> &PersonIndex {
        &self.people
    }

    /// Canonical identity for a raw name, if one exists
    pub fn person_for(&self, name: &str) -> Option<&CanonicalPerson> {
        self.people.lookup_by_name(name)
    }

    /// Canonical topic for a raw tag or keyword, for hosts that accept
    /// free-form topic input (flags, URL values). `None` when the value
    /// maps to no known topic.
    pub fn canonical_topic(&self, raw: &str) -> Option<String> {
        let label = self.topics.canonicalize(raw);
        if label.is_empty() {
            None
        } else {
            Some(label)
        }
    }

    /// Key topics for one record, in detection order, capped at the
    /// configured per-record display limit
    pub fn topics_for(&self, page: Page, idx: usize) -> &[String] {
        let all = match page {
            Page::Talks => &self.index.talk_topics[idx],
            Page::Papers => &self.index.paper_topics[idx],
        };
        let limit = self.config.projection.topics_per_record.min(all.len());
        &all[..limit]
    }

    /// Autocomplete pool of canonical topics, count desc
    pub fn topics_pool(&self) -> &[PoolEntry] {
        &self.index.topics_pool
    }

    /// Autocomplete pool of canonical people, record count desc
    pub fn people_pool(&self) -> &[PoolEntry] {
        &self.index.people_pool
    }

    /// Link into the unified work view for a person or topic
    pub fn build_work_url(kind: WorkKind, value: &str, from: Page) -> String {
        let key = match kind {
            WorkKind::Person => "person",
            WorkKind::Topic => "topic",
        };
        let from = match from {
            Page::Talks => "talks",
            Page::Papers => "papers",
        };
        format!("work.html?{}={}&from={}", key, crate::urlstate::encode_component(value), from)
    }

    /// Project one state for one page
    pub fn project(&self, state: &SearchState, page: Page) -> Projection {
        let query = Query::parse(&state.query, &self.config);
        let (ranked, mode) = match page {
            Page::Talks => query::rank_talks(&self.index, &self.corpus, &query, &self.config),
            Page::Papers => query::rank_papers(&self.index, &self.corpus, &query, &self.config),
        };
        let results = match page {
            Page::Talks => facets::filter_talks(&ranked, &self.corpus, &self.index, &self.people, state),
            Page::Papers => facets::filter_papers(&ranked, &self.corpus, &self.index, &self.people, state),
        };

        let total_count = match page {
            Page::Talks => self.corpus.talks.len(),
            Page::Papers => self.corpus.papers.len(),
        };
        let suggestions = if results.is_empty() {
            self.index
                .topics_pool
                .iter()
                .take(self.config.projection.suggestion_limit)
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        let cross_corpus_prompt = if page == Page::Papers {
            self.cross_corpus_prompt(state, &query)
        } else {
            None
        };

        Projection {
            result_count: results.len(),
            results,
            total_count,
            mode,
            pills: self.pills(state, page),
            suggestions,
            cross_corpus_prompt,
            data_unavailable: self.data_unavailable,
        }
    }

    /// One pill per active facet value, each carrying its removal event
    fn pills(&self, state: &SearchState, page: Page) -> Vec<FilterPill> {
        let mut pills = Vec::new();
        if let Some(name) = &state.speaker {
            let label = self
                .person_for(name)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| name.clone());
            pills.push(FilterPill {
                kind: PillKind::Speaker,
                label,
                remove: SearchEvent::ClearSpeaker,
            });
        }
        if page == Page::Talks {
            if let Some(slug) = &state.meeting {
                let label = self
                    .corpus
                    .meetings
                    .iter()
                    .find(|m| &m.slug == slug)
                    .map(|m| m.name.clone())
                    .unwrap_or_else(|| slug.clone());
                pills.push(FilterPill {
                    kind: PillKind::Meeting,
                    label,
                    remove: SearchEvent::ClearMeeting,
                });
            }
            for category in &state.categories {
                pills.push(FilterPill {
                    kind: PillKind::Category,
                    label: category.as_str().to_string(),
                    remove: SearchEvent::ToggleCategory { category: *category },
                });
            }
        }
        for year in &state.years {
            pills.push(FilterPill {
                kind: PillKind::Year,
                label: year.clone(),
                remove: SearchEvent::ToggleYear { year: year.clone() },
            });
        }
        for topic in &state.topics {
            pills.push(FilterPill {
                kind: PillKind::Topic,
                label: topic.clone(),
                remove: SearchEvent::ToggleTopic { topic: topic.clone() },
            });
        }
        if page == Page::Talks {
            if state.has_video {
                pills.push(FilterPill {
                    kind: PillKind::Video,
                    label: "Has video".to_string(),
                    remove: SearchEvent::SetVideoOnly { enabled: false },
                });
            }
            if state.has_slides {
                pills.push(FilterPill {
                    kind: PillKind::Slides,
                    label: "Has slides".to_string(),
                    remove: SearchEvent::SetSlidesOnly { enabled: false },
                });
            }
        }
        pills
    }

    /// Emit the unified-work prompt when exactly one identity dimension is
    /// active: a single person filter, or a single topic filter whose label
    /// the query matches.
    fn cross_corpus_prompt(&self, state: &SearchState, query: &Query) -> Option<CrossCorpusPrompt> {
        let person = state.speaker.as_ref().filter(|_| state.topics.is_empty());
        if let Some(name) = person {
            return Some(CrossCorpusPrompt {
                label: format!("See all work by {}", name),
                url: Self::build_work_url(WorkKind::Person, name, Page::Papers),
            });
        }
        if state.speaker.is_none() && state.topics.len() == 1 {
            let topic = state.topics.iter().next()?;
            let lowered = topic.to_lowercase();
            if query.tokens.iter().any(|t| lowered.contains(t.as_str())) || query.is_empty() {
                return Some(CrossCorpusPrompt {
                    label: format!("See all work on {}", topic),
                    url: Self::build_work_url(WorkKind::Topic, topic, Page::Papers),
                });
            }
        }
        None
    }
}

/// Target kind for the unified work view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkKind {
    Person,
    Topic,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Person, Talk, TalkCategory};

    fn talk(id: &str, title: &str, tags: &[&str], meeting: &str) -> Talk {
        Talk {
            id: id.to_string(),
            title: title.to_string(),
            meeting: meeting.to_string(),
            meeting_name: format!("Meeting {}", meeting),
            year: meeting[..4].to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            speakers: vec![Person {
                name: "Jane Doe".to_string(),
                affiliation: None,
            }],
            category: TalkCategory::TechnicalTalk,
            ..Talk::default()
        }
    }

    fn library() -> Library {
        let corpus = Corpus {
            talks: vec![
                talk("t1", "MLIR Dialect Design", &["MLIR"], "2024-us"),
                talk("t2", "Clang Modules", &["Clang"], "2023-eurollvm"),
            ],
            papers: Vec::new(),
            meetings: Vec::new(),
        };
        Library::build(corpus, Config::default()).unwrap()
    }

    #[test]
    fn browse_projection_counts_everything() {
        let library = library();
        let projection = library.project(&SearchState::default(), Page::Talks);
        assert_eq!(projection.mode, SearchMode::Browse);
        assert_eq!(projection.result_count, 2);
        assert_eq!(projection.total_count, 2);
        assert!(projection.pills.is_empty());
        assert!(projection.suggestions.is_empty());
    }

    #[test]
    fn empty_results_carry_topic_suggestions() {
        let library = library();
        let mut state = SearchState::default();
        state.query = "zzzzzzzz".to_string();
        let projection = library.project(&state, Page::Talks);
        assert_eq!(projection.result_count, 0);
        assert!(!projection.suggestions.is_empty());
    }

    #[test]
    fn pills_carry_their_removal_event() {
        let library = library();
        let mut state = SearchState::default();
        state.years.insert("2024".to_string());
        state.has_video = true;

        let projection = library.project(&state, Page::Talks);
        assert_eq!(projection.pills.len(), 2);
        let year_pill = &projection.pills[0];
        assert_eq!(year_pill.kind, PillKind::Year);

        // Applying the removal event restores the prior result set
        let without = state.apply(year_pill.remove.clone(), library.corpus());
        let mut expected = state.clone();
        expected.years.clear();
        assert_eq!(
            library.project(&without, Page::Talks).results,
            library.project(&expected, Page::Talks).results
        );
    }

    #[test]
    fn unavailable_library_projects_empty() {
        let library = Library::unavailable(Config::default()).unwrap();
        let projection = library.project(&SearchState::default(), Page::Talks);
        assert!(projection.data_unavailable);
        assert_eq!(projection.result_count, 0);
    }

    #[test]
    fn raw_tags_resolve_to_canonical_topics() {
        let library = library();
        assert_eq!(library.canonical_topic("mlir").as_deref(), Some("MLIR"));
        // Canonical labels map to themselves
        assert_eq!(library.canonical_topic("MLIR").as_deref(), Some("MLIR"));
        assert!(library.canonical_topic("definitely not a topic").is_none());
    }

    #[test]
    fn single_person_filter_prompts_unified_work() {
        let library = library();
        let mut state = SearchState::default();
        state.speaker = Some("Jane Doe".to_string());
        let projection = library.project(&state, Page::Papers);
        let prompt = projection.cross_corpus_prompt.expect("prompt");
        assert!(prompt.url.contains("person=Jane%20Doe"));
    }
}
