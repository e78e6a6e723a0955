//! # Search Index Module
//!
//! ## Purpose
//! Precomputes, once per corpus load, everything the query engine scans per
//! keystroke: lowered field strings for substring scoring, deduplicated token
//! bags for fuzzy scoring, and the autocomplete pools for topics and people.
//!
//! ## Input/Output Specification
//! - **Input**: Normalized corpus, person index, topic canonicalizer
//! - **Output**: Immutable per-record documents and suggestion pools
//! - **Performance**: Built in parallel; queried with a full linear scan

use crate::people::PersonIndex;
use crate::topics::TopicCanonicalizer;
use crate::Corpus;
use rayon::prelude::*;
use serde::Serialize;

/// Deduplicated lowered word chunks per field, used only by the fuzzy stage
#[derive(Debug, Clone, Default)]
pub struct TokenBags {
    pub title: Vec<String>,
    pub people: Vec<String>,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub publication: Vec<String>,
    pub venue: Vec<String>,
}

/// Precomputed lowered fields for one talk
#[derive(Debug, Clone)]
pub struct TalkDoc {
    pub title: String,
    pub speakers: String,
    pub abstract_text: String,
    pub tags: String,
    pub meeting: String,
    pub category: String,
    pub year: String,
    pub bags: TokenBags,
}

/// Precomputed lowered fields for one paper
#[derive(Debug, Clone)]
pub struct PaperDoc {
    pub title: String,
    pub authors: String,
    pub abstract_text: String,
    pub tags: String,
    pub keywords: String,
    pub publication: String,
    pub venue: String,
    pub paper_type: String,
    pub year: String,
    pub bags: TokenBags,
}

/// One autocomplete pool entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolEntry {
    pub label: String,
    pub count: usize,
}

/// The frozen search index
pub struct SearchIndex {
    pub talk_docs: Vec<TalkDoc>,
    pub paper_docs: Vec<PaperDoc>,
    /// Canonical topics per talk, in detection order
    pub talk_topics: Vec<Vec<String>>,
    /// Canonical topics per paper, in detection order
    pub paper_topics: Vec<Vec<String>>,
    /// Canonical topics across both corpora, count desc then label asc
    pub topics_pool: Vec<PoolEntry>,
    /// Canonical identities, distinct-record count desc then label asc
    pub people_pool: Vec<PoolEntry>,
}

impl SearchIndex {
    /// Precompute documents, topic lists, and autocomplete pools
    pub fn build(corpus: &Corpus, people: &PersonIndex, topics: &TopicCanonicalizer) -> Self {
        let talk_docs: Vec<TalkDoc> = corpus
            .talks
            .par_iter()
            .map(|talk| {
                let speakers = talk
                    .speakers
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let tags = talk.tags.join(" ");
                let meeting = format!("{} {}", talk.meeting, talk.meeting_name);
                TalkDoc {
                    bags: TokenBags {
                        title: token_bag(&talk.title),
                        people: token_bag(&speakers),
                        tags: token_bag(&tags),
                        keywords: Vec::new(),
                        publication: Vec::new(),
                        venue: token_bag(&meeting),
                    },
                    title: talk.title.to_lowercase(),
                    speakers: speakers.to_lowercase(),
                    abstract_text: talk.abstract_text.to_lowercase(),
                    tags: tags.to_lowercase(),
                    meeting: meeting.to_lowercase(),
                    category: talk.category.as_str().to_string(),
                    year: talk.year.clone(),
                }
            })
            .collect();

        let paper_docs: Vec<PaperDoc> = corpus
            .papers
            .par_iter()
            .map(|paper| {
                let authors = paper
                    .authors
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let tags = paper.tags.join(" ");
                let keywords = paper.keywords.join(" ");
                PaperDoc {
                    bags: TokenBags {
                        title: token_bag(&paper.title),
                        people: token_bag(&authors),
                        tags: token_bag(&tags),
                        keywords: token_bag(&keywords),
                        publication: token_bag(&paper.publication),
                        venue: token_bag(&paper.venue),
                    },
                    title: paper.title.to_lowercase(),
                    authors: authors.to_lowercase(),
                    abstract_text: paper.abstract_text.to_lowercase(),
                    tags: tags.to_lowercase(),
                    keywords: keywords.to_lowercase(),
                    publication: paper.publication.to_lowercase(),
                    venue: paper.venue.to_lowercase(),
                    paper_type: paper.paper_type.as_str().to_string(),
                    year: paper.year.clone(),
                }
            })
            .collect();

        let talk_topics: Vec<Vec<String>> = corpus
            .talks
            .iter()
            .map(|talk| topics.topics_for_talk(talk, usize::MAX))
            .collect();
        let paper_topics: Vec<Vec<String>> = corpus
            .papers
            .iter()
            .map(|paper| topics.topics_for_paper(paper, usize::MAX))
            .collect();

        let topics_pool = build_topics_pool(&talk_topics, &paper_topics);
        let people_pool = build_people_pool(people);

        tracing::debug!(
            talks = talk_docs.len(),
            papers = paper_docs.len(),
            topics = topics_pool.len(),
            people = people_pool.len(),
            "search index built"
        );

        Self {
            talk_docs,
            paper_docs,
            talk_topics,
            paper_topics,
            topics_pool,
            people_pool,
        }
    }
}

/// Lowered alphanumeric chunks of length >= 2, deduplicated, order preserved.
/// The splitter treats `+`, `#`, and `.` as word characters so language names
/// like `c++` and versioned tokens survive intact.
pub fn token_bag(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in text.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_ascii_alphanumeric() || c == '+' || c == '#' || c == '.' {
            current.push(c);
        } else if !current.is_empty() {
            if current.chars().count() >= 2 && !out.contains(&current) {
                out.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.chars().count() >= 2 && !out.contains(&current) {
        out.push(current);
    }
    out
}

fn build_topics_pool(talk_topics: &[Vec<String>], paper_topics: &[Vec<String>]) -> Vec<PoolEntry> {
    let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for topics in talk_topics.iter().chain(paper_topics) {
        for topic in topics {
            *counts.entry(topic.as_str()).or_default() += 1;
        }
    }
    let mut pool: Vec<PoolEntry> = counts
        .into_iter()
        .map(|(label, count)| PoolEntry {
            label: label.to_string(),
            count,
        })
        .collect();
    pool.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    pool
}

fn build_people_pool(people: &PersonIndex) -> Vec<PoolEntry> {
    let mut pool: Vec<PoolEntry> = people
        .all()
        .iter()
        .map(|person| PoolEntry {
            label: person.name.clone(),
            count: person.record_count,
        })
        .collect();
    pool.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_bag_splits_and_dedupes() {
        assert_eq!(
            token_bag("MLIR: A Compiler Infrastructure, for MLIR"),
            vec!["mlir", "compiler", "infrastructure", "for"]
        );
        // Single characters are dropped, c++ survives
        assert_eq!(token_bag("a C++ W"), vec!["c++"]);
    }

    #[test]
    fn token_bag_keeps_versioned_tokens() {
        assert_eq!(token_bag("llvm 17.0.1 risc-v"), vec!["llvm", "17.0.1", "risc"]);
    }
}
