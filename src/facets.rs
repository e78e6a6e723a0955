//! # Facet Engine Module
//!
//! ## Purpose
//! Applies facet filters to a query-ranked index list. Every facet is an
//! independent predicate and facets compose by intersection, so filter order
//! never changes the result. Also owns the paper sort modes and the
//! meeting/year dependency rule.
//!
//! ## Input/Output Specification
//! - **Input**: Ranked record indices, corpus, index, person index, active state
//! - **Output**: Filtered (and for papers, possibly re-sorted) indices
//! - **Guarantee**: Removing one facet value restores the set that would have
//!   existed without it, all other state held constant
//!
//! ## Key Features
//! - Person facet resolves through canonical identities, not raw strings
//! - Topic facet tests the canonical topic list, not raw tags
//! - Year filter evicts a meeting filter it would contradict

use crate::index::SearchIndex;
use crate::people::PersonIndex;
use crate::state::SearchState;
use crate::Corpus;
use serde::{Deserialize, Serialize};

/// Paper list ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Preserve the query-ranked order
    #[default]
    Relevance,
    /// Year desc, citations desc, title asc
    Year,
    /// Citations desc, year desc, title asc
    Citations,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Relevance => "relevance",
            SortMode::Year => "year",
            SortMode::Citations => "citations",
        }
    }

    /// Forgiving parse; anything unrecognized falls back to relevance
    pub fn parse(raw: &str) -> Self {
        match raw {
            "year" => SortMode::Year,
            "citations" => SortMode::Citations,
            _ => SortMode::Relevance,
        }
    }
}

/// Keep the talk indices matching every active facet
pub fn filter_talks(
    ranked: &[usize],
    corpus: &Corpus,
    index: &SearchIndex,
    people: &PersonIndex,
    state: &SearchState,
) -> Vec<usize> {
    ranked
        .iter()
        .copied()
        .filter(|&i| {
            let talk = &corpus.talks[i];
            if let Some(slug) = &state.meeting {
                if &talk.meeting != slug {
                    return false;
                }
            }
            if let Some(name) = &state.speaker {
                if !talk.speakers.iter().any(|p| people.same_person(&p.name, name)) {
                    return false;
                }
            }
            if !state.categories.is_empty() && !state.categories.contains(&talk.category) {
                return false;
            }
            if !state.years.is_empty() && !state.years.contains(&talk.year) {
                return false;
            }
            if !state.topics.is_empty()
                && !index.talk_topics[i].iter().any(|t| state.topics.contains(t))
            {
                return false;
            }
            if state.has_video && talk.video_url.is_empty() {
                return false;
            }
            if state.has_slides && talk.slides_url.is_empty() {
                return false;
            }
            true
        })
        .collect()
}

/// Keep the paper indices matching every active facet, then apply the sort mode
pub fn filter_papers(
    ranked: &[usize],
    corpus: &Corpus,
    index: &SearchIndex,
    people: &PersonIndex,
    state: &SearchState,
) -> Vec<usize> {
    let mut kept: Vec<usize> = ranked
        .iter()
        .copied()
        .filter(|&i| {
            let paper = &corpus.papers[i];
            if let Some(name) = &state.speaker {
                if !paper.authors.iter().any(|p| people.same_person(&p.name, name)) {
                    return false;
                }
            }
            if !state.years.is_empty() && !state.years.contains(&paper.year) {
                return false;
            }
            if !state.topics.is_empty()
                && !index.paper_topics[i].iter().any(|t| state.topics.contains(t))
            {
                return false;
            }
            true
        })
        .collect();

    match state.sort {
        // Relevance keeps the query order; with no query tokens the ranked
        // list already carries the browse tie-break chain.
        SortMode::Relevance => {}
        SortMode::Year => kept.sort_by(|&a, &b| {
            let pa = &corpus.papers[a];
            let pb = &corpus.papers[b];
            pb.year
                .cmp(&pa.year)
                .then_with(|| pb.citation_count.cmp(&pa.citation_count))
                .then_with(|| pa.title.cmp(&pb.title))
                .then_with(|| pa.id.cmp(&pb.id))
        }),
        SortMode::Citations => kept.sort_by(|&a, &b| {
            let pa = &corpus.papers[a];
            let pb = &corpus.papers[b];
            pb.citation_count
                .cmp(&pa.citation_count)
                .then_with(|| pb.year.cmp(&pa.year))
                .then_with(|| pa.title.cmp(&pb.title))
                .then_with(|| pa.id.cmp(&pb.id))
        }),
    }
    kept
}

/// Meeting/year dependency rule: a year set that excludes the selected
/// meeting's year evicts the meeting filter rather than silently keeping an
/// inconsistent pair. Returns true when the meeting filter was dropped.
pub fn reconcile_meeting_with_years(state: &mut SearchState, corpus: &Corpus) -> bool {
    let Some(slug) = &state.meeting else {
        return false;
    };
    if state.years.is_empty() {
        return false;
    }
    let meeting_year = corpus
        .meetings
        .iter()
        .find(|m| &m.slug == slug)
        .map(|m| m.year.clone())
        .unwrap_or_else(|| crate::normalize::derive_slug_year(slug));
    if state.years.contains(&meeting_year) {
        return false;
    }
    tracing::debug!(meeting = %slug, year = %meeting_year, "year filter excludes selected meeting; dropping it");
    state.meeting = None;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Meeting, Paper, PaperType};

    fn paper(id: &str, title: &str, year: &str, citations: u32) -> Paper {
        Paper {
            id: id.to_string(),
            title: title.to_string(),
            year: year.to_string(),
            citation_count: citations,
            paper_type: PaperType::ResearchPaper,
            ..Paper::default()
        }
    }

    fn corpus() -> Corpus {
        Corpus {
            talks: Vec::new(),
            papers: vec![paper("p1", "Alpha", "2020", 10), paper("p2", "Beta", "2021", 5)],
            meetings: vec![Meeting {
                slug: "2024-eurollvm".to_string(),
                name: "EuroLLVM 2024".to_string(),
                year: "2024".to_string(),
                location: String::new(),
                date: String::new(),
                cancelled: false,
            }],
        }
    }

    #[test]
    fn sort_modes_order_papers() {
        let corpus = corpus();
        let people = PersonIndex::build(&corpus.talks, &corpus.papers);
        let topics = crate::topics::TopicCanonicalizer::new().unwrap();
        let index = SearchIndex::build(&corpus, &people, &topics);

        let ranked = vec![0usize, 1];
        let mut state = SearchState::default();

        state.sort = SortMode::Citations;
        let out = filter_papers(&ranked, &corpus, &index, &people, &state);
        assert_eq!(out, vec![0, 1]);

        state.sort = SortMode::Year;
        let out = filter_papers(&ranked, &corpus, &index, &people, &state);
        assert_eq!(out, vec![1, 0]);
    }

    #[test]
    fn year_filter_evicts_inconsistent_meeting() {
        let corpus = corpus();
        let mut state = SearchState {
            meeting: Some("2024-eurollvm".to_string()),
            ..SearchState::default()
        };
        state.years.insert("2023".to_string());

        assert!(reconcile_meeting_with_years(&mut state, &corpus));
        assert!(state.meeting.is_none());
    }

    #[test]
    fn consistent_year_keeps_meeting() {
        let corpus = corpus();
        let mut state = SearchState {
            meeting: Some("2024-eurollvm".to_string()),
            ..SearchState::default()
        };
        state.years.insert("2024".to_string());

        assert!(!reconcile_meeting_with_years(&mut state, &corpus));
        assert_eq!(state.meeting.as_deref(), Some("2024-eurollvm"));
    }

    #[test]
    fn sort_mode_parse_is_forgiving() {
        assert_eq!(SortMode::parse("year"), SortMode::Year);
        assert_eq!(SortMode::parse("bogus"), SortMode::Relevance);
        assert_eq!(SortMode::parse(""), SortMode::Relevance);
    }
}
