//! # Search State Module
//!
//! ## Purpose
//! Immutable search state plus the pure reducer that advances it. The host
//! binds its input events to [`SearchEvent`] values and re-projects after
//! every transition; nothing in here performs IO or owns timers.
//!
//! ## Input/Output Specification
//! - **Input**: A state value and one event
//! - **Output**: The successor state, with facet dependencies reconciled
//! - **Guarantee**: `apply` is a pure function of `(state, event, corpus)`
//!
//! ## Key Features
//! - Ordered sets for deterministic facet iteration
//! - Year toggles evict an inconsistent meeting filter in the same transition
//! - Session snapshot type for back-navigation restoration

use crate::facets::{self, SortMode};
use crate::{Corpus, TalkCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Storage key the host uses for back-navigation snapshots
pub const SNAPSHOT_KEY: &str = "llvm-hub-search-state";

/// Which record list a projection is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Talks,
    Papers,
}

/// The complete search state for one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    /// Raw query text as typed
    pub query: String,
    /// Selected canonical person name, if any
    pub speaker: Option<String>,
    /// Selected meeting slug, if any (talks page)
    pub meeting: Option<String>,
    /// Selected talk categories
    pub categories: BTreeSet<TalkCategory>,
    /// Selected years
    pub years: BTreeSet<String>,
    /// Selected canonical topics
    pub topics: BTreeSet<String>,
    /// Keep only talks with a recording
    pub has_video: bool,
    /// Keep only talks with slides
    pub has_slides: bool,
    /// Paper list ordering
    pub sort: SortMode,
}

/// One state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SearchEvent {
    SetQuery { query: String },
    ClearQuery,
    SetSpeaker { name: String },
    ClearSpeaker,
    SetMeeting { slug: String },
    ClearMeeting,
    ToggleCategory { category: TalkCategory },
    ToggleYear { year: String },
    ToggleTopic { topic: String },
    SetVideoOnly { enabled: bool },
    SetSlidesOnly { enabled: bool },
    SetSort { sort: SortMode },
    ClearAll,
}

impl SearchState {
    /// Advance the state by one event. Year transitions run the meeting
    /// dependency rule so an excluded meeting filter never survives.
    pub fn apply(&self, event: SearchEvent, corpus: &Corpus) -> SearchState {
        let mut next = self.clone();
        match event {
            SearchEvent::SetQuery { query } => next.query = query,
            SearchEvent::ClearQuery => next.query.clear(),
            SearchEvent::SetSpeaker { name } => next.speaker = Some(name),
            SearchEvent::ClearSpeaker => next.speaker = None,
            SearchEvent::SetMeeting { slug } => next.meeting = Some(slug),
            SearchEvent::ClearMeeting => next.meeting = None,
            SearchEvent::ToggleCategory { category } => {
                if !next.categories.remove(&category) {
                    next.categories.insert(category);
                }
            }
            SearchEvent::ToggleYear { year } => {
                if !next.years.remove(&year) {
                    next.years.insert(year);
                }
                facets::reconcile_meeting_with_years(&mut next, corpus);
            }
            SearchEvent::ToggleTopic { topic } => {
                if !next.topics.remove(&topic) {
                    next.topics.insert(topic);
                }
            }
            SearchEvent::SetVideoOnly { enabled } => next.has_video = enabled,
            SearchEvent::SetSlidesOnly { enabled } => next.has_slides = enabled,
            SearchEvent::SetSort { sort } => next.sort = sort,
            SearchEvent::ClearAll => next = SearchState::default(),
        }
        next
    }

    /// True when no query text or facet is active
    pub fn is_default(&self) -> bool {
        *self == SearchState::default()
    }
}

/// Serializable snapshot the host persists for back-navigation, keyed by
/// [`SNAPSHOT_KEY`] in session storage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub query: String,
    pub speaker: Option<String>,
    pub categories: BTreeSet<TalkCategory>,
    pub years: BTreeSet<String>,
    pub has_video: bool,
    pub has_slides: bool,
    pub scroll_y: f64,
}

impl SessionSnapshot {
    /// Capture the restorable parts of a state plus the host's scroll offset
    pub fn capture(state: &SearchState, scroll_y: f64) -> Self {
        Self {
            query: state.query.clone(),
            speaker: state.speaker.clone(),
            categories: state.categories.clone(),
            years: state.years.clone(),
            has_video: state.has_video,
            has_slides: state.has_slides,
            scroll_y,
        }
    }

    /// Rebuild a state from a snapshot; facets the snapshot does not carry
    /// come back at their defaults
    pub fn restore(&self) -> SearchState {
        SearchState {
            query: self.query.clone(),
            speaker: self.speaker.clone(),
            categories: self.categories.clone(),
            years: self.years.clone(),
            has_video: self.has_video,
            has_slides: self.has_slides,
            ..SearchState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Corpus {
        Corpus {
            talks: Vec::new(),
            papers: Vec::new(),
            meetings: vec![crate::Meeting {
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
    fn toggle_events_are_involutions() {
        let corpus = corpus();
        let start = SearchState::default();
        let on = start.apply(
            SearchEvent::ToggleTopic {
                topic: "MLIR".to_string(),
            },
            &corpus,
        );
        assert!(on.topics.contains("MLIR"));
        let off = on.apply(
            SearchEvent::ToggleTopic {
                topic: "MLIR".to_string(),
            },
            &corpus,
        );
        assert_eq!(off, start);
    }

    #[test]
    fn year_toggle_runs_meeting_reconciliation() {
        let corpus = corpus();
        let state = SearchState::default().apply(
            SearchEvent::SetMeeting {
                slug: "2024-eurollvm".to_string(),
            },
            &corpus,
        );
        let state = state.apply(
            SearchEvent::ToggleYear {
                year: "2023".to_string(),
            },
            &corpus,
        );
        assert!(state.meeting.is_none());
        assert!(state.years.contains("2023"));
    }

    #[test]
    fn clear_all_resets_to_default() {
        let corpus = corpus();
        let mut state = SearchState::default();
        state.query = "mlir".to_string();
        state.has_video = true;
        let cleared = state.apply(SearchEvent::ClearAll, &corpus);
        assert!(cleared.is_default());
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut state = SearchState::default();
        state.query = "vectorization".to_string();
        state.speaker = Some("Jane Doe".to_string());
        state.years.insert("2023".to_string());

        let snapshot = SessionSnapshot::capture(&state, 420.5);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.restore().query, "vectorization");
        assert_eq!(back.scroll_y, 420.5);
    }
}
