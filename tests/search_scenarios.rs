//! End-to-end scenarios over a small handmade corpus: query modes, facet
//! composition, person merging, sort modes, and URL round-trips.

use library_hub_search::config::Config;
use library_hub_search::facets::SortMode;
use library_hub_search::projection::Library;
use library_hub_search::state::{Page, SearchEvent, SearchState};
use library_hub_search::{
    urlstate, Corpus, Meeting, Paper, PaperType, Person, SearchMode, Talk, TalkCategory,
};

fn talk(id: &str, title: &str, tags: &[&str], meeting: &str, speaker: &str) -> Talk {
    Talk {
        id: id.to_string(),
        title: title.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        meeting: meeting.to_string(),
        meeting_name: format!("LLVM Developers' Meeting {}", &meeting[..4]),
        year: meeting[..4].to_string(),
        speakers: vec![Person {
            name: speaker.to_string(),
            affiliation: Some("ACME".to_string()),
        }],
        category: TalkCategory::TechnicalTalk,
        video_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
        ..Talk::default()
    }
}

fn paper(id: &str, title: &str, year: &str, citations: u32, author: &str) -> Paper {
    Paper {
        id: id.to_string(),
        title: title.to_string(),
        year: year.to_string(),
        citation_count: citations,
        paper_type: PaperType::ResearchPaper,
        authors: vec![Person {
            name: author.to_string(),
            affiliation: Some("ACME".to_string()),
        }],
        ..Paper::default()
    }
}

fn small_library() -> Library {
    let corpus = Corpus {
        talks: vec![
            talk("t1", "MLIR Dialect Design", &["MLIR"], "2024-us", "Jane Q. Doe"),
            talk("t2", "Clang Modules", &["Clang"], "2023-eurollvm", "Rami Haddad"),
        ],
        papers: vec![
            paper("p1", "Polyhedral Scheduling", "2020", 10, "Jane Doe"),
            paper("p2", "Hello Vectorizer", "2021", 5, "Rami Haddad"),
        ],
        meetings: vec![Meeting {
            slug: "2024-us".to_string(),
            name: "LLVM Developers' Meeting 2024".to_string(),
            year: "2024".to_string(),
            location: "Santa Clara".to_string(),
            date: "October 22-23, 2024".to_string(),
            cancelled: false,
        }],
    };
    Library::build(corpus, Config::default()).unwrap()
}

#[test]
fn s1_exact_query_matches_title_and_tags() {
    let library = small_library();
    let mut state = SearchState::default();
    state.query = "mlir".to_string();

    let projection = library.project(&state, Page::Talks);
    assert_eq!(projection.mode, SearchMode::Exact);
    assert_eq!(projection.results.len(), 1);
    assert_eq!(library.corpus().talks[projection.results[0]].id, "t1");
}

#[test]
fn s2_typo_falls_back_to_fuzzy() {
    let library = small_library();
    let mut state = SearchState::default();
    state.query = "mliir".to_string();

    let projection = library.project(&state, Page::Talks);
    assert_eq!(projection.mode, SearchMode::Fuzzy);
    assert_eq!(projection.results.len(), 1);
    assert_eq!(library.corpus().talks[projection.results[0]].id, "t1");
}

#[test]
fn s3_and_semantics_exclude_partial_matches() {
    let library = small_library();
    let mut state = SearchState::default();
    state.query = "mlir clang".to_string();

    let projection = library.project(&state, Page::Talks);
    assert!(projection.results.is_empty());
}

#[test]
fn s4_person_merges_across_corpora() {
    let library = small_library();
    let person = library.person_for("Jane Doe").expect("canonical identity");
    assert_eq!(person.total_count(), 2);
    assert_eq!(person.talk_filter_name, "Jane Q. Doe");
    assert_eq!(person.paper_filter_name, "Jane Doe");

    // The speaker facet follows the identity, not the exact spelling
    let mut state = SearchState::default();
    state.speaker = Some("Jane Doe".to_string());
    let talks = library.project(&state, Page::Talks);
    assert_eq!(talks.results.len(), 1);
    let papers = library.project(&state, Page::Papers);
    assert_eq!(papers.results.len(), 1);
}

#[test]
fn s5_paper_sort_modes() {
    let library = small_library();
    let mut state = SearchState::default();

    state.sort = SortMode::Citations;
    let projection = library.project(&state, Page::Papers);
    let ids: Vec<&str> = projection
        .results
        .iter()
        .map(|&i| library.corpus().papers[i].id.as_str())
        .collect();
    assert_eq!(ids, vec!["p1", "p2"]);

    state.sort = SortMode::Year;
    let projection = library.project(&state, Page::Papers);
    let ids: Vec<&str> = projection
        .results
        .iter()
        .map(|&i| library.corpus().papers[i].id.as_str())
        .collect();
    assert_eq!(ids, vec!["p2", "p1"]);

    state.sort = SortMode::Relevance;
    state.query = "hello".to_string();
    let projection = library.project(&state, Page::Papers);
    let ids: Vec<&str> = projection
        .results
        .iter()
        .map(|&i| library.corpus().papers[i].id.as_str())
        .collect();
    assert_eq!(ids, vec!["p2"]);
}

#[test]
fn s6_year_filter_evicts_inconsistent_meeting() {
    let library = small_library();
    let state = SearchState::default().apply(
        SearchEvent::SetMeeting {
            slug: "2024-us".to_string(),
        },
        library.corpus(),
    );
    let state = state.apply(
        SearchEvent::ToggleYear {
            year: "2023".to_string(),
        },
        library.corpus(),
    );
    assert!(state.meeting.is_none());

    let projection = library.project(&state, Page::Talks);
    for &idx in &projection.results {
        assert_eq!(library.corpus().talks[idx].year, "2023");
    }
}

#[test]
fn s7_empty_corpus_reports_exact_mode_for_real_tokens() {
    let library = Library::build(Corpus::default(), Config::default()).unwrap();
    let mut state = SearchState::default();
    state.query = "llvm".to_string();

    let projection = library.project(&state, Page::Talks);
    assert!(projection.results.is_empty());
    assert_eq!(projection.mode, SearchMode::Exact);

    // With no usable tokens the projection stays in browse mode
    state.query = "a".to_string();
    let projection = library.project(&state, Page::Talks);
    assert_eq!(projection.mode, SearchMode::Browse);
}

#[test]
fn rankings_are_deterministic() {
    let library = small_library();
    let mut state = SearchState::default();
    state.query = "llvm".to_string();

    let first = library.project(&state, Page::Talks).results;
    for _ in 0..5 {
        assert_eq!(library.project(&state, Page::Talks).results, first);
    }
}

#[test]
fn facet_removal_restores_prior_results() {
    let library = small_library();
    let mut base = SearchState::default();
    base.query = "llvm".to_string();
    let baseline = library.project(&base, Page::Talks).results;

    let with_year = base.apply(
        SearchEvent::ToggleYear {
            year: "2024".to_string(),
        },
        library.corpus(),
    );
    let without = with_year.apply(
        SearchEvent::ToggleYear {
            year: "2024".to_string(),
        },
        library.corpus(),
    );
    assert_eq!(library.project(&without, Page::Talks).results, baseline);
}

#[test]
fn url_round_trip_for_reachable_states() {
    let library = small_library();
    let mut state = SearchState::default();
    state.query = "vector codegen".to_string();
    state.speaker = Some("Jane Doe".to_string());
    state = state.apply(
        SearchEvent::ToggleYear {
            year: "2021".to_string(),
        },
        library.corpus(),
    );
    state.sort = SortMode::Year;

    let encoded = urlstate::encode(&state, Page::Papers);
    assert_eq!(urlstate::decode(&encoded, Page::Papers, library.corpus()), state);
}

#[test]
fn projection_serializes_for_json_hosts() -> anyhow::Result<()> {
    let library = small_library();
    let mut state = SearchState::default();
    state.query = "mlir".to_string();

    let projection = library.project(&state, Page::Talks);
    let json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&projection)?)?;
    assert_eq!(json["mode"], "exact");
    assert_eq!(json["result_count"], projection.result_count);
    Ok(())
}

#[test]
fn empty_results_suggest_topics() {
    let library = small_library();
    let mut state = SearchState::default();
    state.query = "qqqqqqqq".to_string();
    let projection = library.project(&state, Page::Talks);
    assert!(projection.results.is_empty());
    assert!(!projection.suggestions.is_empty());
    assert!(projection
        .suggestions
        .iter()
        .any(|s| s.label == "MLIR" || s.label == "Clang"));
}
