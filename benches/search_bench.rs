//! Benchmarks for corpus-scale query latency. The corpus size mirrors the
//! production catalog (a few thousand records per stream).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use library_hub_search::config::Config;
use library_hub_search::projection::Library;
use library_hub_search::state::{Page, SearchState};
use library_hub_search::{Corpus, Paper, PaperType, Person, Talk, TalkCategory};

const TOPICS: [&str; 8] = [
    "MLIR",
    "Clang",
    "LLVM IR",
    "Vectorization",
    "Register Allocation",
    "GPU",
    "Sanitizers",
    "LTO",
];

fn synthetic_corpus(talks: usize, papers: usize) -> Corpus {
    let talk_records = (0..talks)
        .map(|i| {
            let topic = TOPICS[i % TOPICS.len()];
            Talk {
                id: format!("t{}", i),
                title: format!("{} Deep Dive {}", topic, i),
                abstract_text: format!("A talk about {} internals and tradeoffs.", topic),
                tags: vec![topic.to_string()],
                meeting: format!("{}-us", 2010 + (i % 15)),
                meeting_name: format!("LLVM Developers' Meeting {}", 2010 + (i % 15)),
                year: (2010 + (i % 15)).to_string(),
                speakers: vec![Person {
                    name: format!("Speaker {}", i % 400),
                    affiliation: Some(format!("Org {}", i % 40)),
                }],
                category: TalkCategory::TechnicalTalk,
                ..Talk::default()
            }
        })
        .collect();
    let paper_records = (0..papers)
        .map(|i| {
            let topic = TOPICS[(i + 3) % TOPICS.len()];
            Paper {
                id: format!("p{}", i),
                title: format!("{} at Scale {}", topic, i),
                abstract_text: format!("We evaluate {} across large codebases.", topic),
                year: (2005 + (i % 20)).to_string(),
                citation_count: (i % 50) as u32,
                paper_type: PaperType::ResearchPaper,
                authors: vec![Person {
                    name: format!("Author {}", i % 400),
                    affiliation: Some(format!("Org {}", i % 40)),
                }],
                tags: vec![topic.to_string()],
                keywords: vec![format!("{} compiler", topic.to_lowercase())],
                ..Paper::default()
            }
        })
        .collect();
    Corpus {
        talks: talk_records,
        papers: paper_records,
        meetings: Vec::new(),
    }
}

fn bench_search(c: &mut Criterion) {
    let corpus = synthetic_corpus(3000, 3000);
    let library = Library::build(corpus, Config::default()).unwrap();

    let mut exact = SearchState::default();
    exact.query = "mlir".to_string();
    let mut fuzzy = SearchState::default();
    fuzzy.query = "mliir".to_string();
    let browse = SearchState::default();

    c.bench_function("project_browse_talks", |b| {
        b.iter(|| black_box(library.project(black_box(&browse), Page::Talks)))
    });
    c.bench_function("project_exact_talks", |b| {
        b.iter(|| black_box(library.project(black_box(&exact), Page::Talks)))
    });
    c.bench_function("project_fuzzy_talks", |b| {
        b.iter(|| black_box(library.project(black_box(&fuzzy), Page::Talks)))
    });
    c.bench_function("project_exact_papers", |b| {
        b.iter(|| black_box(library.project(black_box(&exact), Page::Papers)))
    });
}

fn bench_build(c: &mut Criterion) {
    let corpus = synthetic_corpus(3000, 3000);
    c.bench_function("library_build", |b| {
        b.iter(|| black_box(Library::build(black_box(corpus.clone()), Config::default()).unwrap()))
    });
}

criterion_group!(benches, bench_search, bench_build);
criterion_main!(benches);
