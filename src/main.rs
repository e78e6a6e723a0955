//! # Library Search Main Driver
//!
//! ## Purpose
//! Command-line host for the search core. Loads the corpus from a data
//! directory, builds every derived index, runs one query with the requested
//! facets, and prints the projection. The same core drives interactive hosts;
//! this binary exists for inspection and scripting.
//!
//! ## Input/Output Specification
//! - **Input**: Data directory, optional config file, query and facet flags
//! - **Output**: Ranked results on stdout, human-readable or JSON
//! - **Exit**: Non-zero on load or configuration failure
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Load and normalize the corpus (falling back to an empty library when
//!    no data source exists)
//! 4. Build the search state from flags and project it
//! 5. Print the projection

use anyhow::Context;
use clap::{Arg, Command};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use library_hub_search::config::Config;
use library_hub_search::errors::{Result, SearchError};
use library_hub_search::facets::SortMode;
use library_hub_search::loader::{load_corpus, FileSource};
use library_hub_search::projection::Library;
use library_hub_search::state::{Page, SearchState};
use library_hub_search::TalkCategory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("library-search")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Search and facet the community library of talks and papers")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("data")
                .short('d')
                .long("data")
                .value_name("DIR")
                .help("Data directory with events.json and papers/")
                .default_value("data"),
        )
        .arg(
            Arg::new("page")
                .long("page")
                .value_name("PAGE")
                .help("Record list to search: talks or papers")
                .default_value("talks"),
        )
        .arg(
            Arg::new("query")
                .short('q')
                .long("query")
                .value_name("TEXT")
                .help("Query text")
                .default_value(""),
        )
        .arg(
            Arg::new("speaker")
                .long("speaker")
                .value_name("NAME")
                .help("Filter by speaker or author name"),
        )
        .arg(
            Arg::new("meeting")
                .long("meeting")
                .value_name("SLUG")
                .help("Filter talks by meeting slug"),
        )
        .arg(
            Arg::new("category")
                .long("category")
                .value_name("SLUG")
                .help("Filter talks by category (repeatable)")
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("year")
                .long("year")
                .value_name("YYYY")
                .help("Filter by year (repeatable)")
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("topic")
                .long("topic")
                .value_name("TOPIC")
                .help("Filter by canonical topic (repeatable)")
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("video")
                .long("video")
                .help("Keep only talks with a recording")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("slides")
                .long("slides")
                .help("Keep only talks with slides")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("sort")
                .long("sort")
                .value_name("MODE")
                .help("Paper ordering: relevance, year, or citations")
                .default_value("relevance"),
        )
        .arg(
            Arg::new("limit")
                .short('n')
                .long("limit")
                .value_name("N")
                .help("Print at most N results")
                .value_parser(clap::value_parser!(usize))
                .default_value("20"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Emit the projection as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => {
            Config::from_file(path).with_context(|| format!("loading configuration from {}", path))?
        }
        None => Config::load()?,
    };
    init_logging(&config)?;

    let page = match matches.get_one::<String>("page").map(String::as_str) {
        Some("papers") => Page::Papers,
        Some("talks") | None => Page::Talks,
        Some(other) => anyhow::bail!("Unknown page '{}': expected talks or papers", other),
    };

    let data_dir = matches.get_one::<String>("data").map(String::as_str).unwrap_or("data");
    let library = match load_corpus(&FileSource::new(data_dir)).await {
        Ok(corpus) => Library::build(corpus, config)?,
        Err(err @ SearchError::LoadUnavailable { .. }) => {
            warn!(error = %err, "no data source; serving an empty library");
            Library::unavailable(config)?
        }
        Err(err) => return Err(err).context("loading the record corpus"),
    };

    let mut state = SearchState::default();
    if let Some(query) = matches.get_one::<String>("query") {
        state.query = query.clone();
    }
    state.speaker = matches.get_one::<String>("speaker").cloned();
    state.meeting = matches.get_one::<String>("meeting").cloned();
    if let Some(values) = matches.get_many::<String>("category") {
        state.categories = values.map(|v| TalkCategory::parse(v)).collect();
    }
    if let Some(values) = matches.get_many::<String>("year") {
        state.years = values.cloned().collect();
    }
    if let Some(values) = matches.get_many::<String>("topic") {
        // Accept raw tags like "mlir" and fold them onto canonical labels
        state.topics = values
            .map(|v| library.canonical_topic(v).unwrap_or_else(|| v.clone()))
            .collect();
    }
    state.has_video = matches.get_flag("video");
    state.has_slides = matches.get_flag("slides");
    if let Some(sort) = matches.get_one::<String>("sort") {
        state.sort = SortMode::parse(sort);
    }

    let projection = library.project(&state, page);
    info!(
        mode = ?projection.mode,
        results = projection.result_count,
        total = projection.total_count,
        "projection built"
    );

    let limit = *matches.get_one::<usize>("limit").unwrap_or(&20);
    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&projection)?);
        return Ok(());
    }

    if projection.data_unavailable {
        println!("Data unavailable: no record source was found under '{}'", data_dir);
        return Ok(());
    }
    println!(
        "{} of {} records ({:?} mode)",
        projection.result_count,
        projection.total_count,
        projection.mode
    );
    if let Some(slug) = &state.meeting {
        let stats = library.corpus().meeting_stats(slug);
        println!("  meeting {}: {} talks, {} with slides", slug, stats.talk_count, stats.slide_count);
    }
    for &idx in projection.results.iter().take(limit) {
        match page {
            Page::Talks => {
                let talk = &library.corpus().talks[idx];
                let speakers: Vec<&str> = talk.speakers.iter().map(|p| p.name.as_str()).collect();
                println!("  [{}] {} - {}", talk.year, talk.title, speakers.join(", "));
            }
            Page::Papers => {
                let paper = &library.corpus().papers[idx];
                println!("  [{}] {} ({} citations)", paper.year, paper.title, paper.citation_count);
            }
        }
    }
    if projection.results.is_empty() && !projection.suggestions.is_empty() {
        let topics: Vec<&str> = projection.suggestions.iter().map(|s| s.label.as_str()).collect();
        println!("No results. Try a topic: {}", topics.join(", "));
    }

    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .map_err(|e| SearchError::Config {
            message: format!("Invalid log level '{}': {}", config.logging.level, e),
        })?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(config.logging.show_targets)
                .with_level(true),
        )
        .with(filter)
        .init();
    Ok(())
}
