//! # Query Engine Module
//!
//! ## Purpose
//! Two-stage ranked search over the frozen index. Stage one scores exact
//! substring hits against weighted fields with AND semantics across tokens;
//! stage two is a fuzzy fallback (prefix, substring, subsequence, bounded edit
//! distance over token bags) that runs only when the exact stage comes back
//! empty on a non-empty query.
//!
//! ## Input/Output Specification
//! - **Input**: Query string, frozen search index, corpus, configuration
//! - **Output**: Deterministically ordered record indices plus the mode used
//! - **Guarantee**: Total over its inputs; identical runs produce identical
//!   ordering
//!
//! ## Key Features
//! - Quoted-span tokenization with a minimum token length
//! - Per-field weight tables for talks and papers
//! - Recency nudge biasing ties toward newer records
//! - Two-row bounded Levenshtein with early abandonment

use crate::config::{Config, FuzzyConfig};
use crate::index::{PaperDoc, SearchIndex, TalkDoc, TokenBags};
use crate::Corpus;
use serde::Serialize;

/// Which scoring regime produced the result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// No query tokens; records in default corpus order
    Browse,
    /// Exact-stage scoring
    Exact,
    /// Fuzzy fallback scoring
    Fuzzy,
}

/// A query, tokenized once and shared across both corpora
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub tokens: Vec<String>,
}

impl Query {
    /// Tokenize a query string: quoted spans become single tokens, whitespace
    /// separates the rest, and tokens shorter than the minimum are dropped
    pub fn parse(raw: &str, config: &Config) -> Self {
        let min_len = config.query.min_token_len;
        let mut tokens: Vec<String> = Vec::new();
        let mut rest = raw;

        while let Some(open) = rest.find('"') {
            for word in rest[..open].split_whitespace() {
                push_token(&mut tokens, word, min_len);
            }
            let after = &rest[open + 1..];
            match after.find('"') {
                Some(close) => {
                    push_token(&mut tokens, after[..close].trim(), min_len);
                    rest = &after[close + 1..];
                }
                None => {
                    // Unterminated quote: treat the remainder as one span
                    push_token(&mut tokens, after.trim(), min_len);
                    rest = "";
                }
            }
        }
        for word in rest.split_whitespace() {
            push_token(&mut tokens, word, min_len);
        }

        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn push_token(tokens: &mut Vec<String>, raw: &str, min_len: usize) {
    let token = raw.to_lowercase();
    if token.chars().count() >= min_len {
        tokens.push(token);
    }
}

/// Ranked talk indices into `corpus.talks`, plus the mode used
pub fn rank_talks(index: &SearchIndex, corpus: &Corpus, query: &Query, config: &Config) -> (Vec<usize>, SearchMode) {
    if query.is_empty() {
        let mut order: Vec<usize> = (0..corpus.talks.len()).collect();
        order.sort_by(|&a, &b| talk_tie_break(corpus, a, b));
        return (order, SearchMode::Browse);
    }

    let exact: Vec<(usize, f64)> = (0..corpus.talks.len())
        .filter_map(|i| exact_talk_score(&index.talk_docs[i], &corpus.talks[i].year, query, config).map(|s| (i, s)))
        .collect();
    if !exact.is_empty() {
        return (order_talks(exact, corpus), SearchMode::Exact);
    }

    let fuzzy: Vec<(usize, f64)> = (0..corpus.talks.len())
        .filter_map(|i| fuzzy_score(&index.talk_docs[i].bags, query, &config.fuzzy).map(|s| (i, s)))
        .collect();
    if fuzzy.is_empty() {
        // Both stages empty: report the stage that actually scored
        return (Vec::new(), SearchMode::Exact);
    }
    (order_talks(fuzzy, corpus), SearchMode::Fuzzy)
}

/// Ranked paper indices into `corpus.papers`, plus the mode used. Papers in
/// browse mode use the relevance tie-break chain; facet-level sort modes may
/// reorder afterwards.
pub fn rank_papers(index: &SearchIndex, corpus: &Corpus, query: &Query, config: &Config) -> (Vec<usize>, SearchMode) {
    if query.is_empty() {
        let mut order: Vec<usize> = (0..corpus.papers.len()).collect();
        order.sort_by(|&a, &b| paper_tie_break(corpus, a, b));
        return (order, SearchMode::Browse);
    }

    let exact: Vec<(usize, f64)> = (0..corpus.papers.len())
        .filter_map(|i| exact_paper_score(&index.paper_docs[i], &corpus.papers[i].year, query, config).map(|s| (i, s)))
        .collect();
    if !exact.is_empty() {
        return (order_papers(exact, corpus), SearchMode::Exact);
    }

    let fuzzy: Vec<(usize, f64)> = (0..corpus.papers.len())
        .filter_map(|i| fuzzy_score(&index.paper_docs[i].bags, query, &config.fuzzy).map(|s| (i, s)))
        .collect();
    if fuzzy.is_empty() {
        return (Vec::new(), SearchMode::Exact);
    }
    (order_papers(fuzzy, corpus), SearchMode::Fuzzy)
}

/// Exact stage for one talk. `None` when any token has no field support.
fn exact_talk_score(doc: &TalkDoc, year: &str, query: &Query, config: &Config) -> Option<f64> {
    let w = &config.scoring.talk;
    let mut total = 0.0;
    for token in &query.tokens {
        let mut score = 0.0;
        if doc.title.starts_with(token.as_str()) {
            score += w.title_prefix;
        } else if doc.title.contains(token.as_str()) {
            score += w.title;
        }
        if doc.speakers.contains(token.as_str()) {
            score += w.speakers;
        }
        if doc.tags.contains(token.as_str()) {
            score += w.tags;
        }
        if doc.abstract_text.contains(token.as_str()) {
            score += w.abstract_text;
        }
        if doc.meeting.contains(token.as_str()) {
            score += w.meeting;
        }
        if doc.category.contains(token.as_str()) {
            score += w.category;
        }
        if score == 0.0 {
            return None;
        }
        total += score;
    }
    Some(total + recency_nudge(year, config.scoring.talk_epoch, config.scoring.recency_nudge))
}

/// Exact stage for one paper. `None` when any token has no field support.
fn exact_paper_score(doc: &PaperDoc, year: &str, query: &Query, config: &Config) -> Option<f64> {
    let w = &config.scoring.paper;
    let mut total = 0.0;
    for token in &query.tokens {
        let mut score = 0.0;
        if doc.title.starts_with(token.as_str()) {
            score += w.title_prefix;
        } else if doc.title.contains(token.as_str()) {
            score += w.title;
        }
        if doc.authors.contains(token.as_str()) {
            score += w.authors;
        }
        if doc.tags.contains(token.as_str()) {
            score += w.tags;
        }
        if doc.keywords.contains(token.as_str()) {
            score += w.keywords;
        }
        if doc.abstract_text.contains(token.as_str()) {
            score += w.abstract_text;
        }
        if doc.publication.contains(token.as_str()) {
            score += w.publication;
        }
        if doc.venue.contains(token.as_str()) {
            score += w.venue;
        }
        if doc.paper_type.contains(token.as_str()) {
            score += w.paper_type;
        }
        if doc.year.contains(token.as_str()) {
            score += w.year;
        }
        if score == 0.0 {
            return None;
        }
        total += score;
    }
    Some(total + recency_nudge(year, config.scoring.paper_epoch, config.scoring.recency_nudge))
}

fn recency_nudge(year: &str, epoch: i32, nudge: f64) -> f64 {
    let year: i32 = year.parse().unwrap_or(epoch);
    nudge * f64::from(year - epoch)
}

/// Fuzzy stage over a record's token bags. `None` when any token scores zero.
fn fuzzy_score(bags: &TokenBags, query: &Query, fz: &FuzzyConfig) -> Option<f64> {
    let mut total = 0.0;
    for token in &query.tokens {
        let title = bag_score(&bags.title, token, fz);
        let people = bag_score(&bags.people, token, fz);
        let tags = bag_score(&bags.tags, token, fz);
        let keywords = bag_score(&bags.keywords, token, fz);
        let publication = bag_score(&bags.publication, token, fz);
        let venue = bag_score(&bags.venue, token, fz);

        let mut best = 0.0_f64;
        if title > 0.0 {
            best = best.max(title + fz.title_bonus);
        }
        if people > 0.0 {
            best = best.max(people + fz.people_bonus);
        }
        if tags > 0.0 {
            best = best.max(tags + fz.tag_bonus);
        }
        if keywords > 0.0 {
            best = best.max(keywords + fz.keyword_bonus);
        }
        if publication > 0.0 {
            best = best.max(publication + fz.publication_bonus);
        }
        // Venue and meeting words carry no bonus
        best = best.max(venue);
        if best == 0.0 {
            return None;
        }
        total += best;
    }
    Some(total)
}

/// Best fuzzy score of a token against every word in one bag
fn bag_score(bag: &[String], token: &str, fz: &FuzzyConfig) -> f64 {
    let mut best = 0.0_f64;
    for word in bag {
        best = best.max(word_score(word, token, fz));
        if best >= fz.equal {
            break;
        }
    }
    best
}

fn word_score(word: &str, token: &str, fz: &FuzzyConfig) -> f64 {
    if word == token {
        return fz.equal;
    }
    let mut best = 0.0_f64;
    if word.starts_with(token) {
        best = best.max(fz.prefix);
    } else if word.contains(token) {
        best = best.max(fz.substring);
    }
    let token_len = token.chars().count();
    if token_len >= fz.min_subsequence_len && is_subsequence(token, word) {
        best = best.max(fz.subsequence);
    }
    let max_distance = match token_len {
        4..=6 => 1,
        n if n >= 7 => 2,
        _ => 0,
    };
    if max_distance > 0 {
        match bounded_levenshtein(token, word, max_distance) {
            1 => best = best.max(fz.distance_one),
            2 if max_distance >= 2 => best = best.max(fz.distance_two),
            _ => {}
        }
    }
    best
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut chars = needle.chars().peekable();
    for c in haystack.chars() {
        if chars.peek() == Some(&c) {
            chars.next();
        }
    }
    chars.peek().is_none()
}

/// Bounded Levenshtein distance with two rolling rows. Returns
/// `max_distance + 1` for any pair beyond the bound.
pub fn bounded_levenshtein(a: &str, b: &str, max_distance: usize) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max_distance {
        return max_distance + 1;
    }
    if a.is_empty() {
        return b.len().min(max_distance + 1);
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        let mut row_min = current[0];
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
            row_min = row_min.min(current[j + 1]);
        }
        if row_min > max_distance {
            return max_distance + 1;
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()].min(max_distance + 1)
}

fn order_talks(mut scored: Vec<(usize, f64)>, corpus: &Corpus) -> Vec<usize> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| talk_tie_break(corpus, a.0, b.0)));
    scored.into_iter().map(|(i, _)| i).collect()
}

fn order_papers(mut scored: Vec<(usize, f64)>, corpus: &Corpus) -> Vec<usize> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| paper_tie_break(corpus, a.0, b.0)));
    scored.into_iter().map(|(i, _)| i).collect()
}

/// Talk tie-break: meeting desc, id asc, title asc
pub fn talk_tie_break(corpus: &Corpus, a: usize, b: usize) -> std::cmp::Ordering {
    let ta = &corpus.talks[a];
    let tb = &corpus.talks[b];
    tb.meeting
        .cmp(&ta.meeting)
        .then_with(|| ta.id.cmp(&tb.id))
        .then_with(|| ta.title.cmp(&tb.title))
}

/// Paper tie-break: year desc, citations desc, title asc, id asc
pub fn paper_tie_break(corpus: &Corpus, a: usize, b: usize) -> std::cmp::Ordering {
    let pa = &corpus.papers[a];
    let pb = &corpus.papers[b];
    pb.year
        .cmp(&pa.year)
        .then_with(|| pb.citation_count.cmp(&pa.citation_count))
        .then_with(|| pa.title.cmp(&pb.title))
        .then_with(|| pa.id.cmp(&pb.id))
}
