//! # URL State Codec Module
//!
//! ## Purpose
//! Encodes a search state into stable URL query parameters and parses them
//! back. Emission omits default-valued keys so shared URLs stay short;
//! parsing is forgiving, dropping unknown keys and empty segments instead of
//! failing.
//!
//! ## Input/Output Specification
//! - **Input**: A state and the page it belongs to, or a raw query string
//! - **Output**: A query string without the leading `?`, or a state
//! - **Guarantee**: `decode(encode(state, page), page, corpus) == state` for
//!   every state reachable through events on that page against that corpus
//!
//! ## Key Features
//! - Comma lists for categories, years, and topics
//! - Legacy `publication`/`venue` keys read as free text when `q` is absent
//! - Minimal percent encoding covering the separator characters

use crate::facets::{self, SortMode};
use crate::state::{Page, SearchState};
use crate::{Corpus, TalkCategory};

/// Characters that must not appear raw inside a parameter value
fn needs_escape(c: char) -> bool {
    matches!(c, '%' | '&' | '=' | '#' | '+' | ',' | '?') || c == ' ' || !c.is_ascii_graphic()
}

/// Percent-encode one parameter value
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push('%');
                out.push(char::from(HEX[(byte >> 4) as usize]));
                out.push(char::from(HEX[(byte & 0x0f) as usize]));
            }
        } else {
            out.push(c);
        }
    }
    out
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn decode_value(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => match (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                (Some(hi), Some(lo)) => {
                    out.push(hi << 4 | lo);
                    i += 3;
                }
                _ => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Emit the query string for a state, omitting defaults. No leading `?`.
pub fn encode(state: &SearchState, page: Page) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut push = |key: &str, value: &str| {
        parts.push(format!("{}={}", key, encode_component(value)));
    };

    if !state.query.is_empty() {
        push("q", &state.query);
    }
    if let Some(speaker) = &state.speaker {
        push("speaker", speaker);
    }
    if page == Page::Talks {
        if let Some(meeting) = &state.meeting {
            push("meeting", meeting);
        }
        if !state.categories.is_empty() {
            let list: Vec<&str> = state.categories.iter().map(|c| c.as_str()).collect();
            push("category", &list.join(","));
        }
        if state.has_video {
            push("video", "1");
        }
        if state.has_slides {
            push("slides", "1");
        }
    }
    if !state.years.is_empty() {
        let list: Vec<&str> = state.years.iter().map(|y| y.as_str()).collect();
        push("year", &list.join(","));
    }
    if page == Page::Papers {
        if !state.topics.is_empty() {
            let list: Vec<&str> = state.topics.iter().map(|t| t.as_str()).collect();
            push("tag", &list.join(","));
        }
        if state.sort != SortMode::Relevance {
            push("sort", state.sort.as_str());
        }
    }
    parts.join("&")
}

/// Parse a query string (with or without a leading `?`) into a state.
/// Unknown keys are ignored; empty list segments are dropped. Stale or
/// hand-edited links can pair a meeting with years that exclude it, so the
/// meeting/year consistency rule runs once before the state is returned.
pub fn decode(raw: &str, page: Page, corpus: &Corpus) -> SearchState {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut state = SearchState::default();
    let mut legacy_query: Option<String> = None;

    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = decode_value(value);
        if value.is_empty() {
            continue;
        }
        match key {
            "q" => state.query = value,
            "speaker" => state.speaker = Some(value),
            "meeting" if page == Page::Talks => state.meeting = Some(value),
            "category" if page == Page::Talks => {
                for segment in value.split(',').filter(|s| !s.is_empty()) {
                    state.categories.insert(TalkCategory::parse(segment));
                }
            }
            "year" => {
                for segment in value.split(',').filter(|s| !s.is_empty()) {
                    state.years.insert(segment.to_string());
                }
            }
            "tag" if page == Page::Papers => {
                for segment in value.split(',').filter(|s| !s.is_empty()) {
                    state.topics.insert(segment.to_string());
                }
            }
            "video" if page == Page::Talks => state.has_video = value == "1",
            "slides" if page == Page::Talks => state.has_slides = value == "1",
            "sort" if page == Page::Papers => state.sort = SortMode::parse(&value),
            // Legacy links carried publication and venue searches
            "publication" | "venue" => legacy_query = Some(value),
            _ => {}
        }
    }

    if state.query.is_empty() {
        if let Some(legacy) = legacy_query {
            state.query = legacy;
        }
    }
    facets::reconcile_meeting_with_years(&mut state, corpus);
    state
}
