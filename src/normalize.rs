//! # Record Normalization Module
//!
//! ## Purpose
//! Cleans raw talk and paper records on ingest: collapses whitespace,
//! canonicalizes identifiers (DOI, OpenAlex), derives stable secondary fields
//! (years, video ids, venue segments), and splits speaker decorators into
//! name and affiliation.
//!
//! ## Input/Output Specification
//! - **Input**: Raw JSON-shaped talk, paper, and meeting objects
//! - **Output**: Normalized records, or `None` for records missing id or title
//! - **Guarantee**: Other malformed fields default to their empty type; the
//!   record survives
//!
//! ## Key Features
//! - Whitespace collapse across all string fields
//! - Citation count coercion over the historical key spellings
//! - DOI extraction from bare form or doi.org URLs
//! - OpenAlex id canonicalization to `https://openalex.org/W<digits>`
//! - Venue re-segmentation into `Publication | Vol. X (Issue Y)` form
//! - YouTube video id derivation from every known URL shape
//! - Speaker decorator splitting gated on an affiliation hint pattern
//! - Meeting date range pretty-printing

use crate::errors::{Result, SearchError};
use crate::{Meeting, Paper, Person, Talk, TalkCategory};
use chrono::Month;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

/// Raw speaker or author entry as found in record JSON
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPerson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub affiliation: Option<String>,
}

/// Raw talk record; extra fields are tolerated and ignored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTalk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub meeting: String,
    #[serde(default)]
    pub meeting_name: String,
    #[serde(default)]
    pub meeting_location: String,
    #[serde(default)]
    pub meeting_date: String,
    #[serde(default)]
    pub speakers: Vec<RawPerson>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub slides_url: String,
    #[serde(default)]
    pub project_github: String,
}

/// Raw paper record; extra fields are tolerated and ignored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPaper {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    /// Arrives as a number in newer shards and a string in older ones
    #[serde(default)]
    pub year: Value,
    #[serde(default)]
    pub publication: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default, rename = "type")]
    pub paper_type: String,
    #[serde(default)]
    pub paper_url: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub doi: String,
    #[serde(default)]
    pub openalex_id: String,
    // Citation counts arrived under several key spellings over the life of the
    // catalog builders; all are read and the first usable one wins.
    #[serde(default)]
    pub citation_count: Option<Value>,
    #[serde(default, rename = "citation_count")]
    pub citation_count_snake: Option<Value>,
    #[serde(default)]
    pub cited_by_count: Option<Value>,
    #[serde(default, rename = "cited_by_count")]
    pub cited_by_count_snake: Option<Value>,
    #[serde(default)]
    pub citations: Option<Value>,
    #[serde(default)]
    pub authors: Vec<RawPerson>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Raw meeting record from the event stream
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeeting {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub cancelled: bool,
}

/// Abstracts the catalog builders emit when no real abstract exists
const PLACEHOLDER_ABSTRACTS: [&str; 3] = [
    "no abstract available in openalex metadata.",
    "no abstract available.",
    "abstract not provided.",
];

/// Affiliation values that mean "missing"
const MISSING_AFFILIATION_TOKENS: [&str; 5] = ["unknown", "none", "n/a", "na", "independent"];

/// Record normalizer with precompiled patterns
pub struct Normalizer {
    doi_re: Regex,
    openalex_re: Regex,
    video_path_re: Regex,
    video_query_re: Regex,
    video_id_re: Regex,
    affiliation_hint_re: Regex,
    volume_issue_re: Regex,
    issue_only_re: Regex,
    date_range_re: Regex,
    back_to_schedule_re: Regex,
    ws_re: Regex,
}

impl Normalizer {
    /// Create a normalizer, compiling all patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            doi_re: compile(r"(?i)(10\.\d{4,9}/[-._;()/:A-Z0-9]+)")?,
            openalex_re: compile(r"(?i)\b(W\d+)\s*$")?,
            video_path_re: compile(
                r"(?i)(?:youtu\.be/|youtube\.com/(?:embed|shorts|live|v)/)([A-Za-z0-9_-]{11})(?:[/?#&]|$)",
            )?,
            video_query_re: compile(r"(?i)youtube\.com/watch\?(?:[^#]*&)?v=([A-Za-z0-9_-]{11})(?:[&#]|$)")?,
            video_id_re: compile(r"^[A-Za-z0-9_-]{11}$")?,
            affiliation_hint_re: compile(
                r"(?i)\b(university|universit(a|e|ä|é)\w*|institute?|instituto|laborator(y|ies)|labs?|research|college|polytech\w*|academy|corp(oration)?|technolog\w*|inc|llc|ltd|gmbh|google|apple|arm|intel|amd|ibm|nvidia|qualcomm|meta|microsoft|sony|huawei|samsung|igalia|sifive|modular)\b",
            )?,
            volume_issue_re: compile(r"(?i)^vol\.?\s*([^\s(]+)\s*(?:\(\s*issue\s*([^)]+?)\s*\))?$")?,
            issue_only_re: compile(r"(?i)^issue\s+(\S.*)$")?,
            date_range_re: compile(
                r"(?i)^\s*([A-Za-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:\s*(?:-|–|/|to)\s*(\d{1,2})(?:st|nd|rd|th)?)?\s*,?\s+(\d{4})\s*$",
            )?,
            back_to_schedule_re: compile(r"(?i)\s*(?:▲|&#9650;)?\s*back to schedule.*$")?,
            ws_re: compile(r"\s+")?,
        })
    }

    /// Collapse runs of whitespace and trim
    pub fn collapse_ws(&self, value: &str) -> String {
        self.ws_re.replace_all(value.trim(), " ").into_owned()
    }

    /// Normalize a raw talk. Returns `None` when id or title is empty.
    pub fn talk(&self, raw: &RawTalk) -> Option<Talk> {
        let id = self.collapse_ws(&raw.id);
        let title = self.clean_title(&raw.title);
        if id.is_empty() || title.is_empty() {
            tracing::debug!(id = %raw.id, "dropping talk with empty id or title");
            return None;
        }

        let meeting = self.collapse_ws(&raw.meeting);
        let video_url = self.collapse_ws(&raw.video_url);
        let video_id = self.video_id(&raw.video_id, &video_url);

        Some(Talk {
            year: derive_slug_year(&meeting),
            id,
            title,
            abstract_text: self.collapse_ws(&raw.abstract_text),
            category: TalkCategory::parse(&raw.category),
            meeting_name: self.collapse_ws(&raw.meeting_name),
            meeting_location: self.collapse_ws(&raw.meeting_location),
            meeting_date: self.pretty_date(&raw.meeting_date),
            meeting,
            speakers: raw.speakers.iter().filter_map(|p| self.person(p)).collect(),
            tags: self.clean_list(&raw.tags),
            video_url,
            video_id,
            slides_url: self.collapse_ws(&raw.slides_url),
            project_url: self.collapse_ws(&raw.project_github),
        })
    }

    /// Normalize a raw paper. Returns `None` when id or title is empty.
    pub fn paper(&self, raw: &RawPaper) -> Option<Paper> {
        let id = self.collapse_ws(&raw.id);
        let title = self.clean_title(&raw.title);
        if id.is_empty() || title.is_empty() {
            tracing::debug!(id = %raw.id, "dropping paper with empty id or title");
            return None;
        }

        let (publication, venue) = self.split_venue(&raw.publication, &raw.venue);

        Some(Paper {
            id,
            title,
            abstract_text: self.clean_abstract(&raw.abstract_text),
            year: derive_paper_year(&year_text(&raw.year)),
            publication,
            venue,
            paper_type: crate::PaperType::parse(&raw.paper_type),
            paper_url: self.collapse_ws(&raw.paper_url),
            source_url: self.collapse_ws(&raw.source_url),
            doi: self.normalize_doi(&raw.doi),
            openalex_id: self.normalize_openalex(&raw.openalex_id),
            citation_count: coerce_citation_count(raw),
            authors: raw.authors.iter().filter_map(|p| self.person(p)).collect(),
            tags: self.clean_list(&raw.tags),
            keywords: self.clean_list(&raw.keywords),
        })
    }

    /// Normalize a raw meeting. Returns `None` when the slug is empty.
    pub fn meeting(&self, raw: &RawMeeting) -> Option<Meeting> {
        let slug = self.collapse_ws(&raw.slug);
        if slug.is_empty() {
            return None;
        }
        Some(Meeting {
            year: derive_slug_year(&slug),
            name: {
                let name = self.collapse_ws(&raw.name);
                if name.is_empty() {
                    slug.clone()
                } else {
                    name
                }
            },
            slug,
            location: self.collapse_ws(&raw.location),
            date: self.pretty_date(&raw.date),
            cancelled: raw.cancelled,
        })
    }

    /// Normalize a raw person entry: split decorators, flip "Last, First",
    /// and drop placeholder affiliations
    pub fn person(&self, raw: &RawPerson) -> Option<Person> {
        let mut name = self.collapse_ws(&raw.name);
        if name.is_empty() {
            return None;
        }

        let mut affiliation = raw
            .affiliation
            .as_deref()
            .map(|a| self.collapse_ws(a))
            .filter(|a| !a.is_empty());

        if affiliation.is_none() {
            let (split_name, split_affil) = self.split_decorator(&name);
            name = split_name;
            affiliation = split_affil;
        }

        // "Last, First" with exactly one comma and no affiliation hint
        if name.matches(',').count() == 1 {
            let flipped = name.split_once(',').and_then(|(last, first)| {
                let first = first.trim();
                let last = last.trim();
                if first.is_empty() || last.is_empty() {
                    None
                } else {
                    Some(format!("{} {}", first, last))
                }
            });
            if let Some(flipped) = flipped {
                name = flipped;
            }
        }

        affiliation = affiliation.filter(|a| {
            !MISSING_AFFILIATION_TOKENS.contains(&a.to_ascii_lowercase().trim_matches('.'))
        });

        Some(Person { name, affiliation })
    }

    /// Split decorators of form `Name (Affil)`, `Name - Affil`, `Name, Affil`
    /// when the right-hand side matches the affiliation hint pattern
    fn split_decorator(&self, name: &str) -> (String, Option<String>) {
        if let (Some(open), true) = (name.find('('), name.ends_with(')')) {
            let candidate = name[open + 1..name.len() - 1].trim();
            if self.affiliation_hint_re.is_match(candidate) {
                return (
                    self.collapse_ws(&name[..open]),
                    Some(candidate.to_string()),
                );
            }
        }
        for separator in [" - ", " – ", ", "] {
            if let Some((left, right)) = name.split_once(separator) {
                let right = right.trim();
                if self.affiliation_hint_re.is_match(right) {
                    return (self.collapse_ws(left), Some(right.to_string()));
                }
            }
        }
        (name.to_string(), None)
    }

    /// Canonicalize a DOI from bare form or a doi.org URL
    pub fn normalize_doi(&self, raw: &str) -> String {
        let lowered = self.collapse_ws(raw).to_ascii_lowercase();
        if lowered.is_empty() {
            return String::new();
        }
        match self.doi_re.captures(&lowered) {
            Some(caps) => caps[1].trim_end_matches(['.', ',', ';', ')']).to_string(),
            None => String::new(),
        }
    }

    /// Canonicalize an OpenAlex id (bare `W123` or any OpenAlex URL) to the
    /// canonical `https://openalex.org/W<digits>` form
    pub fn normalize_openalex(&self, raw: &str) -> String {
        let clean = self.collapse_ws(raw);
        let clean = clean.trim_end_matches('/');
        match self.openalex_re.captures(clean) {
            Some(caps) => format!("https://openalex.org/{}", caps[1].to_ascii_uppercase()),
            None => String::new(),
        }
    }

    /// Derive a YouTube video id, preferring an explicit raw id when valid
    pub fn video_id(&self, raw_id: &str, url: &str) -> String {
        let raw_id = self.collapse_ws(raw_id);
        if self.video_id_re.is_match(&raw_id) {
            return raw_id;
        }
        if let Some(caps) = self.video_query_re.captures(url) {
            return caps[1].to_string();
        }
        if let Some(caps) = self.video_path_re.captures(url) {
            return caps[1].to_string();
        }
        String::new()
    }

    /// Split a venue field on `|`, classify segments into publication, volume,
    /// issue, and extras, and re-emit a normalized venue string
    pub fn split_venue(&self, raw_publication: &str, raw_venue: &str) -> (String, String) {
        let mut publication = self.collapse_ws(raw_publication);
        let mut volume = String::new();
        let mut issue = String::new();
        let mut extras: Vec<String> = Vec::new();

        for segment in raw_venue.split('|') {
            let segment = self.collapse_ws(segment);
            if segment.is_empty() {
                continue;
            }
            if let Some(caps) = self.volume_issue_re.captures(&segment) {
                if volume.is_empty() {
                    volume = caps[1].to_string();
                    if let Some(found) = caps.get(2) {
                        issue = found.as_str().to_string();
                    }
                    continue;
                }
            }
            if let Some(caps) = self.issue_only_re.captures(&segment) {
                if issue.is_empty() {
                    issue = self.collapse_ws(&caps[1]);
                    continue;
                }
            }
            if publication.is_empty() {
                publication = segment;
            } else if segment != publication {
                extras.push(segment);
            }
        }

        let mut parts: Vec<String> = Vec::new();
        if !publication.is_empty() {
            parts.push(publication.clone());
        }
        if !volume.is_empty() {
            if issue.is_empty() {
                parts.push(format!("Vol. {}", volume));
            } else {
                parts.push(format!("Vol. {} (Issue {})", volume, issue));
            }
        } else if !issue.is_empty() {
            parts.push(format!("Issue {}", issue));
        }
        parts.extend(extras);

        (publication, parts.join(" | "))
    }

    /// Pretty-print a meeting date range per the grammar
    /// `<Month> <day>(st|nd|rd|th)?([-/ to]<day>)?,? <YYYY>`.
    /// Unparseable inputs pass through unchanged.
    pub fn pretty_date(&self, raw: &str) -> String {
        let clean = self.collapse_ws(raw);
        let Some(caps) = self.date_range_re.captures(&clean) else {
            return clean;
        };
        let Ok(month) = Month::from_str(&caps[1]) else {
            return clean;
        };
        let day: u32 = match caps[2].parse() {
            Ok(d) if (1..=31).contains(&d) => d,
            _ => return clean,
        };
        let second_day: Option<u32> = caps.get(3).and_then(|m| m.as_str().parse().ok());
        let year = &caps[4];

        match second_day {
            Some(d2) if (1..=31).contains(&d2) => {
                format!("{} {}-{}, {}", month.name(), day, d2, year)
            }
            _ => format!("{} {}, {}", month.name(), day, year),
        }
    }

    /// Strip schedule-navigation debris from titles
    fn clean_title(&self, raw: &str) -> String {
        let stripped = self.back_to_schedule_re.replace(raw, "");
        self.collapse_ws(&stripped)
    }

    /// Blank placeholder abstracts
    fn clean_abstract(&self, raw: &str) -> String {
        let clean = self.collapse_ws(raw);
        if PLACEHOLDER_ABSTRACTS.contains(&clean.to_ascii_lowercase().as_str()) {
            String::new()
        } else {
            clean
        }
    }

    fn clean_list(&self, values: &[String]) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(values.len());
        for value in values {
            let clean = self.collapse_ws(value);
            if !clean.is_empty() && !out.contains(&clean) {
                out.push(clean);
            }
        }
        out
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| SearchError::Internal {
        message: format!("Invalid built-in pattern: {}", e),
    })
}

/// Talk and meeting years come from the slug prefix when it is four digits
pub fn derive_slug_year(slug: &str) -> String {
    let prefix: String = slug.chars().take(4).collect();
    if prefix.len() == 4 && prefix.chars().all(|c| c.is_ascii_digit()) {
        prefix
    } else {
        String::new()
    }
}

/// Year field as text, whichever JSON type carried it
fn year_text(value: &Value) -> String {
    match value {
        Value::Number(n) => n.as_i64().map(|y| y.to_string()).unwrap_or_default(),
        Value::String(s) => s.trim().to_string(),
        _ => String::new(),
    }
}

/// Paper years survive only when the raw value is exactly four digits
pub fn derive_paper_year(raw: &str) -> String {
    if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        raw.to_string()
    } else {
        String::new()
    }
}

/// Read the first finite positive integer among the historical citation keys
fn coerce_citation_count(raw: &RawPaper) -> u32 {
    let candidates = [
        &raw.citation_count,
        &raw.citation_count_snake,
        &raw.cited_by_count,
        &raw.cited_by_count_snake,
        &raw.citations,
    ];
    for candidate in candidates.into_iter().flatten() {
        let parsed = match candidate {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        if let Some(n) = parsed {
            if n.is_finite() && n > 0.0 && n.fract() == 0.0 {
                return n as u32;
            }
        }
    }
    0
}
