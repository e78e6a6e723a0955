//! # Person Canonicalization Module
//!
//! ## Purpose
//! Merges speaker and author name variants (including middle-initial forms)
//! into canonical identities spanning the talk and paper corpora, so the
//! person facet and the people autocomplete pool operate on one identity per
//! human rather than one per spelling.
//!
//! ## Input/Output Specification
//! - **Input**: Normalized talks and papers
//! - **Output**: Canonical person identities with per-corpus filter names
//! - **Guarantee**: Merging is commutative and idempotent; merges never span
//!   differing last tokens
//!
//! ## Key Features
//! - Diacritic-stripped, punctuation-collapsed base keys
//! - Middle-initial prefix compatibility with affiliation-overlap gating
//! - Count-weighted display name selection
//! - `same_person` is reflexive and symmetric but intentionally NOT
//!   transitive: "Jane Q. Doe" and "Jane R. Doe" are both variants of
//!   "Jane Doe" yet are distinct from each other. Callers that need
//!   equivalence classes must use the built index, not pairwise checks.

use crate::{Paper, Talk};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

/// A canonical person identity emitted by the index
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalPerson {
    /// Stable id: token-joined base key of the display name
    pub id: String,
    /// Preferred display name
    pub name: String,
    /// Preferred name when emitting talk-side filters
    pub talk_filter_name: String,
    /// Preferred name when emitting paper-side filters
    pub paper_filter_name: String,
    /// All raw name variants observed, most frequent first
    pub variant_names: Vec<String>,
    /// Number of talk appearances
    pub talk_count: u32,
    /// Number of paper appearances
    pub paper_count: u32,
    /// Number of distinct records mentioning this identity
    pub record_count: usize,
}

impl CanonicalPerson {
    pub fn total_count(&self) -> u32 {
        self.talk_count + self.paper_count
    }
}

/// Which corpus a name observation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Talk,
    Paper,
}

/// Accumulator for one base key (later, one merged identity)
#[derive(Debug, Clone, Default)]
struct Bucket {
    /// Per raw name: (talk occurrences, paper occurrences)
    name_counts: BTreeMap<String, (u32, u32)>,
    /// Normalized affiliation key occurrences
    affiliations: BTreeMap<String, u32>,
    /// Distinct record references ("t:<id>" / "p:<id>")
    records: HashSet<String>,
    talk_count: u32,
    paper_count: u32,
}

impl Bucket {
    fn observe(&mut self, name: &str, affiliation: Option<&str>, side: Side, record_ref: String) {
        let entry = self.name_counts.entry(name.to_string()).or_default();
        match side {
            Side::Talk => {
                entry.0 += 1;
                self.talk_count += 1;
            }
            Side::Paper => {
                entry.1 += 1;
                self.paper_count += 1;
            }
        }
        if let Some(affil) = affiliation {
            let key = affiliation_key(affil);
            if !key.is_empty() {
                *self.affiliations.entry(key).or_default() += 1;
            }
        }
        self.records.insert(record_ref);
    }

    fn absorb(&mut self, other: Bucket) {
        for (name, (talks, papers)) in other.name_counts {
            let entry = self.name_counts.entry(name).or_default();
            entry.0 += talks;
            entry.1 += papers;
        }
        for (key, count) in other.affiliations {
            *self.affiliations.entry(key).or_default() += count;
        }
        self.records.extend(other.records);
        self.talk_count += other.talk_count;
        self.paper_count += other.paper_count;
    }

    /// The display name with the highest preference score
    fn display_name(&self) -> String {
        best_name(self.name_counts.iter().map(|(name, (t, p))| (name.as_str(), t + p)))
    }

    /// Preferred filter name using only one corpus side, falling back to the
    /// overall display name when that side has no observations
    fn filter_name(&self, side: Side) -> String {
        let picked = best_name(self.name_counts.iter().filter_map(|(name, (t, p))| {
            let count = match side {
                Side::Talk => *t,
                Side::Paper => *p,
            };
            (count > 0).then_some((name.as_str(), count))
        }));
        if picked.is_empty() {
            self.display_name()
        } else {
            picked
        }
    }

    fn has_affiliation_data(&self) -> bool {
        !self.affiliations.is_empty()
    }

    fn shares_affiliation(&self, other: &Bucket) -> bool {
        self.affiliations.keys().any(|k| other.affiliations.contains_key(k))
    }
}

/// Canonical identity index built once per corpus load
#[derive(Debug, Default)]
pub struct PersonIndex {
    people: Vec<CanonicalPerson>,
    by_base_key: HashMap<String, usize>,
    by_signature: HashMap<(String, String), Vec<usize>>,
}

impl PersonIndex {
    /// Build canonical identities spanning talks and papers
    pub fn build(talks: &[Talk], papers: &[Paper]) -> Self {
        let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();

        for talk in talks {
            for speaker in &talk.speakers {
                let key = base_key(&speaker.name);
                if key.is_empty() {
                    continue;
                }
                buckets.entry(key).or_default().observe(
                    &speaker.name,
                    speaker.affiliation.as_deref(),
                    Side::Talk,
                    format!("t:{}", talk.id),
                );
            }
        }
        for paper in papers {
            for author in &paper.authors {
                let key = base_key(&author.name);
                if key.is_empty() {
                    continue;
                }
                buckets.entry(key).or_default().observe(
                    &author.name,
                    author.affiliation.as_deref(),
                    Side::Paper,
                    format!("p:{}", paper.id),
                );
            }
        }

        tracing::debug!(buckets = buckets.len(), "person buckets before merging");

        // Group by (first-token, last-token); merges never span differing
        // last tokens.
        let mut groups: BTreeMap<(String, String), Vec<(String, Bucket)>> = BTreeMap::new();
        for (key, bucket) in buckets {
            let tokens: Vec<&str> = key.split(' ').collect();
            let signature = (
                tokens.first().copied().unwrap_or_default().to_string(),
                tokens.last().copied().unwrap_or_default().to_string(),
            );
            groups.entry(signature).or_default().push((key, bucket));
        }

        let mut assembled: Vec<(Vec<String>, (String, String), CanonicalPerson)> = Vec::new();
        for (signature, group) in groups {
            for (keys, bucket) in merge_group(group) {
                let display = bucket.display_name();
                let person = CanonicalPerson {
                    id: base_key(&display).replace(' ', "-"),
                    talk_filter_name: bucket.filter_name(Side::Talk),
                    paper_filter_name: bucket.filter_name(Side::Paper),
                    variant_names: variant_names(&bucket),
                    talk_count: bucket.talk_count,
                    paper_count: bucket.paper_count,
                    record_count: bucket.records.len(),
                    name: display,
                };
                assembled.push((keys, signature.clone(), person));
            }
        }

        assembled.sort_by(|a, b| {
            b.2.total_count()
                .cmp(&a.2.total_count())
                .then_with(|| a.2.name.cmp(&b.2.name))
        });

        let mut index = PersonIndex::default();
        for (keys, signature, person) in assembled {
            let idx = index.people.len();
            for key in keys {
                index.by_base_key.insert(key, idx);
            }
            index.by_signature.entry(signature).or_default().push(idx);
            index.people.push(person);
        }
        index
    }

    /// Look up the canonical identity for a raw name, if any
    pub fn lookup_by_name(&self, name: &str) -> Option<&CanonicalPerson> {
        let key = base_key(name);
        if key.is_empty() {
            return None;
        }
        if let Some(&idx) = self.by_base_key.get(&key) {
            return self.people.get(idx);
        }
        // Unseen spelling: try a middle-initial variant within the signature group
        let tokens: Vec<&str> = key.split(' ').collect();
        let signature = (
            tokens.first().copied().unwrap_or_default().to_string(),
            tokens.last().copied().unwrap_or_default().to_string(),
        );
        let candidates = self.by_signature.get(&signature)?;
        candidates
            .iter()
            .filter_map(|&idx| self.people.get(idx))
            .find(|person| same_person(name, &person.name))
    }

    /// All identities, sorted by total count descending then display name
    pub fn all(&self) -> &[CanonicalPerson] {
        &self.people
    }

    /// Whether two raw names refer to the same identity: equal base keys, or
    /// a middle-initial variant pair
    pub fn same_person(&self, a: &str, b: &str) -> bool {
        same_person(a, b)
    }
}

/// Pairwise identity check. Reflexive and symmetric; NOT transitive.
pub fn same_person(a: &str, b: &str) -> bool {
    let key_a = base_key(a);
    let key_b = base_key(b);
    if key_a.is_empty() || key_b.is_empty() {
        return false;
    }
    if key_a == key_b {
        return true;
    }
    are_middle_variants(&key_a, &key_b)
}

/// Two keys are middle-initial variants when first and last tokens match and
/// their middle-initial strings are prefix-compatible (one may be empty)
fn are_middle_variants(key_a: &str, key_b: &str) -> bool {
    let tokens_a: Vec<&str> = key_a.split(' ').collect();
    let tokens_b: Vec<&str> = key_b.split(' ').collect();
    if tokens_a.len() < 2 || tokens_b.len() < 2 {
        return false;
    }
    if tokens_a.first() != tokens_b.first() || tokens_a.last() != tokens_b.last() {
        return false;
    }
    let middles_a = middle_initials(&tokens_a);
    let middles_b = middle_initials(&tokens_b);
    middles_a.starts_with(&middles_b) || middles_b.starts_with(&middles_a)
}

/// Concatenated first letters of the middle tokens
fn middle_initials(tokens: &[&str]) -> String {
    tokens[1..tokens.len() - 1]
        .iter()
        .filter_map(|t| t.chars().next())
        .collect()
}

/// Lowercased, diacritic-stripped, punctuation-collapsed, token-joined key
pub fn base_key(name: &str) -> String {
    let stripped: String = name
        .nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();
    let mut out = String::with_capacity(stripped.len());
    let mut last_was_space = true;
    for c in stripped.chars() {
        if c.is_alphanumeric() {
            for lowered in c.to_lowercase() {
                out.push(lowered);
            }
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Normalized affiliation key: lowercase alphanumerics, leading "the" removed
pub fn affiliation_key(affiliation: &str) -> String {
    let mut lowered = base_key(affiliation);
    if let Some(rest) = lowered.strip_prefix("the ") {
        lowered = rest.to_string();
    }
    lowered
}

/// Merge loop within one (first, last) signature group; iterates until no
/// pair merges. Returns merged buckets with the base keys they absorbed.
fn merge_group(group: Vec<(String, Bucket)>) -> Vec<(Vec<String>, Bucket)> {
    let mut merged: Vec<(Vec<String>, Bucket)> = group
        .into_iter()
        .map(|(key, bucket)| (vec![key], bucket))
        .collect();

    loop {
        let mut merged_any = false;
        'outer: for i in 0..merged.len() {
            for j in (i + 1)..merged.len() {
                if should_merge(&merged[i].1, &merged[j].1) {
                    let (keys, bucket) = merged.remove(j);
                    merged[i].0.extend(keys);
                    merged[i].1.absorb(bucket);
                    merged_any = true;
                    break 'outer;
                }
            }
        }
        if !merged_any {
            return merged;
        }
    }
}

/// Merge rule: preferred display names are middle-initial variants AND the
/// affiliation evidence is consistent (shared key, or exactly one side empty)
fn should_merge(a: &Bucket, b: &Bucket) -> bool {
    let name_a = base_key(&a.display_name());
    let name_b = base_key(&b.display_name());
    if name_a != name_b && !are_middle_variants(&name_a, &name_b) {
        return false;
    }
    match (a.has_affiliation_data(), b.has_affiliation_data()) {
        (true, true) => a.shares_affiliation(b),
        (true, false) | (false, true) => true,
        (false, false) => false,
    }
}

/// Score-based display name selection:
/// `100·count − 2·|middle tokens| − 0.8·[bare initial] − 0.02·max(0, len−40)`
fn best_name<'a>(candidates: impl Iterator<Item = (&'a str, u32)>) -> String {
    let mut best: Option<(f64, &str)> = None;
    for (name, count) in candidates {
        let tokens: Vec<&str> = name.split_whitespace().collect();
        let middles = tokens.len().saturating_sub(2);
        let has_bare_initial = tokens.iter().any(|t| {
            let bare = t.trim_end_matches('.');
            bare.chars().count() == 1 && bare.chars().all(|c| c.is_alphabetic())
        });
        let length_penalty = 0.02 * (name.chars().count() as f64 - 40.0).max(0.0);
        let score = 100.0 * f64::from(count)
            - 2.0 * middles as f64
            - if has_bare_initial { 0.8 } else { 0.0 }
            - length_penalty;

        best = match best {
            None => Some((score, name)),
            Some((best_score, best_name)) => {
                if score > best_score || (score == best_score && name < best_name) {
                    Some((score, name))
                } else {
                    Some((best_score, best_name))
                }
            }
        };
    }
    best.map(|(_, name)| name.to_string()).unwrap_or_default()
}

/// Observed raw spellings, most frequent first then lexicographic
fn variant_names(bucket: &Bucket) -> Vec<String> {
    let mut names: Vec<(&String, u32)> = bucket
        .name_counts
        .iter()
        .map(|(name, (t, p))| (name, t + p))
        .collect();
    names.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    names.into_iter().map(|(name, _)| name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PaperType, Person, TalkCategory};

    fn talk_by(id: &str, speaker: &str, affiliation: Option<&str>) -> Talk {
        Talk {
            id: id.into(),
            title: "Talk".into(),
            abstract_text: String::new(),
            category: TalkCategory::TechnicalTalk,
            meeting: "2024-us".into(),
            meeting_name: String::new(),
            meeting_location: String::new(),
            meeting_date: String::new(),
            speakers: vec![Person {
                name: speaker.into(),
                affiliation: affiliation.map(|a| a.to_string()),
            }],
            tags: vec![],
            video_url: String::new(),
            video_id: String::new(),
            slides_url: String::new(),
            project_url: String::new(),
            year: "2024".into(),
        }
    }

    fn paper_by(id: &str, author: &str, affiliation: Option<&str>) -> Paper {
        Paper {
            id: id.into(),
            title: "Paper".into(),
            abstract_text: String::new(),
            year: "2023".into(),
            publication: String::new(),
            venue: String::new(),
            paper_type: PaperType::ResearchPaper,
            paper_url: String::new(),
            source_url: String::new(),
            doi: String::new(),
            openalex_id: String::new(),
            citation_count: 0,
            authors: vec![Person {
                name: author.into(),
                affiliation: affiliation.map(|a| a.to_string()),
            }],
            tags: vec![],
            keywords: vec![],
        }
    }

    #[test]
    fn base_key_strips_diacritics_and_punctuation() {
        assert_eq!(base_key("José M. García"), "jose m garcia");
        assert_eq!(base_key("  O'Brien,   Liam "), "o brien liam");
    }

    #[test]
    fn same_person_is_reflexive_and_symmetric() {
        let names = ["Jane Doe", "Jane Q. Doe", "Jane Quinn Doe"];
        for a in names {
            assert!(same_person(a, a));
            for b in names {
                assert_eq!(same_person(a, b), same_person(b, a));
            }
        }
    }

    #[test]
    fn same_person_is_not_transitive() {
        // Both initialed forms are variants of the plain form but the
        // middle-initial strings "q" and "r" are not prefix-compatible.
        assert!(same_person("Jane Q. Doe", "Jane Doe"));
        assert!(same_person("Jane Doe", "Jane R. Doe"));
        assert!(!same_person("Jane Q. Doe", "Jane R. Doe"));
    }

    #[test]
    fn merges_never_span_differing_last_tokens() {
        assert!(!same_person("Jane Doe", "Jane Roe"));
    }

    #[test]
    fn middle_initial_variants_merge_with_shared_affiliation() {
        // Scenario S4: one talk as "Jane Q. Doe", one paper as "Jane Doe",
        // same affiliation.
        let talks = vec![talk_by("t1", "Jane Q. Doe", Some("ACME"))];
        let papers = vec![paper_by("p1", "Jane Doe", Some("ACME"))];
        let index = PersonIndex::build(&talks, &papers);

        assert_eq!(index.all().len(), 1);
        let person = &index.all()[0];
        assert_eq!(person.total_count(), 2);
        assert_eq!(person.talk_filter_name, "Jane Q. Doe");
        assert_eq!(person.paper_filter_name, "Jane Doe");
        assert_eq!(person.record_count, 2);
    }

    #[test]
    fn conflicting_affiliations_block_the_merge() {
        let talks = vec![talk_by("t1", "Jane Q. Doe", Some("ACME"))];
        let papers = vec![paper_by("p1", "Jane Doe", Some("Initech"))];
        let index = PersonIndex::build(&talks, &papers);
        assert_eq!(index.all().len(), 2);
    }

    #[test]
    fn one_sided_missing_affiliation_allows_the_merge() {
        let talks = vec![talk_by("t1", "Jane Q. Doe", Some("ACME"))];
        let papers = vec![paper_by("p1", "Jane Doe", None)];
        let index = PersonIndex::build(&talks, &papers);
        assert_eq!(index.all().len(), 1);
    }

    #[test]
    fn merge_is_idempotent() {
        let talks = vec![
            talk_by("t1", "Jane Q. Doe", Some("ACME")),
            talk_by("t2", "Jane Doe", Some("ACME")),
            talk_by("t3", "Jane Quinn Doe", Some("ACME")),
        ];
        let index = PersonIndex::build(&talks, &[]);
        assert_eq!(index.all().len(), 1);

        // A second merge pass over the already-merged group finds nothing.
        let person = &index.all()[0];
        let group: Vec<(String, Bucket)> = vec![(base_key(&person.name), Bucket::default())];
        assert_eq!(merge_group(group).len(), 1);
    }

    #[test]
    fn lookup_resolves_unseen_variant_spellings() {
        let talks = vec![
            talk_by("t1", "Jane Doe", Some("ACME")),
            talk_by("t2", "Jane Doe", Some("ACME")),
        ];
        let index = PersonIndex::build(&talks, &[]);
        let found = index.lookup_by_name("Jane Q. Doe").unwrap();
        assert_eq!(found.name, "Jane Doe");
        assert!(index.lookup_by_name("John Doe").is_none());
    }

    #[test]
    fn all_is_sorted_by_total_count_then_name() {
        let talks = vec![
            talk_by("t1", "Alice Smith", None),
            talk_by("t2", "Alice Smith", None),
            talk_by("t3", "Bob Jones", None),
            talk_by("t4", "Aaron Jones", None),
        ];
        let index = PersonIndex::build(&talks, &[]);
        let names: Vec<&str> = index.all().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice Smith", "Aaron Jones", "Bob Jones"]);
    }

    #[test]
    fn display_name_prefers_frequent_compact_spellings() {
        let talks = vec![
            talk_by("t1", "Jane Doe", Some("ACME")),
            talk_by("t2", "Jane Doe", Some("ACME")),
            talk_by("t3", "Jane Q. Doe", Some("ACME")),
        ];
        let index = PersonIndex::build(&talks, &[]);
        assert_eq!(index.all()[0].name, "Jane Doe");
        assert_eq!(index.all()[0].variant_names, vec!["Jane Doe", "Jane Q. Doe"]);
    }
}
