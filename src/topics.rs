//! # Topic Canonicalization Module
//!
//! ## Purpose
//! Maps free-form tags, extracted keywords, and text mentions onto a fixed
//! canonical topic vocabulary so that topic facets and filter chips are
//! computed against a stable, small label set rather than the open tag space.
//!
//! ## Input/Output Specification
//! - **Input**: Raw tag/keyword strings, record title+abstract+venue text
//! - **Output**: Ordered lists of canonical topic labels
//! - **Guarantee**: `canonicalize(canonicalize(x)) == canonicalize(x)`
//!
//! ## Key Features
//! - Closed canonical set plus an alias table, both known at build time
//! - Ordered regex detection rules against record text
//! - Per-record memoization of detected topics

use crate::errors::{Result, SearchError};
use crate::{Paper, Talk};
use parking_lot::RwLock;
use regex::Regex;
use std::collections::HashMap;

/// The closed canonical topic vocabulary, in editorial display order
pub const CANONICAL_TOPICS: [&str; 55] = [
    "LLVM",
    "Clang",
    "ClangIR",
    "MLIR",
    "LLD",
    "LLDB",
    "Flang",
    "CIRCT",
    "Polly",
    "C Libs",
    "C++ Libs",
    "C",
    "C++",
    "Rust",
    "Fortran",
    "Swift",
    "Julia",
    "Python",
    "OpenMP",
    "OpenCL",
    "OpenACC",
    "CUDA",
    "HIP",
    "SYCL",
    "GPU",
    "JIT",
    "IR",
    "PGO",
    "LTO",
    "Autovectorization",
    "Loop transformations",
    "Register Allocation",
    "Instruction Selection",
    "Backend",
    "Frontend",
    "Static Analysis",
    "Dynamic Analysis",
    "Testing",
    "Security",
    "Debug Information",
    "Infrastructure",
    "Optimizations",
    "Programming Languages",
    "AI",
    "ML",
    "Embedded",
    "HPC",
    "WebAssembly",
    "RISC-V",
    "Quantum Computing",
    "Performance",
    "Tooling",
    "Code Size",
    "Education",
    "Community",
];

/// Alias table: normalized key → canonical topic
const TOPIC_ALIASES: [(&str, &str); 34] = [
    ("llvmir", "IR"),
    ("intermediaterepresentation", "IR"),
    ("intermediaterepresentations", "IR"),
    ("justintime", "JIT"),
    ("jitcompilation", "JIT"),
    ("profileguidedoptimization", "PGO"),
    ("linktimeoptimization", "LTO"),
    ("vectorization", "Autovectorization"),
    ("vectorisation", "Autovectorization"),
    ("autovectorisation", "Autovectorization"),
    ("simd", "Autovectorization"),
    ("looptransformation", "Loop transformations"),
    ("loopoptimization", "Loop transformations"),
    ("loopoptimizations", "Loop transformations"),
    ("codegeneration", "Backend"),
    ("codegen", "Backend"),
    ("machinelearning", "ML"),
    ("deeplearning", "ML"),
    ("artificialintelligence", "AI"),
    ("wasm", "WebAssembly"),
    ("riscv", "RISC-V"),
    ("gpgpu", "GPU"),
    ("staticanalyzer", "Static Analysis"),
    ("aliasanalysis", "Static Analysis"),
    ("pointeranalysis", "Static Analysis"),
    ("fuzzing", "Testing"),
    ("sanitizers", "Testing"),
    ("memorysafety", "Security"),
    ("cir", "ClangIR"),
    ("libcxx", "C++ Libs"),
    ("libc", "C Libs"),
    ("dwarf", "Debug Information"),
    ("debuginfo", "Debug Information"),
    ("toolchain", "Infrastructure"),
];

/// Ordered text detection rules: pattern → canonical topic
const TOPIC_RULES: [(&str, &str); 33] = [
    (r"\bllvm\b", "LLVM"),
    (r"\bclangir\b", "ClangIR"),
    (r"\bclang\b", "Clang"),
    (r"\bmlir\b|multi[- ]level intermediate representation", "MLIR"),
    (r"\blld\b", "LLD"),
    (r"\blldb\b", "LLDB"),
    (r"\bflang\b", "Flang"),
    (r"\bcirct\b", "CIRCT"),
    (r"\bpolly\b", "Polly"),
    (r"\bopenmp\b", "OpenMP"),
    (r"\bopencl\b", "OpenCL"),
    (r"\bcuda\b", "CUDA"),
    (r"\bgpus?\b|graphics processing units?", "GPU"),
    (r"just[- ]in[- ]time|\bjit\b", "JIT"),
    (r"intermediate representations?|\bllvm ir\b", "IR"),
    (r"profile[- ]guided optimization|\bpgo\b", "PGO"),
    (r"link[- ]time optimization|\blto\b", "LTO"),
    (r"auto[- ]?vectori[sz]ation|\bvectori[sz]ation\b|\bsimd\b", "Autovectorization"),
    (
        r"loop (?:transformations?|optimizations?|unrolling|fusion|tiling|interchange)",
        "Loop transformations",
    ),
    (r"register allocation", "Register Allocation"),
    (r"instruction selection", "Instruction Selection"),
    (r"code generation", "Backend"),
    (
        r"alias analysis|pointer analysis|data ?flow analysis|static analysis|static analyzer",
        "Static Analysis",
    ),
    (r"symbolic execution|dynamic analysis", "Dynamic Analysis"),
    (
        r"fuzz(?:ing|er|ers)|sanitizer|differential testing|mutation testing|race detection",
        "Testing",
    ),
    (r"memory safety|\bsecurity\b|exploit", "Security"),
    (r"debug information|\bdwarf\b", "Debug Information"),
    (r"machine learning|deep learning|neural networks?", "ML"),
    (r"artificial intelligence", "AI"),
    (r"web ?assembly|\bwasm\b", "WebAssembly"),
    (r"risc[- ]v", "RISC-V"),
    (r"quantum (?:computing|compiler|compilation)", "Quantum Computing"),
    (r"\bc\+\+", "C++"),
];

/// Keywords longer than this are never canonicalized (they are prose fragments)
const MAX_KEYWORD_LEN: usize = 48;

/// Canonical topic vocabulary with alias lookup and text detection
pub struct TopicCanonicalizer {
    by_key: HashMap<String, &'static str>,
    rules: Vec<(Regex, &'static str)>,
    cache: RwLock<HashMap<String, Vec<String>>>,
}

impl TopicCanonicalizer {
    /// Build the canonicalizer, compiling the detection rule table
    pub fn new() -> Result<Self> {
        let mut by_key: HashMap<String, &'static str> = HashMap::new();
        for topic in CANONICAL_TOPICS {
            by_key.insert(normalized_key(topic), topic);
        }
        for (alias, topic) in TOPIC_ALIASES {
            by_key.entry(alias.to_string()).or_insert(topic);
        }

        let mut rules = Vec::with_capacity(TOPIC_RULES.len());
        for (pattern, topic) in TOPIC_RULES {
            let re = Regex::new(&format!("(?i){}", pattern)).map_err(|e| SearchError::Internal {
                message: format!("Invalid topic rule for '{}': {}", topic, e),
            })?;
            rules.push((re, topic));
        }

        Ok(Self {
            by_key,
            rules,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Map a raw tag or keyword to its canonical topic, or empty string.
    /// Idempotent: canonical labels map to themselves.
    pub fn canonicalize(&self, raw: &str) -> String {
        let key = normalized_key(raw);
        if key.is_empty() {
            return String::new();
        }
        self.by_key.get(&key).map(|t| t.to_string()).unwrap_or_default()
    }

    /// All canonical topics in display order
    pub fn all_topics(&self) -> &'static [&'static str] {
        &CANONICAL_TOPICS
    }

    /// Ordered canonical topics for a talk, truncated to `limit`
    pub fn topics_for_talk(&self, talk: &Talk, limit: usize) -> Vec<String> {
        let cache_key = format!("t:{}", talk.id);
        let text = format!("{} {}", talk.title, talk.abstract_text);
        let mut topics = self.detect(&cache_key, &talk.tags, &[], &text);
        topics.truncate(limit);
        topics
    }

    /// Ordered canonical topics for a paper, truncated to `limit`
    pub fn topics_for_paper(&self, paper: &Paper, limit: usize) -> Vec<String> {
        let cache_key = format!("p:{}", paper.id);
        let text = format!("{} {} {}", paper.title, paper.abstract_text, paper.venue);
        let mut topics = self.detect(&cache_key, &paper.tags, &paper.keywords, &text);
        topics.truncate(limit);
        topics
    }

    /// Detection pipeline: tags, then keywords, then text rules; deduplicated
    /// by normalized key and memoized per record
    fn detect(&self, cache_key: &str, tags: &[String], keywords: &[String], text: &str) -> Vec<String> {
        if let Some(cached) = self.cache.read().get(cache_key) {
            return cached.clone();
        }

        let mut out: Vec<String> = Vec::new();
        let mut seen: Vec<String> = Vec::new();

        let mut push = |topic: String, out: &mut Vec<String>, seen: &mut Vec<String>| {
            if topic.is_empty() {
                return;
            }
            let key = normalized_key(&topic);
            if !seen.contains(&key) {
                seen.push(key);
                out.push(topic);
            }
        };

        for tag in tags {
            push(self.canonicalize(tag), &mut out, &mut seen);
        }
        for keyword in keywords {
            if keyword.len() <= MAX_KEYWORD_LEN {
                push(self.canonicalize(keyword), &mut out, &mut seen);
            }
        }

        let lowered = text.to_lowercase();
        for (re, topic) in &self.rules {
            if re.is_match(&lowered) {
                push(topic.to_string(), &mut out, &mut seen);
            }
        }

        self.cache.write().insert(cache_key.to_string(), out.clone());
        out
    }
}

/// Collapse a label to lowercase alphanumerics, preserving `+`
pub fn normalized_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '+')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonicalizer() -> TopicCanonicalizer {
        TopicCanonicalizer::new().unwrap()
    }

    fn talk_with(tags: &[&str], title: &str, abstract_text: &str) -> Talk {
        Talk {
            id: "t1".into(),
            title: title.into(),
            abstract_text: abstract_text.into(),
            category: crate::TalkCategory::TechnicalTalk,
            meeting: "2024-us".into(),
            meeting_name: String::new(),
            meeting_location: String::new(),
            meeting_date: String::new(),
            speakers: vec![],
            tags: tags.iter().map(|t| t.to_string()).collect(),
            video_url: String::new(),
            video_id: String::new(),
            slides_url: String::new(),
            project_url: String::new(),
            year: "2024".into(),
        }
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let c = canonicalizer();
        for raw in ["MLIR", "mlir", "vectorization", "SIMD", "c++", "Loop Optimization"] {
            let once = c.canonicalize(raw);
            assert_eq!(c.canonicalize(&once), once, "not idempotent for {}", raw);
        }
    }

    #[test]
    fn aliases_map_to_canonical_labels() {
        let c = canonicalizer();
        assert_eq!(c.canonicalize("SIMD"), "Autovectorization");
        assert_eq!(c.canonicalize("wasm"), "WebAssembly");
        assert_eq!(c.canonicalize("risc-v"), "RISC-V");
        assert_eq!(c.canonicalize("Debug Info"), "Debug Information");
        assert_eq!(c.canonicalize("quantum knitting"), "");
    }

    #[test]
    fn key_preserves_plus() {
        assert_eq!(normalized_key("C++"), "c++");
        assert_eq!(normalized_key("Loop Transformations"), "looptransformations");
    }

    #[test]
    fn tags_come_before_text_detection() {
        let c = canonicalizer();
        let talk = talk_with(&["GPU"], "Improving MLIR lowering", "We discuss mlir and cuda.");
        let topics = c.topics_for_talk(&talk, 10);
        assert_eq!(topics[0], "GPU");
        assert!(topics.contains(&"MLIR".to_string()));
        assert!(topics.contains(&"CUDA".to_string()));
    }

    #[test]
    fn limit_is_a_prefix_of_the_unlimited_list() {
        let c = canonicalizer();
        let talk = talk_with(
            &["MLIR", "GPU"],
            "Vectorization in LLVM with Clang",
            "JIT compilation and loop unrolling for security.",
        );
        let all = c.topics_for_talk(&talk, usize::MAX);
        for n in 0..=all.len() {
            assert_eq!(c.topics_for_talk(&talk, n), all[..n].to_vec());
        }
    }

    #[test]
    fn detection_is_cached_and_stable() {
        let c = canonicalizer();
        let talk = talk_with(&[], "Fuzzing LLVM passes", "");
        let first = c.topics_for_talk(&talk, 10);
        let second = c.topics_for_talk(&talk, 10);
        assert_eq!(first, second);
        assert!(first.contains(&"Testing".to_string()));
    }
}
