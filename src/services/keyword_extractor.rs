// src/services/keyword_extractor.rs
//! Keyword and skill extraction for job descriptions.
//!
//! Matching is dictionary based. A term matches when it is not glued to
//! another word character on either side, so `sql` matches in "sql, python"
//! but not in "nosql".

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const MAX_KEYWORDS: usize = 50;

const PROGRAMMING_LANGUAGES: &[&str] = &[
    "python", "java", "javascript", "typescript", "c++", "c#", "go", "rust", "php", "ruby",
    "swift", "kotlin", "scala", "r", "matlab", "sql",
];

const FRAMEWORKS: &[&str] = &[
    "react", "angular", "vue", "django", "flask", "spring", "express", "laravel", "rails",
    "asp.net", "tensorflow", "pytorch", "scikit-learn",
];

const DATABASES: &[&str] = &[
    "mysql", "postgresql", "mongodb", "redis", "elasticsearch", "sqlite", "oracle",
    "sql server", "cassandra", "dynamodb",
];

const CLOUD_PLATFORMS: &[&str] = &[
    "aws", "azure", "gcp", "google cloud", "docker", "kubernetes", "terraform", "jenkins",
    "gitlab", "github actions",
];

const TOOLS: &[&str] = &[
    "git", "jira", "confluence", "slack", "figma", "sketch", "photoshop", "illustrator",
    "tableau", "power bi", "excel", "powerpoint",
];

const SOFT_SKILLS: &[&str] = &[
    "leadership", "communication", "teamwork", "problem solving", "analytical", "creative",
    "detail oriented", "organized", "time management", "adaptable", "collaborative",
    "innovative", "strategic thinking", "customer focused",
];

const BUSINESS_TERMS: &[&str] = &[
    "agile", "scrum", "kanban", "devops", "ci/cd", "microservices", "api", "rest", "graphql",
    "machine learning", "artificial intelligence", "data science", "big data", "analytics",
    "business intelligence", "cybersecurity", "blockchain", "iot", "mobile development",
    "web development", "full stack", "frontend", "backend", "ui/ux",
];

const CERTIFICATION_TERMS: &[&str] = &[
    "certification", "certified", "license", "licensed", "aws certified",
    "microsoft certified", "google certified", "cisco certified", "pmp", "cissp", "cisa",
    "cism",
];

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "up", "about", "into", "through", "during", "before", "after", "above", "below",
    "between", "among", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "do", "does", "did", "will", "would", "could", "should", "may", "might", "must",
    "can",
];

/// Keywords grouped by where they came from
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SkillsByCategory {
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub domain_keywords: Vec<String>,
    pub requirements: Vec<String>,
}

/// Lowercases, strips punctuation other than `-+#.()/` and collapses
/// whitespace. `/` stays so slash terms such as `ci/cd` and `ui/ux` can match.
pub fn clean_text(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() || "-+#.()/".contains(c) {
                c
            } else {
                ' '
            }
        })
        .collect();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Counts standalone occurrences of `term` in already-lowercased `text`
pub fn count_term(text: &str, term: &str) -> usize {
    if term.is_empty() {
        return 0;
    }

    text.match_indices(term)
        .filter(|(idx, _)| {
            let before_ok = text[..*idx]
                .chars()
                .next_back()
                .map(|c| !is_word_char(c))
                .unwrap_or(true);
            let after_ok = text[idx + term.len()..]
                .chars()
                .next()
                .map(|c| !is_word_char(c))
                .unwrap_or(true);
            before_ok && after_ok
        })
        .count()
}

pub fn contains_term(text: &str, term: &str) -> bool {
    count_term(text, term) > 0
}

/// Capitalises the first letter of every alphabetic run
fn title_case(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    let mut prev_alpha = false;
    for c in term.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Display casing for a dictionary term
pub fn display_case(term: &str) -> String {
    match term {
        "c++" => "C++".to_string(),
        "c#" => "C#".to_string(),
        "ui/ux" => "UI/UX".to_string(),
        "aws" | "gcp" | "sql" | "api" | "rest" | "ci/cd" | "iot" | "ui" | "ux" | "pmp"
        | "cissp" | "cisa" | "cism" => term.to_uppercase(),
        "javascript" => "JavaScript".to_string(),
        "typescript" => "TypeScript".to_string(),
        _ => title_case(term),
    }
}

fn dictionary_matches(text: &str, terms: &[&str]) -> Vec<String> {
    terms
        .iter()
        .filter(|term| contains_term(text, term))
        .map(|term| display_case(term))
        .collect()
}

fn technical_skills(text: &str) -> Vec<String> {
    [PROGRAMMING_LANGUAGES, FRAMEWORKS, DATABASES, CLOUD_PLATFORMS, TOOLS]
        .iter()
        .flat_map(|terms| dictionary_matches(text, terms))
        .collect()
}

fn experience_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(\d+)\+?\s*years?\s+(?:of\s+)?experience",
            r"(\d+)\+?\s*years?\s+(?:in|with)\b",
            r"minimum\s+(?:of\s+)?(\d+)\s+years?",
            r"at least\s+(\d+)\s+years?",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn degree_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\b(bachelor|master|phd|doctorate)(?:\s?s)?\s+(?:degree\s+)?(?:in\s+)?(\w+)",
            r"\b(bs|ms|ba|ma)\s+(?:in\s+)?(\w+)",
            r"\b(computer science|engineering|mathematics|statistics)\b",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn requirement_keywords(text: &str) -> Vec<String> {
    let mut found = Vec::new();

    for pattern in experience_patterns() {
        for caps in pattern.captures_iter(text) {
            if let Some(years) = caps.get(1) {
                found.push(format!("{}+ years experience", years.as_str()));
            }
        }
    }

    for pattern in degree_patterns() {
        for caps in pattern.captures_iter(text) {
            let parts: Vec<&str> = caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty() && *s != "degree" && !is_stop_word(s))
                .collect();
            if !parts.is_empty() {
                found.push(title_case(&parts.join(" ")));
            }
        }
    }

    found.extend(dictionary_matches(text, CERTIFICATION_TERMS));
    found
}

/// Drops stop words and case-insensitive repeats, keeping first-seen order
fn dedupe_case_insensitive(items: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|k| {
            let key = k.to_lowercase();
            !is_stop_word(&key) && seen.insert(key)
        })
        .take(limit)
        .collect()
}

/// Ordered, de-duplicated keywords (technical, soft, domain, requirements)
pub fn extract_keywords(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let by_category = extract_skills_by_category(text);
    let all: Vec<String> = by_category
        .technical_skills
        .into_iter()
        .chain(by_category.soft_skills)
        .chain(by_category.domain_keywords)
        .chain(by_category.requirements)
        .collect();

    dedupe_case_insensitive(all, MAX_KEYWORDS)
}

pub fn extract_skills_by_category(text: &str) -> SkillsByCategory {
    let cleaned = clean_text(text);
    SkillsByCategory {
        technical_skills: technical_skills(&cleaned),
        soft_skills: dictionary_matches(&cleaned, SOFT_SKILLS),
        domain_keywords: dictionary_matches(&cleaned, BUSINESS_TERMS),
        requirements: dedupe_case_insensitive(requirement_keywords(&cleaned), MAX_KEYWORDS),
    }
}

/// Occurrence count of each extracted keyword, most frequent first
pub fn keyword_frequency(text: &str) -> Vec<(String, usize)> {
    let cleaned = clean_text(text);
    let mut counts: Vec<(String, usize)> = extract_keywords(text)
        .into_iter()
        .map(|k| {
            let count = count_term(&cleaned, &k.to_lowercase());
            (k, count)
        })
        .collect();

    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}
