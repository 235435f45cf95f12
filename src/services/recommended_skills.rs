// src/services/recommended_skills.rs
//! Skills mined from web search snippets about similar roles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::common::helpers::truncate_chars;
use crate::services::keyword_extractor::contains_term;
use crate::services::tavily::WebResult;

pub const SKILL_CANDIDATES: &[&str] = &[
    "python", "java", "javascript", "typescript", "go", "rust", "c++", "c#", "sql", "nosql",
    "postgres", "mysql", "mongodb", "redis", "aws", "gcp", "azure", "docker", "kubernetes",
    "terraform", "ci/cd", "react", "vue", "angular", "node", "django", "flask", "fastapi",
    "spring", "pandas", "numpy", "pytorch", "tensorflow", "scikit-learn", "llm", "nlp",
    "graphql", "rest", "microservices", "event-driven", "kafka",
];

const SNIPPET_LIMIT: usize = 300;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillSource {
    pub skill: String,
    pub url: String,
    pub snippet: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecommendedSkillsBundle {
    /// Sorted, unique
    pub skills: Vec<String>,
    /// First piece of evidence seen for each skill
    pub sources: Vec<SkillSource>,
}

/// Candidate skills mentioned in `text`, in candidate-list order
pub fn skills_in_text(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    SKILL_CANDIDATES
        .iter()
        .copied()
        .filter(|skill| contains_term(&lowered, skill))
        .collect()
}

pub fn aggregate_skills_from_web(results: &[WebResult]) -> RecommendedSkillsBundle {
    let mut seen = BTreeSet::new();
    let mut sources = Vec::new();

    for item in results {
        let haystack = format!("{} {}", item.title, item.snippet);
        for skill in skills_in_text(&haystack) {
            if seen.insert(skill) {
                sources.push(SkillSource {
                    skill: skill.to_string(),
                    url: item.url.clone(),
                    snippet: Some(truncate_chars(&item.snippet, SNIPPET_LIMIT)),
                    source: Some(if item.source.is_empty() {
                        "web".to_string()
                    } else {
                        item.source.clone()
                    }),
                });
            }
        }
    }

    RecommendedSkillsBundle {
        skills: seen.into_iter().map(str::to_string).collect(),
        sources,
    }
}
