// src/services/cover_letters.rs
//! Cover letter generation. Always yields exactly three versions: from the
//! model when it is configured, from a fixed template otherwise.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::common::helpers::truncate_chars;
use crate::services::openai::{
    extract_json_object, CompletionOptions, OpenAIService, TextGenerationPurpose,
};

pub const VERSION_COUNT: usize = 3;
const PROMPT_TEXT_LIMIT: usize = 4000;
const METADATA_LIMIT: usize = 120;

pub const NOTE_NOT_CONFIGURED: &str = "OpenAI not configured; generated fallback templates.";
pub const NOTE_FALLBACK: &str = "OpenAI error; fallback used.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverLetter {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverLetterBundle {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub versions: Vec<CoverLetter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Facts pulled out of the resume and job description before prompting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LetterContext {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
    pub candidate_phone: Option<String>,
}

impl LetterContext {
    pub fn from_texts(resume_text: &str, job_description: &str) -> Self {
        let (job_title, company) = infer_job_metadata(job_description);
        Self {
            job_title,
            company,
            candidate_name: extract_name(resume_text),
            candidate_email: extract_email(resume_text),
            candidate_phone: extract_phone(resume_text),
        }
    }
}

const SYSTEM_PROMPT: &str = "You write ATS-friendly, professional, fully complete cover letters. \
Rules: 1) No placeholders like [Your Name] or [Hiring Manager]. \
2) Include the candidate email and phone if provided. \
3) Address the specific company and job title. \
4) Write distinct versions with different emphasis and tone. \
5) Keep content specific and succinct, no emojis. \
Respond with a JSON object of the form {\"versions\": [{\"title\": string, \"content\": string}]}.";

#[derive(Clone)]
pub struct CoverLetterGenerator {
    openai: Arc<OpenAIService>,
}

impl CoverLetterGenerator {
    pub fn new(openai: Arc<OpenAIService>) -> Self {
        Self { openai }
    }

    pub async fn generate(&self, resume_text: &str, job_description: &str) -> CoverLetterBundle {
        let ctx = LetterContext::from_texts(resume_text, job_description);

        if !self.openai.is_configured().await {
            return fallback_bundle(&ctx, NOTE_NOT_CONFIGURED);
        }

        let user_prompt = build_user_prompt(resume_text, job_description, &ctx);
        let options = CompletionOptions {
            temperature: 0.7,
            max_tokens: 3000,
            json_output: true,
        };

        match self
            .openai
            .complete(
                TextGenerationPurpose::CoverLetters,
                SYSTEM_PROMPT,
                &user_prompt,
                options,
            )
            .await
        {
            Ok(raw) => {
                let parsed = parse_versions(&raw);
                info!(parsed_versions = parsed.len(), "Cover letters generated");
                CoverLetterBundle {
                    job_title: ctx.job_title.clone(),
                    company: ctx.company.clone(),
                    versions: normalize_versions(parsed, &ctx),
                    notes: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Cover letter generation failed, using fallback");
                fallback_bundle(&ctx, NOTE_FALLBACK)
            }
        }
    }
}

fn build_user_prompt(resume_text: &str, job_description: &str, ctx: &LetterContext) -> String {
    let known = |v: &Option<String>| v.clone().unwrap_or_default();
    format!(
        "CANDIDATE RESUME:\n{}\n\nJOB DESCRIPTION:\n{}\n\n\
         Known Job Title: {}\nKnown Company: {}\n\
         Known Candidate Name: {}\nKnown Candidate Email: {}\nKnown Candidate Phone: {}\n\n\
         Produce exactly {} complete cover letter versions. Each must be ready to send, \
         with greeting and closing. Do not invent data not present in the resume; \
         omit unknown items rather than using placeholders.",
        truncate_chars(resume_text, PROMPT_TEXT_LIMIT),
        truncate_chars(job_description, PROMPT_TEXT_LIMIT),
        known(&ctx.job_title),
        known(&ctx.company),
        known(&ctx.candidate_name),
        known(&ctx.candidate_email),
        known(&ctx.candidate_phone),
        VERSION_COUNT,
    )
}

/// Reads `{versions: [{title, content}]}` out of model output; malformed
/// entries are skipped
pub fn parse_versions(raw: &str) -> Vec<CoverLetter> {
    extract_json_object(raw)
        .and_then(|v| v.get("versions").and_then(|a| a.as_array()).cloned())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| serde_json::from_value::<CoverLetter>(v).ok())
        .filter(|l| !l.content.trim().is_empty())
        .collect()
}

/// Truncates to three versions or pads with `(Alt n)` copies of the last one
pub fn normalize_versions(mut versions: Vec<CoverLetter>, ctx: &LetterContext) -> Vec<CoverLetter> {
    versions.truncate(VERSION_COUNT);

    if versions.is_empty() {
        versions.push(CoverLetter {
            title: "Version 1".to_string(),
            content: fallback_template(ctx),
        });
    }

    while versions.len() < VERSION_COUNT {
        let base = versions[versions.len() - 1].clone();
        let idx = versions.len() + 1;
        versions.push(CoverLetter {
            title: format!("{} (Alt {})", base.title, idx),
            content: base.content,
        });
    }

    versions
}

pub fn fallback_bundle(ctx: &LetterContext, note: &str) -> CoverLetterBundle {
    let versions = (1..=VERSION_COUNT)
        .map(|i| CoverLetter {
            title: format!("Version {}", i),
            content: fallback_template(ctx),
        })
        .collect();

    CoverLetterBundle {
        job_title: ctx.job_title.clone(),
        company: ctx.company.clone(),
        versions,
        notes: Some(note.to_string()),
    }
}

pub fn fallback_template(ctx: &LetterContext) -> String {
    let header: Vec<&str> = [&ctx.candidate_email, &ctx.candidate_phone]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .collect();

    let mut letter = String::new();
    if !header.is_empty() {
        letter.push_str(&header.join(" | "));
        letter.push_str("\n\n");
    }

    letter.push_str(&format!(
        "Dear Hiring Manager,\n\n\
         I am excited to apply for the {} at {}. \
         My background aligns with your needs, and I bring strong impact as evidenced in my resume. \
         I look forward to the opportunity to contribute to your team.\n\n\
         Sincerely,\n{}",
        ctx.job_title.as_deref().unwrap_or("position"),
        ctx.company.as_deref().unwrap_or("your company"),
        ctx.candidate_name.as_deref().unwrap_or_default(),
    ));

    letter
}

struct Patterns {
    email: Regex,
    phone: Regex,
    title_line: Regex,
    company_line: Regex,
    title_at_company: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let build = |p: &str| Regex::new(p).unwrap_or_else(|_| unreachable!("static regex"));
        Patterns {
            email: build(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
            phone: build(r"\+?\d[\d\s().-]{7,}\d"),
            title_line: build(r"(?im)^\s*(?:job\s+)?title\s*:\s*(.+)$"),
            company_line: build(r"(?im)^\s*company\s*:\s*(.+)$"),
            title_at_company: build(
                r"(?m)^\s*((?:Senior|Lead|Principal|Staff|Junior)?\s*[A-Z][A-Za-z/\- ]{2,60}?)\s+at\s+([A-Z][A-Za-z0-9&.,\- ]{1,60})",
            ),
        }
    })
}

fn clip_metadata(value: &str) -> Option<String> {
    let cleaned = value.trim().trim_end_matches('.').trim();
    (!cleaned.is_empty()).then(|| truncate_chars(cleaned, METADATA_LIMIT))
}

/// Job title and company from `Title:` / `Company:` lines, or a
/// `<title> at <Company>` line
pub fn infer_job_metadata(job_description: &str) -> (Option<String>, Option<String>) {
    let p = patterns();

    let mut title = p
        .title_line
        .captures(job_description)
        .and_then(|c| c.get(1))
        .and_then(|m| clip_metadata(m.as_str()));
    let mut company = p
        .company_line
        .captures(job_description)
        .and_then(|c| c.get(1))
        .and_then(|m| clip_metadata(m.as_str()));

    if title.is_none() || company.is_none() {
        if let Some(caps) = p.title_at_company.captures(job_description) {
            if title.is_none() {
                title = caps.get(1).and_then(|m| clip_metadata(m.as_str()));
            }
            if company.is_none() {
                company = caps.get(2).and_then(|m| clip_metadata(m.as_str()));
            }
        }
    }

    (title, company)
}

pub fn extract_email(resume_text: &str) -> Option<String> {
    patterns()
        .email
        .find(resume_text)
        .map(|m| m.as_str().to_string())
}

pub fn extract_phone(resume_text: &str) -> Option<String> {
    patterns()
        .phone
        .find(resume_text)
        .map(|m| m.as_str().trim().to_string())
}

/// First short line near the top that is not contact information
pub fn extract_name(resume_text: &str) -> Option<String> {
    const CONTACT_LABELS: &[&str] = &["email", "phone", "tel", "mobile"];
    let p = patterns();

    resume_text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(10)
        .find(|line| {
            let lowered = line.to_lowercase();
            line.chars().count() <= 80
                && !line.contains('@')
                && !p.phone.is_match(line)
                && !CONTACT_LABELS.iter().any(|label| lowered.starts_with(label))
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    const RESUME: &str = "\n  Jane Doe  \njane@example.com\n+1 (555) 123-4567\n\nEXPERIENCE\nEngineer";

    #[test]
    fn test_extract_contact_fields() {
        assert_eq!(extract_email(RESUME).as_deref(), Some("jane@example.com"));
        assert_eq!(extract_phone(RESUME).as_deref(), Some("+1 (555) 123-4567"));
        assert_eq!(extract_name(RESUME).as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_extract_name_skips_contact_lines() {
        let text = "Email: a@b.co\nPhone 555 123 4567\nJohn Smith";
        assert_eq!(extract_name(text).as_deref(), Some("John Smith"));
        assert_eq!(extract_name(""), None);
    }

    #[test]
    fn test_infer_from_labelled_lines() {
        let jd = "Title: Backend Engineer\nCompany: Acme Corp.\nWe build things.";
        let (title, company) = infer_job_metadata(jd);
        assert_eq!(title.as_deref(), Some("Backend Engineer"));
        assert_eq!(company.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn test_infer_from_title_at_company() {
        let jd = "Senior Data Engineer at Globex\nResponsibilities include pipelines.";
        let (title, company) = infer_job_metadata(jd);
        assert_eq!(title.as_deref(), Some("Senior Data Engineer"));
        assert_eq!(company.as_deref(), Some("Globex"));
    }

    #[test]
    fn test_fallback_template_has_header_and_defaults() {
        let ctx = LetterContext::from_texts(RESUME, "no structure here");
        let letter = fallback_template(&ctx);
        assert!(letter.starts_with("jane@example.com | +1 (555) 123-4567\n\n"));
        assert!(letter.contains("Dear Hiring Manager,"));
        assert!(letter.ends_with("Sincerely,\nJane Doe"));

        let empty = fallback_template(&LetterContext::default());
        assert!(empty.starts_with("Dear Hiring Manager,"));
        assert!(empty.contains("the position at your company"));
    }

    #[test]
    fn test_parse_versions_tolerates_noise() {
        let raw = "Here you go:\n```json\n{\"versions\": [{\"title\": \"Bold\", \"content\": \"Hi\"}, {\"title\": \"bad\"}]}\n```";
        let versions = parse_versions(raw);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].title, "Bold");
        assert!(parse_versions("not json").is_empty());
    }

    #[test]
    fn test_normalize_pads_and_truncates() {
        let ctx = LetterContext::default();
        let one = vec![CoverLetter {
            title: "Warm".into(),
            content: "Body".into(),
        }];
        let padded = normalize_versions(one, &ctx);
        assert_eq!(padded.len(), 3);
        assert_eq!(padded[1].title, "Warm (Alt 2)");
        assert_eq!(padded[2].title, "Warm (Alt 2) (Alt 3)");
        assert_eq!(padded[2].content, "Body");

        let many = (0..5)
            .map(|i| CoverLetter {
                title: format!("V{}", i),
                content: "x".into(),
            })
            .collect();
        assert_eq!(normalize_versions(many, &ctx).len(), 3);

        let from_nothing = normalize_versions(Vec::new(), &ctx);
        assert_eq!(from_nothing[0].title, "Version 1");
        assert_eq!(from_nothing.len(), 3);
    }

    #[tokio::test]
    async fn test_generate_without_openai_uses_templates() {
        if test_support::openai_env_configured() {
            return;
        }
        let (_pool, openai) = test_support::unconfigured_openai().await;
        let generator = CoverLetterGenerator::new(openai);

        let bundle = generator
            .generate(RESUME, "Title: Platform Engineer\nCompany: Initech")
            .await;
        assert_eq!(bundle.versions.len(), 3);
        assert_eq!(bundle.versions[2].title, "Version 3");
        assert_eq!(bundle.job_title.as_deref(), Some("Platform Engineer"));
        assert_eq!(bundle.notes.as_deref(), Some(NOTE_NOT_CONFIGURED));
    }
}
