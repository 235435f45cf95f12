// src/services/resume_content.rs
//! Structured resume content for HTML previews and the page template that
//! renders it.

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::common::helpers::{escape_html, truncate_chars};
use crate::services::cover_letters::extract_name;
use crate::services::openai::{
    extract_json_object, CompletionOptions, OpenAIService, TextGenerationPurpose,
};
use crate::services::resume_processor::extract_contact_info;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContactDetails {
    pub name: String,
    pub location: String,
    pub email: String,
    pub phone: String,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EducationEntry {
    pub dates: String,
    pub institution: String,
    pub degree: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExperienceEntry {
    pub dates: String,
    pub job_title: String,
    pub company: String,
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LeadershipEntry {
    pub dates: String,
    pub role: String,
    pub organization: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectEntry {
    pub title: String,
    pub link: Option<String>,
    pub descriptions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CertificationEntry {
    pub date: String,
    pub title: String,
    pub issuer: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResumeData {
    pub contact_info: ContactDetails,
    pub about_me: String,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub leadership: Vec<LeadershipEntry>,
    pub projects: Vec<ProjectEntry>,
    pub languages: String,
    pub skills: String,
    pub volunteering: String,
    pub certifications: Vec<CertificationEntry>,
    pub interests: String,
}

const SYSTEM_PROMPT: &str = "You are an expert resume writer. Generate resume content tailored to the job description \
using the existing resume information. Use professional language and action verbs, keep descriptions concise, \
stay ATS-friendly, and do not use emojis. Respond with one JSON object with the keys: \
contact_info {name, location, email, phone, website, linkedin, github}, about_me (string), \
education [{dates, institution, degree, highlights[]}], experience [{dates, job_title, company, responsibilities[]}], \
leadership [{dates, role, organization}], projects [{title, link, descriptions[]}], languages (string), \
skills (string), volunteering (string), certifications [{date, title, issuer, link}], interests (string).";

#[derive(Clone)]
pub struct ResumeContentGenerator {
    openai: Arc<OpenAIService>,
}

impl ResumeContentGenerator {
    pub fn new(openai: Arc<OpenAIService>) -> Self {
        Self { openai }
    }

    /// Model-generated content, or a placeholder structure seeded with any
    /// contact details found in `existing_text`
    pub async fn generate_resume_content(&self, job_description: &str, existing_text: &str) -> ResumeData {
        if !self.openai.is_configured().await {
            return fallback_resume_data(existing_text);
        }

        let user_prompt = format!(
            "Job Description:\n{}\n\nExisting Resume Content:\n{}\n\n\
             Generate a complete resume structure tailored to this job. Enhance the existing content \
             where provided and do not invent employers, degrees or dates.",
            truncate_chars(job_description, 6000),
            truncate_chars(existing_text, 8000),
        );
        let options = CompletionOptions {
            temperature: 0.7,
            max_tokens: 3000,
            json_output: true,
        };

        let raw = match self
            .openai
            .complete(TextGenerationPurpose::ResumeContent, SYSTEM_PROMPT, &user_prompt, options)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Resume content generation failed, using placeholders");
                return fallback_resume_data(existing_text);
            }
        };

        match extract_json_object(&raw).and_then(|v| serde_json::from_value::<ResumeData>(v).ok()) {
            Some(data) => {
                info!(
                    experience = data.experience.len(),
                    education = data.education.len(),
                    "Resume content generated"
                );
                data
            }
            None => {
                warn!("Resume content response was not valid JSON, using placeholders");
                fallback_resume_data(existing_text)
            }
        }
    }
}

fn placeholder(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn fallback_resume_data(existing_text: &str) -> ResumeData {
    let contact = extract_contact_info(existing_text);

    ResumeData {
        contact_info: ContactDetails {
            name: placeholder(extract_name(existing_text), "[Your Name]"),
            location: "[Location]".to_string(),
            email: placeholder(contact.email, "[email@example.com]"),
            phone: placeholder(contact.phone, "[+1234567890]"),
            website: Some("[website-url]".to_string()),
            linkedin: Some(placeholder(contact.linkedin, "[linkedin-url]")),
            github: Some(placeholder(contact.github, "[github-url]")),
        },
        about_me: "[Your about me description]".to_string(),
        education: vec![EducationEntry {
            dates: "[Dates]".to_string(),
            institution: "[Institution]".to_string(),
            degree: "[Degree]".to_string(),
            highlights: vec!["[Highlight 1]".to_string(), "[Highlight 2]".to_string()],
        }],
        experience: vec![ExperienceEntry {
            dates: "[Dates]".to_string(),
            job_title: "[Job Title]".to_string(),
            company: "[Company]".to_string(),
            responsibilities: vec![
                "[Responsibility 1]".to_string(),
                "[Responsibility 2]".to_string(),
            ],
        }],
        leadership: Vec::new(),
        projects: Vec::new(),
        languages: "[Language details]".to_string(),
        skills: "[Skill details]".to_string(),
        volunteering: "[Volunteering details]".to_string(),
        certifications: Vec::new(),
        interests: "[Interests details]".to_string(),
    }
}

// =============================================================================
// HTML rendering
// =============================================================================

const TEMPLATE_STYLE: &str = r#"
.page{background:#fff;border:1px solid #d1d5db;box-shadow:0 2px 8px rgba(0,0,0,0.08);border-radius:6px;padding:32px}
body{font-family:Arial,sans-serif;max-width:800px;margin:0 auto;padding:20px;line-height:1.6;color:#333}
.header{text-align:center;margin-bottom:20px}
.header h1{font-size:2em;margin:0;color:#2c3e50}
.header .contact-info{margin-top:10px}
.header .contact-info span{margin-right:15px}
h2{font-size:1.5em;padding-bottom:0.2em;margin-top:1.5em;margin-bottom:0.5em;color:#2c3e50}
.section-content{margin-left:20px;padding:1em 0;margin-bottom:1em}
.twocolentry{display:flex;justify-content:space-between;margin-bottom:10px}
.twocolentry .left{font-weight:bold}
.twocolentry .right{text-align:right}
ul{list-style-type:disc;margin-left:2em;margin-bottom:1em}
li{margin-bottom:0.5em}
a{color:#3498db;text-decoration:none}
.highlights{margin-left:20px}
.footer{text-align:right;font-size:0.8em;color:#7f8c8d;margin-top:20px}
"#;

fn two_col(left: &str, right: &str) -> String {
    format!(
        "<div class=\"twocolentry\"><div class=\"left\">{}</div><div class=\"right\">{}</div></div>",
        left, right
    )
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let lis: String = items
        .iter()
        .map(|i| format!("<li>{}</li>", escape_html(i)))
        .collect();
    format!(
        "<div class=\"onecolentry\"><div class=\"highlights\"><ul>{}</ul></div></div>",
        lis
    )
}

fn link(href: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape_html(href), escape_html(text))
}

fn one_col(text: &str) -> String {
    format!("<div class=\"onecolentry\">{}</div>", escape_html(text))
}

fn section(title: &str, body: &str) -> String {
    format!(
        "<h2>{}</h2><div class=\"section-content\">{}</div>",
        escape_html(title),
        body
    )
}

/// Full resume page. `None` renders every section with placeholders.
pub fn build_resume_html_template(data: Option<&ResumeData>) -> String {
    let owned_placeholder;
    let data = match data {
        Some(d) => d,
        None => {
            owned_placeholder = fallback_resume_data("");
            &owned_placeholder
        }
    };
    let c = &data.contact_info;

    let education: String = data
        .education
        .iter()
        .map(|e| {
            two_col(
                &escape_html(&e.dates),
                &escape_html(&format!("{} & {}", e.institution, e.degree)),
            ) + &bullet_list(&e.highlights)
        })
        .collect();

    let experience: String = data
        .experience
        .iter()
        .map(|e| {
            two_col(
                &escape_html(&e.dates),
                &escape_html(&format!("{} & {}", e.job_title, e.company)),
            ) + &bullet_list(&e.responsibilities)
        })
        .collect();

    let leadership: String = data
        .leadership
        .iter()
        .map(|l| {
            two_col(
                &escape_html(&l.dates),
                &escape_html(&format!("{} & {}", l.role, l.organization)),
            )
        })
        .collect();

    let projects: String = data
        .projects
        .iter()
        .map(|p| {
            let left = match &p.link {
                Some(href) if !href.trim().is_empty() => link(href, &p.title),
                _ => escape_html(&p.title),
            };
            two_col(&left, &escape_html(&p.title)) + &bullet_list(&p.descriptions)
        })
        .collect();

    let certifications: String = data
        .certifications
        .iter()
        .map(|cert| {
            let left = match &cert.link {
                Some(href) if !href.trim().is_empty() => link(href, &cert.date),
                _ => escape_html(&cert.date),
            };
            two_col(&left, &escape_html(&format!("{} & {}", cert.title, cert.issuer)))
        })
        .collect();

    let optional_link = |value: &Option<String>, default: &str, label: &str| {
        let href = value.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or(default);
        format!("<span>{}</span>", link(href, label))
    };

    let header = format!(
        "<div class=\"header\"><h1>{}</h1><div class=\"contact-info\">\
         <span>{}</span><span>{}</span><span>{}</span>{}{}{}</div></div>",
        escape_html(&c.name),
        escape_html(&c.location),
        link(&format!("mailto:{}", c.email), &c.email),
        link(&format!("tel:{}", c.phone), &c.phone),
        optional_link(&c.website, "[website-url]", "Website"),
        optional_link(&c.linkedin, "[linkedin-url]", "LinkedIn"),
        optional_link(&c.github, "[github-url]", "GitHub"),
    );

    let sections = [
        section("About Me", &one_col(&data.about_me)),
        section("Education", &education),
        section("Experience", &experience),
        section("Management and Leadership Skills", &leadership),
        section("Projects", &projects),
        section("Languages", &one_col(&data.languages)),
        section("Technologies/Skills", &one_col(&data.skills)),
        section("Volunteering", &one_col(&data.volunteering)),
        section("Certificates and Certifications", &certifications),
        section("Extra-Curricular & Interests", &one_col(&data.interests)),
    ]
    .concat();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>Resume</title>\n<style>{}</style>\n</head>\n<body>\n<div class=\"page\">\n{}\n{}\n\
         <div class=\"footer\">Last updated: {}</div>\n</div>\n</body>\n</html>\n",
        TEMPLATE_STYLE,
        header,
        sections,
        Utc::now().format("%B %Y"),
    )
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap_or_else(|_| unreachable!("static regex")))
}

const ROLE_WORDS: &[&str] = &[
    "engineer",
    "manager",
    "developer",
    "analyst",
    "specialist",
    "coordinator",
    "director",
    "inc",
    "llc",
    "corp",
    "company",
];

fn is_heading(line: &str) -> bool {
    let has_letters = line.chars().any(|c| c.is_alphabetic());
    let all_caps = has_letters && !line.chars().any(|c| c.is_lowercase());
    (all_caps && line.chars().count() > 3) || line.ends_with(':')
}

/// Best-effort formatting of plain resume text
pub fn convert_text_to_html(text: &str) -> String {
    if text.trim().is_empty() {
        return "<p>No content available</p>".to_string();
    }

    let mut parts = Vec::new();
    let mut in_section = false;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let escaped = escape_html(line);

        if is_heading(line) {
            if in_section {
                parts.push("</div>".to_string());
            }
            parts.push(format!(
                "<div class=\"section\"><h2>{}</h2>",
                escape_html(line.trim_end_matches(':'))
            ));
            in_section = true;
        } else if line.contains('@') || line.chars().any(|c| c.is_ascii_digit()) {
            if year_regex().is_match(line) && !line.contains('@') {
                parts.push(format!("<p class=\"dates\">{}</p>", escaped));
            } else {
                parts.push(format!("<p class=\"contact\">{}</p>", escaped));
            }
        } else {
            let lowered = line.to_lowercase();
            if ROLE_WORDS.iter().any(|w| lowered.contains(w)) {
                parts.push(format!("<h3>{}</h3>", escaped));
            } else {
                parts.push(format!("<p>{}</p>", escaped));
            }
        }
    }

    if in_section {
        parts.push("</div>".to_string());
    }

    format!("<div class=\"resume\">{}</div>", parts.concat())
}

/// Wraps a fragment from [`convert_text_to_html`] in a standalone page
pub fn wrap_html_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<div class=\"page\">{}</div>\n</body>\n</html>\n",
        escape_html(title),
        TEMPLATE_STYLE,
        body
    )
}
