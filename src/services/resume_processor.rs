// src/services/resume_processor.rs
//! Resume document parsing: text extraction by file type, cleanup,
//! content sanity checks and contact detection.

use regex::Regex;
use serde::Serialize;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not extract text from PDF file: {0}")]
    Pdf(String),

    #[error("Could not extract text from DOCX file: {0}")]
    Docx(String),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
}

impl DocumentKind {
    /// Resolves the kind from a file name's extension (case-insensitive)
    pub fn from_filename(filename: &str) -> Result<Self, DocumentError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "txt" => Ok(DocumentKind::Txt),
            other => Err(DocumentError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::Txt => "txt",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContentValidation {
    pub is_valid: bool,
    pub word_count: usize,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

/// Extracts and cleans text from an in-memory document
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String, DocumentError> {
    let raw = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| DocumentError::Pdf(e.to_string()))?,
        DocumentKind::Docx => extract_docx_text(bytes)?,
        DocumentKind::Txt => decode_text(bytes),
    };

    debug!(kind = kind.as_str(), raw_len = raw.len(), "Extracted document text");
    Ok(clean_text(&raw))
}

/// Runs [`extract_text`] on the blocking pool
pub async fn extract_text_async(bytes: Vec<u8>, kind: DocumentKind) -> Result<String, DocumentError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, kind))
        .await
        .map_err(|e| DocumentError::Task(e.to_string()))?
}

/// UTF-8 with a Latin-1 fallback
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn docx_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|</w:p>|<w:tab/>|<w:br/>|</w:tc>")
            .unwrap_or_else(|_| unreachable!("static regex"))
    })
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Joins the text runs of `word/document.xml`, breaking lines at paragraphs
fn extract_docx_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| DocumentError::Docx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| DocumentError::Docx(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| DocumentError::Docx(e.to_string()))?;

    let mut text = String::new();
    for caps in docx_token_regex().captures_iter(&xml) {
        match caps.get(1) {
            Some(run) => text.push_str(&unescape_xml(run.as_str())),
            None => match caps.get(0).map(|m| m.as_str()) {
                Some("</w:p>") | Some("<w:br/>") => text.push('\n'),
                Some("<w:tab/>") | Some("</w:tc>") => text.push(' '),
                _ => {}
            },
        }
    }

    Ok(text)
}

/// Normalises line endings and whitespace, dropping control characters
pub fn clean_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = 0;
    for line in normalized.lines() {
        let collapsed = line
            .chars()
            .filter(|c| !c.is_control() || *c == '\t')
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        if collapsed.is_empty() {
            blank_run += 1;
            if blank_run == 1 && !lines.is_empty() {
                lines.push(String::new());
            }
        } else {
            blank_run = 0;
            lines.push(collapsed);
        }
    }

    lines.join("\n").trim().to_string()
}

fn phone_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b",
            r"\(\d{3}\)\s*\d{3}[-.\s]?\d{4}",
            r"\+\d{1,3}[-.\s]?\d{3}[-.\s]?\d{3}[-.\s]?\d{4}",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn contact_regexes() -> &'static (Regex, Regex, Regex) {
    static RE: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    RE.get_or_init(|| {
        let build = |p: &str| Regex::new(p).unwrap_or_else(|_| unreachable!("static regex"));
        (
            build(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
            build(r"linkedin\.com/in/[\w-]+"),
            build(r"github\.com/[\w-]+"),
        )
    })
}

fn date_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\b\d{4}\b",
            r"\b\d{1,2}/\d{4}\b",
            r"\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{4}\b",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

pub fn extract_contact_info(text: &str) -> ContactInfo {
    let (email_re, linkedin_re, github_re) = contact_regexes();
    let lowered = text.to_lowercase();

    ContactInfo {
        email: email_re.find(text).map(|m| m.as_str().to_string()),
        phone: phone_patterns()
            .iter()
            .find_map(|re| re.find(text))
            .map(|m| m.as_str().to_string()),
        linkedin: linkedin_re.find(&lowered).map(|m| m.as_str().to_string()),
        github: github_re.find(&lowered).map(|m| m.as_str().to_string()),
    }
}

const RESUME_SECTIONS: &[&str] = &[
    "experience",
    "education",
    "skills",
    "work",
    "employment",
    "projects",
    "summary",
    "certifications",
];

/// Heuristic check that the text reads like a resume
pub fn validate_resume_content(text: &str) -> ContentValidation {
    let lowered = text.to_lowercase();
    let word_count = text.split_whitespace().count();
    let mut warnings = Vec::new();
    let mut suggestions = Vec::new();

    if word_count < 50 {
        warnings.push("Resume appears to be very short".to_string());
    }

    let sections_found = RESUME_SECTIONS
        .iter()
        .filter(|s| lowered.contains(*s))
        .count();
    if sections_found < 2 {
        warnings.push(
            "Resume may be missing common sections (Experience, Education, Skills)".to_string(),
        );
    }

    let contact = extract_contact_info(text);
    if contact.email.is_none() {
        suggestions.push("Consider adding email address".to_string());
    }
    if contact.phone.is_none() {
        suggestions.push("Consider adding phone number".to_string());
    }
    if !date_patterns().iter().any(|re| re.is_match(text)) {
        suggestions.push("Consider adding employment dates".to_string());
    }

    ContentValidation {
        is_valid: warnings.is_empty(),
        word_count,
        warnings,
        suggestions,
    }
}
