// src/services/resume_tailor.rs
//! Tailoring workflow: keywords, a LaTeX rewrite of the resume and cover
//! letters, run in sequence.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::services::cover_letters::{extract_email, extract_name, extract_phone, CoverLetterBundle, CoverLetterGenerator};
use crate::services::keyword_extractor::extract_keywords;
use crate::services::openai::{
    strip_code_fences, CompletionOptions, OpenAIError, OpenAIService, TextGenerationPurpose,
};
use crate::services::pdf::basic_latex_template;

const DOCUMENT_CLASS: &str = "\\documentclass[10pt, letterpaper]{article}";
const END_DOCUMENT: &str = "\\end{document}";

const LATEX_SKELETON: &str = r"\documentclass[10pt, letterpaper]{article}
\usepackage[ignoreheadfoot, top=2 cm, bottom=2 cm, left=2 cm, right=2 cm, footskip=1.0 cm]{geometry}
\usepackage{titlesec}
\usepackage{tabularx}
\usepackage{array}
\usepackage[dvipsnames]{xcolor}
\definecolor{primaryColor}{RGB}{0, 0, 0}
\usepackage{enumitem}
\usepackage{fontawesome5}
\usepackage{amsmath}
\usepackage[colorlinks=true, urlcolor=primaryColor]{hyperref}
\usepackage{changepage}
\usepackage{paracol}
\usepackage{needspace}
\usepackage{iftex}
\ifPDFTeX
    \input{glyphtounicode}
    \pdfgentounicode=1
    \usepackage[T1]{fontenc}
    \usepackage[utf8]{inputenc}
    \usepackage{lmodern}
\fi
\usepackage{charter}
\raggedright
\pagestyle{empty}
\setcounter{secnumdepth}{0}
\setlength{\parindent}{0pt}
\titleformat{\section}{\needspace{4\baselineskip}\bfseries\large}{}{0pt}{}[\vspace{1pt}\titlerule]
\newenvironment{highlights}{\begin{itemize}[topsep=0.10 cm,parsep=0.10 cm,partopsep=0pt,itemsep=0pt,leftmargin=10pt]}{\end{itemize}}
\newenvironment{onecolentry}{\begin{adjustwidth}{0 cm + 0.00001 cm}{0 cm + 0.00001 cm}}{\end{adjustwidth}}
\newenvironment{twocolentry}[2][]{\onecolentry\def\secondColumn{#2}\setcolumnwidth{\fill, 4.5 cm}\begin{paracol}{2}}{\switchcolumn \raggedleft \secondColumn\end{paracol}\endonecolentry}
\newenvironment{header}{\setlength{\topsep}{0pt}\par\kern\topsep\centering\linespread{1.5}}{\par\kern\topsep}
\begin{document}
    % Header: name, location, email, phone, website, linkedin, github
    % Sections: About Me, Education, Experience, Management and Leadership Skills, Projects,
    % Languages, Technologies/Skills, Volunteering, Certificates and Certifications,
    % Extra-Curricular & Interests
\end{document}";

#[derive(Debug, Error)]
pub enum TailorError {
    #[error("{0}")]
    Generation(#[from] OpenAIError),

    #[error("model returned an empty document")]
    EmptyOutput,
}

#[derive(Debug, Clone, Serialize)]
pub struct TailorResult {
    /// Full LaTeX document
    pub tailored_resume: String,
    pub keywords: Vec<String>,
    pub cover_letters: CoverLetterBundle,
}

#[derive(Clone)]
pub struct ResumeTailor {
    openai: Arc<OpenAIService>,
    cover_letters: CoverLetterGenerator,
}

impl ResumeTailor {
    pub fn new(openai: Arc<OpenAIService>) -> Self {
        Self {
            cover_letters: CoverLetterGenerator::new(openai.clone()),
            openai,
        }
    }

    pub async fn tailor_resume(
        &self,
        original_text: &str,
        job_description: &str,
    ) -> Result<TailorResult, TailorError> {
        let keywords = extract_keywords(job_description);
        info!(keyword_count = keywords.len(), "Extracted job keywords");

        let tailored_resume = if self.openai.is_configured().await {
            self.generate_latex(original_text, job_description).await?
        } else {
            info!("OpenAI not configured, using basic LaTeX template");
            fallback_latex(original_text, &keywords)
        };

        let cover_letters = self
            .cover_letters
            .generate(original_text, job_description)
            .await;

        Ok(TailorResult {
            tailored_resume,
            keywords,
            cover_letters,
        })
    }

    async fn generate_latex(&self, original_text: &str, job_description: &str) -> Result<String, TailorError> {
        let system = format!(
            "You are an expert LaTeX resume writer.\n\n\
             Follow the LaTeX template skeleton below for every output: keep its preamble, packages, \
             environments and sectioning, then populate it only with content from the original resume, \
             tailored to the job description.\n\n\
             Rules:\n\
             - Output a single compilable LaTeX document that begins with \\documentclass and ends with \\end{{document}}.\n\
             - Use the article-based template, not moderncv.\n\
             - Prioritise and rephrase resume content that matches the job description. Do not invent information.\n\
             - Omit sections the original resume does not support. No placeholders.\n\
             - Keep formatting ATS-friendly.\n\n\
             TEMPLATE:\n{}",
            LATEX_SKELETON
        );
        let user = format!(
            "Tailor the following resume to the target job description and return a full LaTeX document \
             that follows the template.\n\n[ORIGINAL RESUME]\n{}\n\n[TARGET JOB DESCRIPTION]\n{}\n\n\
             Do not invent content. Omit sections not supported by the original resume.",
            original_text, job_description
        );
        let options = CompletionOptions {
            temperature: 0.3,
            max_tokens: 4000,
            json_output: false,
        };

        let raw = self
            .openai
            .complete(TextGenerationPurpose::ResumeTailoring, &system, &user, options)
            .await
            .map_err(|e| {
                warn!(error = %e, "LaTeX generation failed");
                TailorError::from(e)
            })?;

        let latex = strip_code_fences(&raw);
        if latex.trim().is_empty() {
            return Err(TailorError::EmptyOutput);
        }
        Ok(ensure_document_bounds(&latex))
    }
}

/// Prepends `\documentclass` and appends `\end{document}` when missing
pub fn ensure_document_bounds(latex: &str) -> String {
    let mut doc = latex.trim().to_string();
    if !doc.starts_with("\\documentclass") {
        doc = format!("{}\n{}", DOCUMENT_CLASS, doc);
    }
    if !doc.contains(END_DOCUMENT) {
        doc.push('\n');
        doc.push_str(END_DOCUMENT);
    }
    doc
}

fn looks_like_heading(line: &str) -> bool {
    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    let short = line.chars().count() <= 40;
    let all_caps = letters > 3 && !line.chars().any(|c| c.is_lowercase());
    short && (all_caps || (line.ends_with(':') && letters > 0))
}

/// Groups resume lines under their headings; text before the first
/// heading lands in "Profile"
pub fn split_sections(text: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, String)> = Vec::new();
    let mut heading = "Profile".to_string();
    let mut body: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if looks_like_heading(line) {
            if !body.is_empty() {
                sections.push((heading.clone(), body.join("\n")));
                body.clear();
            }
            heading = title_case(line.trim_end_matches(':'));
        } else {
            body.push(line);
        }
    }
    if !body.is_empty() {
        sections.push((heading, body.join("\n")));
    }
    sections
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|w| {
            let lower = w.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Basic template filled from the resume text, with the job keywords as a
/// skills section
pub fn fallback_latex(original_text: &str, keywords: &[String]) -> String {
    let name = extract_name(original_text).unwrap_or_else(|| "Candidate".to_string());
    let email = extract_email(original_text);
    let phone = extract_phone(original_text);

    // the name line is already in the header
    let body: String = original_text
        .lines()
        .filter(|l| l.trim() != name)
        .collect::<Vec<_>>()
        .join("\n");

    let mut sections: Vec<(String, String)> = split_sections(&body)
        .into_iter()
        .map(|(heading, text)| {
            let cleaned = text
                .lines()
                .filter(|l| {
                    email.as_deref().map_or(true, |e| !l.contains(e))
                        && phone.as_deref().map_or(true, |p| !l.contains(p))
                })
                .collect::<Vec<_>>()
                .join("\n");
            (heading, cleaned)
        })
        .collect();

    if !keywords.is_empty() {
        sections.push(("Key Skills".to_string(), keywords.join(", ")));
    }

    basic_latex_template(&name, email.as_deref(), phone.as_deref(), &sections)
}
