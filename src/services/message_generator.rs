// src/services/message_generator.rs
//! Outreach drafting: cold emails, LinkedIn notes and elevator pitches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::common::helpers::truncate_chars;
use crate::services::openai::{CompletionOptions, OpenAIService, TextGenerationPurpose};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Email,
    Linkedin,
    Pitch,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Email => "email",
            MessageType::Linkedin => "linkedin",
            MessageType::Pitch => "pitch",
        }
    }

    pub fn tips(&self) -> Vec<String> {
        let tips: &[&str] = match self {
            MessageType::Email => &[
                "Research the hiring manager's name if possible",
                "Send during business hours (9 AM - 5 PM)",
                "Follow up after 1-2 weeks if no response",
                "Keep attachments under 5MB",
            ],
            MessageType::Linkedin => &[
                "Personalize with something from their profile",
                "Connect on Tuesday-Thursday for best response rates",
                "Don't pitch immediately after connecting",
                "Engage with their posts before reaching out",
            ],
            MessageType::Pitch => &[
                "Practice until it sounds natural",
                "Adjust based on your audience",
                "Have 30-second and 60-second versions",
                "End with a question to start conversation",
                "Be enthusiastic but not overwhelming",
            ],
        };
        tips.iter().map(|t| t.to_string()).collect()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(MessageType::Email),
            "linkedin" => Ok(MessageType::Linkedin),
            "pitch" => Ok(MessageType::Pitch),
            other => Err(format!("Unsupported message type: {}", other)),
        }
    }
}

/// Guidance phrase for the prompt; unknown tones pass through verbatim
pub fn tone_guidance(tone: &str) -> String {
    match tone.trim().to_lowercase().as_str() {
        "professional" => "professional: formal and respectful".to_string(),
        "casual" => "casual: friendly and approachable".to_string(),
        "enthusiastic" => "enthusiastic: energetic and passionate".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedMessage {
    pub subject: String,
    pub content: String,
    pub tips: Vec<String>,
}

/// Everything a draft is written from
#[derive(Debug, Clone)]
pub struct MessageRequest<'a> {
    pub job_description: &'a str,
    pub company: &'a str,
    pub job_title: &'a str,
    pub message_type: MessageType,
    pub tone: &'a str,
    pub user_name: &'a str,
}

#[derive(Clone)]
pub struct MessageGenerator {
    openai: Arc<OpenAIService>,
}

impl MessageGenerator {
    pub fn new(openai: Arc<OpenAIService>) -> Self {
        Self { openai }
    }

    pub async fn generate_message(&self, req: &MessageRequest<'_>) -> GeneratedMessage {
        if !self.openai.is_configured().await {
            info!(message_type = %req.message_type, "OpenAI not configured, using message template");
            return fallback_message(req);
        }

        let (system, user) = build_prompts(req);
        let options = CompletionOptions {
            temperature: 0.7,
            max_tokens: 800,
            json_output: false,
        };

        match self
            .openai
            .complete(TextGenerationPurpose::OutreachMessage, &system, &user, options)
            .await
        {
            Ok(raw) if !raw.trim().is_empty() => parse_generated(req, raw.trim()),
            Ok(_) => {
                warn!(message_type = %req.message_type, "Empty outreach draft, using template");
                fallback_message(req)
            }
            Err(e) => {
                warn!(message_type = %req.message_type, error = %e, "Outreach generation failed, using template");
                fallback_message(req)
            }
        }
    }
}

fn build_prompts(req: &MessageRequest<'_>) -> (String, String) {
    let tone = tone_guidance(req.tone);
    match req.message_type {
        MessageType::Email => (
            format!(
                "You are an expert at writing personalized outreach emails for job applications. \
                 Write in a {} tone. Keep it concise (150-200 words), show you researched the company \
                 and role, highlight relevant skills without being pushy, and include a clear call to action.",
                tone
            ),
            format!(
                "Write an email for a job application.\n\nJob Title: {}\nCompany: {}\nApplicant Name: {}\nTone: {}\n\n\
                 Job Description (key points):\n{}\n\n\
                 Include a compelling subject line, a greeting, a brief interest statement, 2-3 matching \
                 qualifications, a mention of the attached resume and a closing with a call to action.\n\n\
                 Format as:\nSubject: [subject line]\n\n[email body]",
                req.job_title,
                req.company,
                or_default(req.user_name, "the applicant"),
                req.tone,
                truncate_chars(req.job_description, 1000)
            ),
        ),
        MessageType::Linkedin => (
            format!(
                "You are an expert at writing LinkedIn messages for professional networking. \
                 Write in a {} tone. Be brief, authentic and not salesy, and end with a soft ask.",
                tone
            ),
            format!(
                "Write LinkedIn messages about this opportunity.\n\nJob Title: {}\nCompany: {}\nSender: {}\nTone: {}\n\n\
                 Job Description highlights:\n{}\n\n\
                 Create a connection request (under 300 characters) and a follow-up message after \
                 connecting (100-150 words).\n\n\
                 Format as:\nConnection Request:\n[message]\n\nFollow-up Message:\n[message]",
                req.job_title,
                req.company,
                or_default(req.user_name, "the job seeker"),
                req.tone,
                truncate_chars(req.job_description, 800)
            ),
        ),
        MessageType::Pitch => (
            format!(
                "You craft elevator pitches for job seekers. Write in a {} tone. \
                 30-60 seconds spoken (100-150 words), open with a hook, state specific skills \
                 and end with a question.",
                tone
            ),
            format!(
                "Create an elevator pitch for someone seeking this role.\n\nTarget Job: {}\nTarget Company: {}\nSpeaker: {}\nTone: {}\n\n\
                 Job Requirements:\n{}\n\n\
                 Structure: introduction, current skills, target role, value proposition, call to action. \
                 Keep it conversational.",
                req.job_title,
                req.company,
                or_default(req.user_name, "the job seeker"),
                req.tone,
                truncate_chars(req.job_description, 800)
            ),
        ),
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// Shapes raw model output into subject and body for the message type
pub fn parse_generated(req: &MessageRequest<'_>, raw: &str) -> GeneratedMessage {
    let (subject, content) = match req.message_type {
        MessageType::Email => split_email_subject(raw).unwrap_or_else(|| {
            (
                format!("Application for {} Position at {}", req.job_title, req.company),
                raw.to_string(),
            )
        }),
        MessageType::Linkedin => {
            let (connection, followup) = match raw.split_once("Follow-up Message:") {
                Some((head, tail)) => (head, tail.trim()),
                None => (raw, ""),
            };
            let connection = connection.replace("Connection Request:", "");
            (
                format!("Connection Request - {} Opportunity", req.job_title),
                format!(
                    "Connection Request:\n{}\n\nFollow-up Message:\n{}",
                    connection.trim(),
                    followup
                ),
            )
        }
        MessageType::Pitch => (format!("Elevator Pitch - {}", req.job_title), raw.to_string()),
    };

    GeneratedMessage {
        subject,
        content,
        tips: req.message_type.tips(),
    }
}

/// Splits on the first `Subject:` line; the body is everything after it
fn split_email_subject(raw: &str) -> Option<(String, String)> {
    let lines: Vec<&str> = raw.lines().collect();
    let idx = lines
        .iter()
        .position(|l| l.trim_start().starts_with("Subject:"))?;

    let subject = lines[idx].trim_start().trim_start_matches("Subject:").trim();
    if subject.is_empty() {
        return None;
    }
    let body = lines[idx + 1..].join("\n").trim().to_string();
    Some((subject.to_string(), body))
}

pub fn fallback_message(req: &MessageRequest<'_>) -> GeneratedMessage {
    let name = or_default(req.user_name, "[Your Name]");
    let (title, company) = (req.job_title, req.company);

    match req.message_type {
        MessageType::Email => GeneratedMessage {
            subject: format!("Application for {} Position", title),
            content: format!(
                "Dear Hiring Manager,\n\n\
                 I am writing to express my strong interest in the {title} position at {company}. \
                 After reviewing the job description, I am excited about the opportunity to contribute to your team.\n\n\
                 My background in [relevant field] and experience with [key skills] align well with the requirements \
                 outlined in the posting. I am particularly drawn to [specific aspect of the role/company] and believe \
                 my skills in [specific skills] would be valuable to your organization.\n\n\
                 I have attached my resume for your review and would welcome the opportunity to discuss how my \
                 experience can benefit {company}. Thank you for considering my application.\n\n\
                 Best regards,\n{name}"
            ),
            tips: vec!["Customize the bracketed sections with your specific details".to_string()],
        },
        MessageType::Linkedin => GeneratedMessage {
            subject: format!("LinkedIn Outreach - {}", title),
            content: format!(
                "Connection Request:\n\
                 Hi! I noticed you work at {company} and I'm very interested in opportunities there, particularly \
                 in {title} roles. I'd love to connect and learn more about your experience at the company.\n\n\
                 Follow-up Message:\n\
                 Thanks for connecting! I'm currently exploring {title} opportunities and am really impressed by \
                 {company}'s work. I'd love to hear about your experience there and any insights you might have \
                 about the team. Would you be open to a brief chat sometime?"
            ),
            tips: vec!["Personalize based on their profile and recent posts".to_string()],
        },
        MessageType::Pitch => GeneratedMessage {
            subject: format!("Elevator Pitch - {}", title),
            content: format!(
                "Hi, I'm {name}. I'm a [your profession] with [X years] of experience in [relevant field].\n\n\
                 I specialize in [key skills] and have a track record of [specific achievement]. I'm currently \
                 looking for {title} opportunities where I can apply my expertise in [relevant area].\n\n\
                 I'm particularly interested in companies like {company} because of [reason]. I'd love to learn \
                 more about opportunities in this space - do you know anyone I should connect with?"
            ),
            tips: vec!["Fill in the bracketed sections with your specific details".to_string()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;

    fn request(message_type: MessageType) -> MessageRequest<'static> {
        MessageRequest {
            job_description: "Build APIs in Rust",
            company: "Acme",
            job_title: "Backend Engineer",
            message_type,
            tone: "professional",
            user_name: "Jane Doe",
        }
    }

    #[test]
    fn test_message_type_parsing() {
        assert_eq!("Email".parse::<MessageType>().unwrap(), MessageType::Email);
        assert_eq!(" linkedin ".parse::<MessageType>().unwrap(), MessageType::Linkedin);
        assert!("fax".parse::<MessageType>().is_err());
        assert_eq!(MessageType::Pitch.to_string(), "pitch");
    }

    #[test]
    fn test_tone_guidance() {
        assert!(tone_guidance("Casual").contains("friendly"));
        assert_eq!(tone_guidance("witty"), "witty");
    }

    #[test]
    fn test_email_subject_parsing() {
        let raw = "Subject: Excited about Backend Engineer\n\nDear team,\nHello.";
        let msg = parse_generated(&request(MessageType::Email), raw);
        assert_eq!(msg.subject, "Excited about Backend Engineer");
        assert_eq!(msg.content, "Dear team,\nHello.");
        assert_eq!(msg.tips.len(), 4);
    }

    #[test]
    fn test_email_without_subject_gets_default() {
        let msg = parse_generated(&request(MessageType::Email), "Dear team, hello.");
        assert_eq!(msg.subject, "Application for Backend Engineer Position at Acme");
        assert_eq!(msg.content, "Dear team, hello.");
    }

    #[test]
    fn test_linkedin_split() {
        let raw = "Connection Request:\nHi there!\n\nFollow-up Message:\nThanks for connecting.";
        let msg = parse_generated(&request(MessageType::Linkedin), raw);
        assert_eq!(msg.subject, "Connection Request - Backend Engineer Opportunity");
        assert_eq!(
            msg.content,
            "Connection Request:\nHi there!\n\nFollow-up Message:\nThanks for connecting."
        );

        let single = parse_generated(&request(MessageType::Linkedin), "Just one note");
        assert!(single.content.ends_with("Follow-up Message:\n"));
    }

    #[test]
    fn test_fallbacks_mention_job() {
        for kind in [MessageType::Email, MessageType::Linkedin, MessageType::Pitch] {
            let msg = fallback_message(&request(kind));
            assert!(msg.content.contains("Backend Engineer"), "{:?}", kind);
            assert_eq!(msg.tips.len(), 1);
        }

        let mut anonymous = request(MessageType::Pitch);
        anonymous.user_name = "  ";
        assert!(fallback_message(&anonymous).content.starts_with("Hi, I'm [Your Name]."));
    }

    #[tokio::test]
    async fn test_generate_without_openai_falls_back() {
        if test_support::openai_env_configured() {
            return;
        }
        let (_pool, openai) = test_support::unconfigured_openai().await;
        let generator = MessageGenerator::new(openai);

        let msg = generator.generate_message(&request(MessageType::Email)).await;
        assert_eq!(msg.subject, "Application for Backend Engineer Position");
        assert!(msg.content.ends_with("Best regards,\nJane Doe"));
    }
}
