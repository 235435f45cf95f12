// src/services/job_scraper.rs
//! Job posting lookup: live web search first, deterministic demo data when
//! the search yields nothing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::common::helpers::truncate_chars;
use crate::services::tavily::{TavilyClient, WebResult};

pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEMO_SOURCE: &str = "Demo Data";
const SNIPPET_LIMIT: usize = 500;

const DEMO_COMPANIES: &[&str] = &[
    "TechCorp Inc",
    "Innovation Labs",
    "Digital Solutions",
    "Future Systems",
    "DataTech",
    "CloudWorks",
    "NextGen Software",
    "Smart Analytics",
    "AI Dynamics",
    "Cyber Solutions",
];

const DEMO_LOCATIONS: &[&str] = &[
    "San Francisco, CA",
    "New York, NY",
    "Seattle, WA",
    "Austin, TX",
    "Boston, MA",
    "Chicago, IL",
    "Los Angeles, CA",
    "Denver, CO",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description_snippet: String,
    pub url: String,
    pub source: String,
    pub salary: Option<String>,
}

#[derive(Clone)]
pub struct JobScraper {
    tavily: Arc<TavilyClient>,
}

impl JobScraper {
    pub fn new(tavily: Arc<TavilyClient>) -> Self {
        Self { tavily }
    }

    pub async fn search_jobs(&self, job_title: &str, location: &str, max_results: usize) -> Vec<JobPosting> {
        let max_results = max_results.max(1);
        let query = search_query(job_title, location);

        let mut jobs: Vec<JobPosting> = self
            .tavily
            .search(&query, max_results)
            .await
            .iter()
            .filter_map(|r| posting_from_web(r, location))
            .collect();

        if jobs.is_empty() {
            debug!(query = %query, "No live job results, using demo postings");
            jobs = demo_jobs(job_title, location, max_results);
        }

        jobs.truncate(max_results);
        info!(job_title = %job_title, count = jobs.len(), "Job search completed");
        jobs
    }
}

pub fn search_query(job_title: &str, location: &str) -> String {
    let location = location.trim();
    if location.is_empty() {
        format!("{} jobs", job_title.trim())
    } else {
        format!("{} jobs in {}", job_title.trim(), location)
    }
}

/// Host part of a URL without `www.`
fn url_host(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let host = rest.split(['/', '?', '#']).next()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    (!host.is_empty()).then_some(host)
}

/// Splits listing titles like `Backend Engineer - Acme` or
/// `Backend Engineer at Acme`
fn split_title_company(title: &str) -> (String, Option<String>) {
    for sep in [" at ", " - ", " | "] {
        if let Some((role, company)) = title.split_once(sep) {
            let company = company.split(sep).next().unwrap_or(company).trim();
            if !role.trim().is_empty() && !company.is_empty() {
                return (role.trim().to_string(), Some(company.to_string()));
            }
        }
    }
    (title.trim().to_string(), None)
}

/// Maps a search hit onto a posting; hits without a title or URL are dropped
pub fn posting_from_web(result: &WebResult, location: &str) -> Option<JobPosting> {
    if result.title.trim().is_empty() || result.url.trim().is_empty() {
        return None;
    }

    let (title, company) = split_title_company(&result.title);
    let company = company
        .or_else(|| url_host(&result.url).map(str::to_string))
        .unwrap_or_else(|| "Unknown".to_string());

    Some(JobPosting {
        title,
        company,
        location: location.trim().to_string(),
        description_snippet: truncate_chars(&result.snippet, SNIPPET_LIMIT),
        url: result.url.clone(),
        source: if result.source.is_empty() {
            "web".to_string()
        } else {
            result.source.clone()
        },
        salary: None,
    })
}

pub fn demo_jobs(job_title: &str, location: &str, count: usize) -> Vec<JobPosting> {
    let templates = [
        format!("We are seeking a talented {job_title} to join our dynamic team. The ideal candidate will have strong technical skills and experience with modern technologies."),
        format!("Exciting opportunity for a {job_title} to work on cutting-edge projects. We offer competitive compensation and excellent benefits."),
        format!("Join our innovative team as a {job_title}. You'll work with the latest technologies and contribute to impactful projects."),
        format!("We're looking for an experienced {job_title} to help drive our technology initiatives forward."),
        format!("Great opportunity for a {job_title} to grow their career in a fast-paced, collaborative environment."),
    ];
    let location = location.trim();

    (0..count)
        .map(|i| JobPosting {
            title: job_title.to_string(),
            company: DEMO_COMPANIES[i % DEMO_COMPANIES.len()].to_string(),
            location: if location.is_empty() {
                DEMO_LOCATIONS[i % DEMO_LOCATIONS.len()].to_string()
            } else {
                location.to_string()
            },
            description_snippet: templates[i % templates.len()].clone(),
            url: format!("https://example-job-site.com/job/{}", i + 1),
            source: DEMO_SOURCE.to_string(),
            salary: (i % 3 == 0)
                .then(|| format!("${} - ${}", 60_000 + i * 5_000, 80_000 + i * 5_000)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::settings::SettingsService;
    use crate::services::test_support;

    #[test]
    fn test_search_query() {
        assert_eq!(search_query("Data Engineer", ""), "Data Engineer jobs");
        assert_eq!(search_query("Data Engineer ", " Austin"), "Data Engineer jobs in Austin");
    }

    #[test]
    fn test_demo_jobs_are_deterministic() {
        let jobs = demo_jobs("SRE", "", 10);
        assert_eq!(jobs.len(), 10);
        assert_eq!(jobs[0].company, "TechCorp Inc");
        assert_eq!(jobs[8].location, "San Francisco, CA");
        assert_eq!(jobs[9].url, "https://example-job-site.com/job/10");
        assert_eq!(jobs[0].salary.as_deref(), Some("$60000 - $80000"));
        assert!(jobs[1].salary.is_none());
        assert_eq!(jobs[3].salary.as_deref(), Some("$75000 - $95000"));
        assert!(jobs.iter().all(|j| j.source == DEMO_SOURCE));
        assert_eq!(demo_jobs("SRE", "", 10), jobs);
    }

    #[test]
    fn test_demo_jobs_use_given_location() {
        assert!(demo_jobs("SRE", "Remote", 4).iter().all(|j| j.location == "Remote"));
    }

    #[test]
    fn test_posting_from_web() {
        let hit = WebResult {
            title: "Rust Engineer at Ferrous Co".into(),
            url: "https://www.jobs.example/123".into(),
            snippet: "Work on compilers".into(),
            source: String::new(),
        };
        let posting = posting_from_web(&hit, "Berlin").unwrap();
        assert_eq!(posting.title, "Rust Engineer");
        assert_eq!(posting.company, "Ferrous Co");
        assert_eq!(posting.source, "web");

        let bare = WebResult {
            title: "Platform roles".into(),
            url: "https://www.careers.example/x".into(),
            ..Default::default()
        };
        assert_eq!(posting_from_web(&bare, "").unwrap().company, "careers.example");

        assert!(posting_from_web(&WebResult::default(), "").is_none());
    }

    #[tokio::test]
    async fn test_search_falls_back_to_demo() {
        if std::env::var("TAVILY_API_KEY").is_ok() {
            return;
        }
        let pool = test_support::memory_pool().await;
        let settings = Arc::new(SettingsService::with_encryption(pool, None));
        let scraper = JobScraper::new(Arc::new(TavilyClient::new(settings)));

        let jobs = scraper.search_jobs("QA Engineer", "", DEFAULT_MAX_RESULTS).await;
        assert_eq!(jobs.len(), DEFAULT_MAX_RESULTS);
        assert_eq!(jobs[0].source, DEMO_SOURCE);
    }
}
