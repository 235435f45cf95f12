// src/services/tavily.rs
//! Web search through the Tavily API.
//!
//! Search never fails from the caller's point of view: a missing key,
//! a transport error or an unexpected payload all produce an empty list.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::services::settings::{self, SettingsService};

pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// One normalised search hit
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
}

#[derive(Debug)]
pub struct TavilyClient {
    settings_service: Arc<SettingsService>,
    client: Client,
}

impl TavilyClient {
    pub fn new(settings_service: Arc<SettingsService>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            settings_service,
            client,
        }
    }

    /// Search the web. `max_results` is clamped to 1..=10.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<WebResult> {
        let api_key = match self.settings_service.get_setting(settings::TAVILY_API_KEY).await {
            Ok(Some(key)) => key,
            Ok(None) => {
                debug!("Tavily API key not configured, skipping web search");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Failed to read Tavily settings");
                return Vec::new();
            }
        };

        let base_url = self
            .settings_service
            .get_setting_or(settings::TAVILY_BASE_URL, DEFAULT_BASE_URL)
            .await
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let payload = serde_json::json!({
            "api_key": api_key,
            "query": query,
            "search_depth": "basic",
            "max_results": max_results.clamp(1, 10),
        });

        let url = format!("{}/search", base_url.trim_end_matches('/'));
        let response = match self.client.post(&url).json(&payload).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Tavily request failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "Tavily returned an error status");
            return Vec::new();
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => {
                let results = normalize_results(&body);
                debug!(query = %query, count = results.len(), "Tavily search completed");
                results
            }
            Err(e) => {
                warn!(error = %e, "Tavily response was not JSON");
                Vec::new()
            }
        }
    }
}

fn first_str<'a>(item: &'a serde_json::Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| item.get(*k).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
}

/// Maps a Tavily payload (`results` or `data`) onto [`WebResult`]s
pub fn normalize_results(body: &serde_json::Value) -> Vec<WebResult> {
    let items = body
        .get("results")
        .or_else(|| body.get("data"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    items
        .iter()
        .map(|item| WebResult {
            title: first_str(item, &["title", "name"]).unwrap_or_default().to_string(),
            url: first_str(item, &["url", "link"]).unwrap_or_default().to_string(),
            snippet: first_str(item, &["snippet", "content"])
                .unwrap_or_default()
                .to_string(),
            source: first_str(item, &["source"]).unwrap_or("web").to_string(),
        })
        .collect()
}
