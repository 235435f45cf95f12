// src/services/openai.rs
use crate::services::settings::{self, SettingsService};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("API key not configured")]
    NotConfigured,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Settings error: {0}")]
    SettingsError(String),
}

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
}

/// What a completion is for; carried into the logs
#[derive(Debug, Clone, Copy)]
pub enum TextGenerationPurpose {
    ResumeTailoring,
    ResumeContent,
    CoverLetters,
    OutreachMessage,
}

/// Sampling knobs for a single completion
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the model for a single JSON object
    pub json_output: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
            json_output: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug)]
pub struct OpenAIService {
    settings_service: Arc<SettingsService>,
    client: Client,
}

impl OpenAIService {
    pub fn new(settings_service: Arc<SettingsService>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(180))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            settings_service,
            client,
        }
    }

    /// Get OpenAI configuration from settings
    pub async fn get_config(&self) -> Result<OpenAIConfig, OpenAIError> {
        let api_key = self
            .setting(settings::OPENAI_API_KEY)
            .await?
            .ok_or(OpenAIError::NotConfigured)?;

        let base_url = self
            .setting(settings::OPENAI_BASE_URL)
            .await?
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = self
            .setting(settings::OPENAI_MODEL)
            .await?
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let embedding_model = self
            .setting(settings::OPENAI_EMBEDDING_MODEL)
            .await?
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

        Ok(OpenAIConfig {
            api_key,
            base_url,
            model,
            embedding_model,
        })
    }

    /// True when an API key is available
    pub async fn is_configured(&self) -> bool {
        matches!(self.setting(settings::OPENAI_API_KEY).await, Ok(Some(_)))
    }

    async fn setting(&self, key: &str) -> Result<Option<String>, OpenAIError> {
        self.settings_service
            .get_setting(key)
            .await
            .map_err(|e| OpenAIError::SettingsError(e.to_string()))
    }

    /// Run one completion with an explicit system prompt
    pub async fn complete(
        &self,
        purpose: TextGenerationPurpose,
        system: &str,
        user: &str,
        options: CompletionOptions,
    ) -> Result<String, OpenAIError> {
        let config = self.get_config().await?;
        let model = config.model.clone();

        let request = build_request(&model, system, user, options);

        debug!(
            purpose = ?purpose,
            model = %model,
            json_output = options.json_output,
            "Sending OpenAI text generation request"
        );

        let response = self.make_request_with_retry(&config, request).await?;
        let generated_text = extract_output_text(&response)?;

        if let Some(usage) = response.usage {
            info!(
                purpose = ?purpose,
                model = %model,
                tokens_used = usage.total_tokens,
                "OpenAI text generation completed"
            );
        }

        Ok(generated_text)
    }

    /// Embed `text` into a vector of `dimensions` floats
    pub async fn embed(&self, text: &str, dimensions: usize) -> Result<Vec<f32>, OpenAIError> {
        let config = self.get_config().await?;
        let url = format!("{}/v1/embeddings", config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&config.api_key)
            .json(&EmbeddingRequest {
                model: &config.embedding_model,
                input: text,
                dimensions,
            })
            .send()
            .await
            .map_err(|e| OpenAIError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OpenAIError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OpenAIError::RequestFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response
            .json::<EmbeddingResponse>()
            .await
            .map_err(|e| OpenAIError::InvalidResponse(e.to_string()))?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| OpenAIError::InvalidResponse("No embedding in response".to_string()))
    }

    /// Make API request with retry logic
    async fn make_request_with_retry(
        &self,
        config: &OpenAIConfig,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAIError> {
        let max_retries = 3;
        let mut last_error = None;

        for attempt in 1..=max_retries {
            match self.make_request(config, &request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(
                        attempt = attempt,
                        max_retries = max_retries,
                        error = %e,
                        "OpenAI API request failed, retrying..."
                    );
                    last_error = Some(e);

                    if attempt < max_retries {
                        let delay = std::time::Duration::from_millis(1000 * 2_u64.pow(attempt - 1));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| OpenAIError::RequestFailed("Unknown error".to_string())))
    }

    async fn make_request(
        &self,
        config: &OpenAIConfig,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAIError> {
        let url = format!("{}/v1/chat/completions", config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| OpenAIError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(OpenAIError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "OpenAI API request failed");
            return Err(OpenAIError::RequestFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| OpenAIError::InvalidResponse(e.to_string()))
    }
}

fn build_request(
    model: &str,
    system: &str,
    user: &str,
    options: CompletionOptions,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user.to_string(),
            },
        ],
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        response_format: options
            .json_output
            .then(|| serde_json::json!({"type": "json_object"})),
    }
}

fn extract_output_text(response: &ChatCompletionResponse) -> Result<String, OpenAIError> {
    response
        .choices
        .first()
        .map(|c| c.message.content.trim().to_string())
        .ok_or_else(|| {
            error!("OpenAI response carried no choices");
            OpenAIError::InvalidResponse("No choices in response".to_string())
        })
}

/// Parses the first JSON object found in model output.
/// Accepts bare JSON, fenced JSON, or JSON surrounded by prose.
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str::<serde_json::Value>(&trimmed[start..=end])
        .ok()
        .filter(|v| v.is_object())
}

/// Removes a surrounding Markdown code fence, if any
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let without_open = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => "",
    };
    without_open
        .trim_end()
        .trim_end_matches("```")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_sets_json_mode() {
        let options = CompletionOptions {
            json_output: true,
            ..CompletionOptions::default()
        };
        let request = build_request("gpt-4o-mini", "sys", "user", options);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "user");
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_plain_request_has_no_response_format() {
        let request = build_request("gpt-4o-mini", "sys", "user", CompletionOptions::default());
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("response_format").is_none());
        assert_eq!(json["max_tokens"], 2000);
    }

    #[test]
    fn test_extract_output_text() {
        let chat: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "  hello  "}}]
        }))
        .unwrap();
        assert_eq!(extract_output_text(&chat).unwrap(), "hello");

        let empty: ChatCompletionResponse =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(extract_output_text(&empty).is_err());
    }

    #[test]
    fn test_extract_json_object_handles_prose_and_fences() {
        let fenced = "```json\n{\"versions\": []}\n```";
        assert!(extract_json_object(fenced).unwrap()["versions"].is_array());

        let prose = "Sure! Here it is: {\"a\": 1} hope that helps";
        assert_eq!(extract_json_object(prose).unwrap()["a"], 1);

        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("[1, 2]").is_none());
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```latex\n\\documentclass{article}\n```"),
            "\\documentclass{article}"
        );
        assert_eq!(strip_code_fences("plain"), "plain");
    }
}
