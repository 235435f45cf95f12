// src/messages/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct OutreachMessage {
    pub id: String,
    pub user_id: String,
    pub job_description_id: String,
    pub message_type: String,
    pub subject: Option<String>,
    pub content: String,
    pub tone: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Message row joined with its job for listings
#[derive(FromRow, Serialize, Debug)]
pub struct MessageWithJob {
    pub id: String,
    pub job_description_id: String,
    pub message_type: String,
    pub subject: Option<String>,
    pub content: String,
    pub tone: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct GenerateMessageRequest {
    pub job_id: Option<String>,
    pub message_type: Option<String>,
    pub tone: Option<String>,
}

impl GenerateMessageRequest {
    pub fn tone_or_default(&self) -> String {
        self.tone
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("professional")
            .to_string()
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UpdateMessageRequest {
    pub subject: Option<String>,
    pub content: Option<String>,
}
