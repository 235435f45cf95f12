// src/services/settings.rs
//! Runtime provider settings (API keys, base URLs, model names).
//!
//! Lookup order is cache, then `system_settings`, then the upper-cased
//! environment variable of the same name.

use crate::services::encryption::{EncryptionError, EncryptionService};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

pub const OPENAI_API_KEY: &str = "openai_api_key";
pub const OPENAI_BASE_URL: &str = "openai_base_url";
pub const OPENAI_MODEL: &str = "openai_model";
pub const OPENAI_EMBEDDING_MODEL: &str = "openai_embedding_model";
pub const TAVILY_API_KEY: &str = "tavily_api_key";
pub const TAVILY_BASE_URL: &str = "tavily_base_url";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Encryption error: {0}")]
    EncryptionError(#[from] EncryptionError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone)]
struct CachedSetting {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SettingsService {
    db_pool: SqlitePool,
    cache: Arc<RwLock<HashMap<String, CachedSetting>>>,
    encryption_service: Option<EncryptionService>,
    cache_ttl: Duration,
}

impl SettingsService {
    /// Builds the service, picking up `ENCRYPTION_MASTER_KEY` when present
    pub fn new(db_pool: SqlitePool) -> Self {
        let encryption_service = match EncryptionService::from_env() {
            Ok(service) => {
                info!("Encryption service initialized successfully");
                Some(service)
            }
            Err(e) => {
                warn!("Encryption service not available: {}. Provider secrets will be stored in plain text.", e);
                None
            }
        };

        Self::with_encryption(db_pool, encryption_service)
    }

    pub fn with_encryption(db_pool: SqlitePool, encryption_service: Option<EncryptionService>) -> Self {
        Self {
            db_pool,
            cache: Arc::new(RwLock::new(HashMap::new())),
            encryption_service,
            cache_ttl: Duration::minutes(5),
        }
    }

    /// Get a setting value by key. Blank values count as unset.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, SettingsError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(key) {
                if cached.expires_at > Utc::now() {
                    debug!(key = %key, "Setting retrieved from cache");
                    return Ok(Some(cached.value.clone()));
                }
            }
        }

        let row = sqlx::query_as::<_, (String, Option<i64>)>(
            "SELECT value, encrypted FROM system_settings WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.db_pool)
        .await?;

        if let Some((value, encrypted)) = row {
            let value = self.open_value(key, value, encrypted.unwrap_or(0) == 1)?;
            if !value.trim().is_empty() {
                let mut cache = self.cache.write().await;
                cache.insert(
                    key.to_string(),
                    CachedSetting {
                        value: value.clone(),
                        expires_at: Utc::now() + self.cache_ttl,
                    },
                );
                debug!(key = %key, "Setting retrieved from database");
                return Ok(Some(value));
            }
        }

        match env::var(key.to_uppercase()) {
            Ok(env_value) if !env_value.trim().is_empty() => {
                debug!(key = %key, "Setting retrieved from environment variable");
                Ok(Some(env_value))
            }
            _ => {
                debug!(key = %key, "Setting not found");
                Ok(None)
            }
        }
    }

    /// Get a setting, substituting `default` when unset
    pub async fn get_setting_or(&self, key: &str, default: &str) -> Result<String, SettingsError> {
        Ok(self
            .get_setting(key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Upsert a setting, sealing it when `encrypt` is set
    pub async fn set_setting(
        &self,
        key: &str,
        value: &str,
        encrypt: bool,
        updated_by: Option<&str>,
    ) -> Result<(), SettingsError> {
        let stored_value = if encrypt {
            let service = self.encryption_service.as_ref().ok_or_else(|| {
                SettingsError::InvalidConfig(
                    "Cannot encrypt setting: encryption service not configured".to_string(),
                )
            })?;
            service.encrypt(value).map_err(|e| {
                error!(key = %key, error = %e, "Failed to encrypt setting");
                SettingsError::EncryptionError(e)
            })?
        } else {
            value.to_string()
        };

        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, encrypted, updated_at, updated_by)
            VALUES (?, ?, ?, datetime('now'), ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                encrypted = excluded.encrypted,
                updated_at = excluded.updated_at,
                updated_by = excluded.updated_by
            "#,
        )
        .bind(key)
        .bind(&stored_value)
        .bind(if encrypt { 1 } else { 0 })
        .bind(updated_by)
        .execute(&self.db_pool)
        .await?;

        self.invalidate_cache_key(key).await;

        info!(key = %key, encrypted = encrypt, "Setting updated successfully");
        Ok(())
    }

    pub async fn delete_setting(&self, key: &str) -> Result<(), SettingsError> {
        sqlx::query("DELETE FROM system_settings WHERE key = ?")
            .bind(key)
            .execute(&self.db_pool)
            .await?;

        self.invalidate_cache_key(key).await;

        info!(key = %key, "Setting deleted");
        Ok(())
    }

    pub async fn invalidate_cache_key(&self, key: &str) {
        let mut cache = self.cache.write().await;
        cache.remove(key);
        debug!(key = %key, "Cache entry invalidated");
    }

    fn open_value(&self, key: &str, value: String, encrypted: bool) -> Result<String, SettingsError> {
        if !encrypted {
            return Ok(value);
        }

        match &self.encryption_service {
            Some(service) => service.decrypt(&value).map_err(|e| {
                error!(key = %key, error = %e, "Failed to decrypt setting");
                SettingsError::EncryptionError(e)
            }),
            None => {
                error!(key = %key, "Setting is encrypted but encryption service not available");
                Err(SettingsError::InvalidConfig(
                    "Encryption service not configured".to_string(),
                ))
            }
        }
    }
}
