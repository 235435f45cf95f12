// src/common/dev_mode.rs
//! Development mode configuration and utilities
//! Allows bypassing authentication for local testing

use sqlx::SqlitePool;
use std::env;

use crate::auth::models::User;

/// Fixed id so every dev-mode request maps onto the same account
pub const DEV_USER_ID: &str = "U_DEV000";

#[derive(Debug, Clone)]
pub struct DevModeConfig {
    pub enabled: bool,
    pub user_email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl Default for DevModeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            user_email: "dev@test.com".to_string(),
            username: "devuser".to_string(),
            first_name: "Dev".to_string(),
            last_name: "User".to_string(),
        }
    }
}

impl DevModeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enabled = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            == "true";

        Self {
            enabled,
            user_email: env::var("DEV_USER_EMAIL").unwrap_or(defaults.user_email),
            username: env::var("DEV_USER_NAME").unwrap_or(defaults.username),
            first_name: env::var("DEV_USER_FIRST_NAME").unwrap_or(defaults.first_name),
            last_name: env::var("DEV_USER_LAST_NAME").unwrap_or(defaults.last_name),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Loads the dev account, creating it on first use.
    /// The stored password hash is not a valid PHC string, so the
    /// account can never log in through the password flow.
    pub async fn ensure_dev_user(&self, db: &SqlitePool) -> Result<User, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO users (id, username, email, password_hash, first_name, last_name)
            VALUES (?, ?, ?, '!dev-mode', ?, ?)
            "#,
        )
        .bind(DEV_USER_ID)
        .bind(&self.username)
        .bind(self.user_email.to_lowercase())
        .bind(&self.first_name)
        .bind(&self.last_name)
        .execute(db)
        .await?;

        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(DEV_USER_ID)
            .fetch_one(db)
            .await
    }
}

/// Print dev mode status on startup
pub fn print_dev_mode_status(config: &DevModeConfig) {
    if config.enabled {
        println!("⚠️  🔓 DEV MODE ENABLED 🔓 ⚠️");
        println!("   Authentication bypassed for testing");
        println!("   Dev User: {} ({})", config.username, config.user_email);
        println!("   ⚠️  DO NOT USE IN PRODUCTION ⚠️");
        println!();
    } else {
        println!("🔒 Production mode - Authentication required");
    }
}

/// CLI argument parsing for dev mode
fn parse_dev_mode_args<I: IntoIterator<Item = String>>(args: I) -> Option<bool> {
    let mut result = None;
    for arg in args {
        match arg.as_str() {
            "--dev" | "--dev-mode" => result = Some(true),
            "--no-dev" | "--prod" | "--production" => result = Some(false),
            _ => {}
        }
    }
    result
}

/// Override dev mode from CLI args
pub fn apply_cli_override(mut config: DevModeConfig) -> DevModeConfig {
    if let Some(cli_dev_mode) = parse_dev_mode_args(env::args()) {
        println!("🔧 CLI override: DEV_MODE = {}", cli_dev_mode);
        config.enabled = cli_dev_mode;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::migrations::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    #[test]
    fn test_dev_mode_disabled_by_default() {
        let config = DevModeConfig::default();
        assert!(!config.is_enabled(), "Dev mode should be disabled by default");
    }

    #[test]
    fn test_cli_args_last_flag_wins() {
        let args = vec!["api".to_string(), "--dev".to_string()];
        assert_eq!(parse_dev_mode_args(args), Some(true));

        let args = vec!["--dev".to_string(), "--prod".to_string()];
        assert_eq!(parse_dev_mode_args(args), Some(false));

        assert_eq!(parse_dev_mode_args(vec!["api".to_string()]), None);
    }

    #[tokio::test]
    async fn test_ensure_dev_user_is_idempotent() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        let config = DevModeConfig {
            enabled: true,
            ..DevModeConfig::default()
        };

        let first = config.ensure_dev_user(&pool).await.unwrap();
        let second = config.ensure_dev_user(&pool).await.unwrap();

        assert_eq!(first.id, DEV_USER_ID);
        assert_eq!(second.id, first.id);
        assert_eq!(second.email, "dev@test.com");
    }
}
