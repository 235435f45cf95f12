// src/services/rate_limit.rs
//! Fixed-window request counters keyed by user, anonymous client and IP.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub authenticated_limit: u32,
    pub anonymous_limit: u32,
    pub per_ip_limit: u32,
    pub window_seconds: u64,
    pub allowlist_ips: Vec<String>,
    /// Peers whose `X-Forwarded-For` / `X-Real-IP` headers are believed
    pub trusted_proxies: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            authenticated_limit: 120,
            anonymous_limit: 30,
            per_ip_limit: 200,
            window_seconds: 60,
            allowlist_ips: vec!["127.0.0.1".to_string(), "::1".to_string()],
            trusted_proxies: Vec::new(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn parse_list(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|list| {
        list.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

impl RateLimitConfig {
    /// `RATE_LIMIT_*` variables override the defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(enabled) = env::var("RATE_LIMIT_ENABLED") {
            config.enabled = enabled.trim().to_lowercase() != "false";
        }
        if let Some(limit) = parse_var("RATE_LIMIT_AUTHENTICATED") {
            config.authenticated_limit = limit;
        }
        if let Some(limit) = parse_var("RATE_LIMIT_ANONYMOUS") {
            config.anonymous_limit = limit;
        }
        if let Some(limit) = parse_var("RATE_LIMIT_PER_IP") {
            config.per_ip_limit = limit;
        }
        if let Some(window) = parse_var::<u64>("RATE_LIMIT_WINDOW_SECONDS") {
            config.window_seconds = window.max(1);
        }
        if let Some(list) = parse_list("RATE_LIMIT_ALLOWLIST_IPS") {
            config.allowlist_ips = list;
        }
        if let Some(list) = parse_list("RATE_LIMIT_TRUSTED_PROXIES") {
            config.trusted_proxies = list;
        }

        config
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

#[derive(Debug, Clone)]
struct Window {
    count: u32,
    started: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited { retry_after: u64 },
}

/// Who a request is counted against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Client {
    User(String),
    Anonymous,
}

#[derive(Debug, Clone)]
pub struct RateLimitService {
    config: RateLimitConfig,
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl RateLimitService {
    pub fn new(config: RateLimitConfig) -> Self {
        info!(
            enabled = config.enabled,
            authenticated_limit = config.authenticated_limit,
            anonymous_limit = config.anonymous_limit,
            per_ip_limit = config.per_ip_limit,
            window_seconds = config.window_seconds,
            "Rate limiter configured"
        );
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Counts one request. The client key is checked first, then the IP.
    pub async fn check(&self, client: &Client, ip: Option<&str>) -> RateLimitResult {
        if !self.config.enabled {
            return RateLimitResult::Allowed;
        }
        if let Some(ip) = ip {
            if self.config.allowlist_ips.iter().any(|allowed| allowed == ip) {
                return RateLimitResult::Allowed;
            }
        }

        let (key, limit) = match client {
            Client::User(id) => (format!("user:{}", id), self.config.authenticated_limit),
            Client::Anonymous => (
                format!("anon:{}", ip.unwrap_or("unknown")),
                self.config.anonymous_limit,
            ),
        };

        let mut windows = self.windows.write().await;
        let result = self.hit(&mut windows, key, limit);
        if result != RateLimitResult::Allowed {
            return result;
        }

        match ip {
            Some(ip) => self.hit(&mut windows, format!("ip:{}", ip), self.config.per_ip_limit),
            None => RateLimitResult::Allowed,
        }
    }

    fn hit(&self, windows: &mut HashMap<String, Window>, key: String, limit: u32) -> RateLimitResult {
        let window = self.config.window();
        let entry = windows.entry(key).or_insert_with(|| Window {
            count: 0,
            started: Instant::now(),
        });

        if entry.started.elapsed() >= window {
            entry.count = 0;
            entry.started = Instant::now();
        }

        if entry.count >= limit {
            let remaining = window.saturating_sub(entry.started.elapsed());
            return RateLimitResult::Limited {
                retry_after: remaining.as_secs().max(1),
            };
        }

        entry.count += 1;
        RateLimitResult::Allowed
    }

    /// Drops windows that have run out
    pub async fn cleanup_expired(&self) {
        let window = self.config.window();
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, w| w.started.elapsed() < window);
        debug!(removed = before - windows.len(), "Cleaned up rate limit windows");
    }

    pub fn start_cleanup_task(self: Arc<Self>) {
        let period = self.config.window().max(Duration::from_secs(30));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                self.cleanup_expired().await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(authenticated: u32, anonymous: u32, per_ip: u32) -> RateLimitService {
        RateLimitService::new(RateLimitConfig {
            enabled: true,
            authenticated_limit: authenticated,
            anonymous_limit: anonymous,
            per_ip_limit: per_ip,
            window_seconds: 60,
            allowlist_ips: vec!["127.0.0.1".to_string()],
            trusted_proxies: Vec::new(),
        })
    }

    #[tokio::test]
    async fn test_user_limit_blocks_after_quota() {
        let limiter = service(3, 1, 100);
        let user = Client::User("U_1".to_string());

        for _ in 0..3 {
            assert_eq!(limiter.check(&user, Some("10.0.0.1")).await, RateLimitResult::Allowed);
        }
        match limiter.check(&user, Some("10.0.0.1")).await {
            RateLimitResult::Limited { retry_after } => assert!(retry_after >= 1 && retry_after <= 60),
            other => panic!("expected limit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_users_have_separate_windows() {
        let limiter = service(1, 1, 100);

        let first = Client::User("U_1".to_string());
        let second = Client::User("U_2".to_string());
        assert_eq!(limiter.check(&first, Some("10.0.0.1")).await, RateLimitResult::Allowed);
        assert!(matches!(
            limiter.check(&first, Some("10.0.0.1")).await,
            RateLimitResult::Limited { .. }
        ));
        assert_eq!(limiter.check(&second, Some("10.0.0.2")).await, RateLimitResult::Allowed);
    }

    #[tokio::test]
    async fn test_per_ip_limit_spans_users() {
        let limiter = service(100, 100, 2);

        for i in 0..2 {
            let user = Client::User(format!("U_{}", i));
            assert_eq!(limiter.check(&user, Some("10.0.0.9")).await, RateLimitResult::Allowed);
        }
        let another = Client::User("U_9".to_string());
        assert!(matches!(
            limiter.check(&another, Some("10.0.0.9")).await,
            RateLimitResult::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn test_allowlisted_ip_is_never_limited() {
        let limiter = service(1, 1, 1);
        for _ in 0..10 {
            assert_eq!(
                limiter.check(&Client::Anonymous, Some("127.0.0.1")).await,
                RateLimitResult::Allowed
            );
        }
    }

    #[tokio::test]
    async fn test_disabled_limiter_allows_everything() {
        let limiter = RateLimitService::new(RateLimitConfig {
            enabled: false,
            anonymous_limit: 0,
            ..RateLimitConfig::default()
        });
        assert_eq!(
            limiter.check(&Client::Anonymous, Some("10.1.1.1")).await,
            RateLimitResult::Allowed
        );
    }

    #[tokio::test]
    async fn test_cleanup_keeps_live_windows() {
        let limiter = service(5, 5, 5);
        limiter.check(&Client::Anonymous, Some("10.0.0.3")).await;
        limiter.cleanup_expired().await;
        assert_eq!(limiter.windows.read().await.len(), 2);
    }
}
