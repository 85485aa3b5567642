use std::{fmt::Display, str::FromStr};
use tracing::{info, warn};

pub const DEFAULT_PAGESPEED_ENDPOINT: &str =
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// In-memory store is used when unset
    pub redis_url: Option<String>,
    /// Admin endpoints are locked when unset
    pub admin_token: Option<String>,
    pub pagespeed_api_key: Option<String>,
    pub pagespeed_endpoint: String,
    pub pagespeed_strategy: String,
    pub leaderboard_scan_limit: usize,
    pub share_scan_limit: usize,
    pub admin_recent_limit: usize,
    pub admin_top_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            redis_url: None,
            admin_token: None,
            pagespeed_api_key: None,
            pagespeed_endpoint: DEFAULT_PAGESPEED_ENDPOINT.to_string(),
            pagespeed_strategy: "mobile".to_string(),
            leaderboard_scan_limit: 10_000,
            share_scan_limit: 1_000,
            admin_recent_limit: 10,
            admin_top_limit: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            host: text("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            redis_url: text("REDIS_URL"),
            admin_token: text("ADMIN_TOKEN"),
            pagespeed_api_key: text("PAGESPEED_API_KEY"),
            pagespeed_endpoint: text("PAGESPEED_ENDPOINT").unwrap_or(defaults.pagespeed_endpoint),
            pagespeed_strategy: text("PAGESPEED_STRATEGY").unwrap_or(defaults.pagespeed_strategy),
            leaderboard_scan_limit: parse_or(
                &lookup,
                "LEADERBOARD_SCAN_LIMIT",
                defaults.leaderboard_scan_limit,
            ),
            share_scan_limit: parse_or(&lookup, "SHARE_SCAN_LIMIT", defaults.share_scan_limit),
            admin_recent_limit: parse_or(&lookup, "ADMIN_RECENT_LIMIT", defaults.admin_recent_limit),
            admin_top_limit: parse_or(&lookup, "ADMIN_TOP_LIMIT", defaults.admin_top_limit),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
    }
}
