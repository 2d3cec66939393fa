use std::env;
use std::time::Duration;

use tracing::info;

/// Default identity pool rotated by the fetcher: a spread of ordinary
/// desktop and mobile browsers.
pub const DEFAULT_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0.3 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; rv:91.0) Gecko/20100101 Firefox/91.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 13_2_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.0.3 Mobile/15E148 Safari/604.1",
];

/// Default update triggers, deliberately spread across the day so the scrape
/// cadence has no single detectable period. Six-field cron form (with seconds).
pub const DEFAULT_SCHEDULES: [&str; 4] = [
    "0 0 8 * * *",
    "0 0 14 * * *",
    "0 0 20 * * *",
    "0 0 2 * * *",
];

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Source page
    pub team_url: String,
    pub team_name: String,

    // Fetch behavior
    pub fetch_timeout_secs: u64,
    pub fetch_retries: u32,
    pub fetch_retry_delay_secs: u64,
    pub fetch_proxy: Option<String>,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    pub user_agents: Vec<String>,

    // Sync behavior
    pub dedup_tolerance_mins: i64,
    pub write_delay_ms: u64,

    // Scheduling
    pub schedules: Vec<String>,

    // Store
    pub database_url: String,

    // Telegram
    pub telegram_token: String,
    pub admin_chat_id: Option<i64>,
}

impl Config {
    /// Load configuration from the environment, reading a `.env` file first
    /// when one exists.
    /// Panics with a clear message if required vars are missing or malformed.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let config = Self {
            team_url: env::var("TEAM_URL").unwrap_or_else(|_| {
                "https://www.hltv.org/team/8297/furia#tab-matchesBox".to_string()
            }),
            team_name: env::var("TEAM_NAME").unwrap_or_else(|_| "FURIA".to_string()),
            fetch_timeout_secs: parsed_env("FETCH_TIMEOUT_SECS", 15),
            fetch_retries: parsed_env("FETCH_RETRIES", 3),
            fetch_retry_delay_secs: parsed_env("FETCH_RETRY_DELAY_SECS", 5),
            fetch_proxy: env::var("FETCH_PROXY").ok(),
            jitter_min_ms: parsed_env("FETCH_JITTER_MIN_MS", 2000),
            jitter_max_ms: parsed_env("FETCH_JITTER_MAX_MS", 5000),
            user_agents: list_env("FETCH_USER_AGENTS", '|', &DEFAULT_USER_AGENTS),
            dedup_tolerance_mins: parsed_env("DEDUP_TOLERANCE_MINS", 60),
            write_delay_ms: parsed_env("SYNC_WRITE_DELAY_MS", 500),
            schedules: list_env("UPDATE_SCHEDULES", ',', &DEFAULT_SCHEDULES),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://matchday.db?mode=rwc".to_string()),
            telegram_token: required_env("TELEGRAM_TOKEN"),
            admin_chat_id: env::var("ADMIN_CHAT_ID")
                .ok()
                .map(|v| v.parse().expect("ADMIN_CHAT_ID must be a number")),
        };

        assert!(config.fetch_retries >= 1, "FETCH_RETRIES must be at least 1");
        assert!(
            config.jitter_min_ms <= config.jitter_max_ms,
            "FETCH_JITTER_MIN_MS must not exceed FETCH_JITTER_MAX_MS"
        );
        config
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn fetch_retry_delay(&self) -> Duration {
        Duration::from_secs(self.fetch_retry_delay_secs)
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }

    pub fn dedup_tolerance(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.dedup_tolerance_mins)
    }

    pub fn jitter_ms(&self) -> (u64, u64) {
        (self.jitter_min_ms, self.jitter_max_ms)
    }

    /// Log the effective configuration with the credential redacted.
    pub fn log_summary(&self) {
        info!(
            team = self.team_name.as_str(),
            url = self.team_url.as_str(),
            retries = self.fetch_retries,
            schedules = self.schedules.len(),
            identities = self.user_agents.len(),
            proxy = self.fetch_proxy.is_some(),
            admin_gate = self.admin_chat_id.is_some(),
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}

/// Split a delimited env var into non-empty trimmed entries, falling back to
/// the built-in defaults when unset or blank.
fn list_env(key: &str, separator: char, defaults: &[&str]) -> Vec<String> {
    let entries: Vec<String> = match env::var(key) {
        Ok(raw) => raw
            .split(separator)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Err(_) => Vec::new(),
    };

    if entries.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        entries
    }
}
