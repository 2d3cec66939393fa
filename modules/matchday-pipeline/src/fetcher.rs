//! Resilient page fetcher.
//!
//! The retry loop sits behind the `Transport` trait so tests can drive it
//! with canned responses; the real transport is a reqwest client with
//! browser-shaped headers, a rotating identity pool and optional proxy
//! routing.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use tracing::{debug, info, warn};

use matchday_common::config::DEFAULT_USER_AGENTS;
use matchday_common::{Config, MatchdayError};

/// Seam between the retry loop and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, user_agent: &str) -> Result<String, MatchdayError>;
}

/// Tunable fetch behavior. `Config` carries the environment mapping.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    /// Randomized pre-request pause, min..=max milliseconds.
    pub jitter_ms: (u64, u64),
    pub user_agents: Vec<String>,
    pub proxy: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            retries: 3,
            retry_delay: Duration::from_secs(5),
            jitter_ms: (2000, 5000),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            proxy: None,
        }
    }
}

impl From<&Config> for FetchConfig {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.fetch_timeout(),
            retries: config.fetch_retries,
            retry_delay: config.fetch_retry_delay(),
            jitter_ms: config.jitter_ms(),
            user_agents: config.user_agents.clone(),
            proxy: config.fetch_proxy.clone(),
        }
    }
}

/// Live HTTP transport. Static headers mimic an ordinary browser session;
/// compression negotiation is left to reqwest so bodies arrive decoded.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, MatchdayError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers);
        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| MatchdayError::Config(format!("Invalid fetch proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().expect("Failed to build HTTP client");

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, user_agent: &str) -> Result<String, MatchdayError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| MatchdayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MatchdayError::Network(format!("HTTP {status} from {url}")));
        }

        response
            .text()
            .await
            .map_err(|e| MatchdayError::Network(e.to_string()))
    }
}

pub struct Fetcher {
    transport: Box<dyn Transport>,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(transport: Box<dyn Transport>, config: FetchConfig) -> Self {
        Self { transport, config }
    }

    /// Fetch `url`, pausing a randomized interval and rotating the browser
    /// identity before every attempt. An empty body counts as a failed
    /// attempt. Exhausting the retry budget maps to `MatchdayError::Blocked`.
    pub async fn fetch(&self, url: &str) -> Result<String, MatchdayError> {
        for attempt in 1..=self.config.retries {
            let pause = self.jitter();
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }

            let user_agent = self.pick_identity();
            debug!(url, attempt, "Fetching source page");
            match self.transport.get(url, user_agent).await {
                Ok(body) if !body.trim().is_empty() => {
                    info!(url, attempt, bytes = body.len(), "Fetched source page");
                    return Ok(body);
                }
                Ok(_) => warn!(url, attempt, "Source returned an empty page"),
                Err(e) => warn!(url, attempt, error = %e, "Fetch attempt failed"),
            }

            if attempt < self.config.retries {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        Err(MatchdayError::Blocked {
            attempts: self.config.retries,
        })
    }

    fn jitter(&self) -> Duration {
        let (min, max) = self.config.jitter_ms;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    fn pick_identity(&self) -> &str {
        let pool = &self.config.user_agents;
        &pool[rand::rng().random_range(0..pool.len())]
    }
}
