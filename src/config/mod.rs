use std::time::Duration;

use tracing::warn;

use crate::{Deserialize, NotifierError};

pub const DEFAULT_TE_API_KEY: &str = "guest:guest";
pub const TE_API_URL: &str = "https://api.tradingeconomics.com/news";
pub const TE_SITE_URL: &str = "https://tradingeconomics.com";
pub const MAX_SEEN_IDS: usize = 3000;
pub const DEFAULT_LIMIT: usize = 20;
pub const DEFAULT_FEED_LIMIT: usize = 15;
pub const DEFAULT_INTERVAL_SECS: u64 = 900;
/// Loop mode never polls more often than this
pub const MIN_INTERVAL_SECS: u64 = 60;
const DEFAULT_STATE_FILE: &str = "./state/seen_ids.json";

pub const ENV_API_KEY: &str = "TRADING_ECONOMICS_API_KEY";
pub const ENV_WEBHOOK_URL: &str = "DISCORD_WEBHOOK_URL";
pub const ENV_RSS_ENABLED: &str = "RSS_ENABLED";
pub const ENV_INTERVAL: &str = "NOTIFIER_INTERVAL_SECONDS";
pub const ENV_FETCH_LIMIT: &str = "NOTIFIER_FETCH_LIMIT";
pub const ENV_STATE_FILE: &str = "NOTIFIER_STATE_FILE";

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RssSource {
    pub name: String,
    pub url: String,
}

impl RssSource {
    fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Feeds polled when the config file does not list its own
#[must_use]
pub fn default_rss_sources() -> Vec<RssSource> {
    vec![
        RssSource::new(
            "WSJ Markets",
            "https://feeds.content.dowjones.io/public/rss/RSSMarketsMain",
        ),
        RssSource::new(
            "WSJ Economy",
            "https://feeds.content.dowjones.io/public/rss/socialeconomyfeed",
        ),
        RssSource::new(
            "WSJ US Business",
            "https://feeds.content.dowjones.io/public/rss/WSJcomUSBusiness",
        ),
        RssSource::new(
            "NYT Business",
            "https://rss.nytimes.com/services/xml/rss/nyt/Business.xml",
        ),
        RssSource::new(
            "NYT World",
            "https://rss.nytimes.com/services/xml/rss/nyt/World.xml",
        ),
        RssSource::new(
            "NYT Technology",
            "https://rss.nytimes.com/services/xml/rss/nyt/Technology.xml",
        ),
        RssSource::new("FT Home", "https://www.ft.com/rss/home"),
        RssSource::new("FT World", "https://www.ft.com/world?format=rss"),
        RssSource::new(
            "FT Global Economy",
            "https://www.ft.com/global-economy?format=rss",
        ),
    ]
}

/// Application settings. Built once at start-up and passed by reference;
/// nothing else reads the process environment.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub te_api_key: String,
    pub te_api_url: String,
    pub te_site_url: String,
    pub discord_webhook_url: Option<String>,
    pub rss_enabled: bool,
    pub rss_sources: Vec<RssSource>,
    pub api_limit: usize,
    pub feed_limit: usize,
    pub interval_secs: u64,
    pub state_file: String,
    pub max_seen_ids: usize,
    pub send_delay_ms: u64,
    pub fetch_timeout_secs: u64,
    pub webhook_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            te_api_key: DEFAULT_TE_API_KEY.to_string(),
            te_api_url: TE_API_URL.to_string(),
            te_site_url: TE_SITE_URL.to_string(),
            discord_webhook_url: None,
            rss_enabled: true,
            rss_sources: default_rss_sources(),
            api_limit: DEFAULT_LIMIT,
            feed_limit: DEFAULT_FEED_LIMIT,
            interval_secs: DEFAULT_INTERVAL_SECS,
            state_file: DEFAULT_STATE_FILE.to_string(),
            max_seen_ids: MAX_SEEN_IDS,
            // ~1/sec keeps a single webhook under Discord's ~30/min limit
            send_delay_ms: 1000,
            fetch_timeout_secs: 15,
            webhook_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn from_file(file_name: &str) -> Result<Self, NotifierError> {
        let contents = std::fs::read_to_string(file_name)?;
        Self::from_str(&contents)
    }

    pub fn from_str(contents: &str) -> Result<Self, NotifierError> {
        let config: AppConfig = serde_json::from_str(contents)?;

        Ok(config)
    }

    /// Override settings from environment variables. `lookup` is
    /// `std::env::var` in the binary and a map in tests.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // a blank variable (`KEY=` in .env) leaves the configured value alone
        if let Some(key) = non_blank(&lookup, ENV_API_KEY) {
            self.te_api_key = key;
        }
        if self.te_api_key.trim().is_empty() {
            self.te_api_key = DEFAULT_TE_API_KEY.to_string();
        }
        if let Some(url) = non_blank(&lookup, ENV_WEBHOOK_URL) {
            self.discord_webhook_url = Some(url);
        }
        if let Some(flag) = lookup(ENV_RSS_ENABLED) {
            self.rss_enabled = parse_flag(&flag);
        }
        if let Some(secs) = parse_number(&lookup, ENV_INTERVAL) {
            self.interval_secs = secs;
        }
        if let Some(limit) = parse_number(&lookup, ENV_FETCH_LIMIT) {
            self.api_limit = limit;
        }
        if let Some(path) = non_blank(&lookup, ENV_STATE_FILE) {
            self.state_file = path;
        }
        self
    }

    /// The webhook endpoint; its absence is a configuration error that
    /// skips the whole cycle.
    pub fn webhook_url(&self) -> Result<&str, NotifierError> {
        match self.discord_webhook_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(NotifierError::Config(format!(
                "{ENV_WEBHOOK_URL} is not set; set it in .env or in the config file"
            ))),
        }
    }

    /// Interval between cycles in loop mode, never below the floor
    #[must_use]
    pub fn loop_interval(&self) -> Duration {
        if self.interval_secs < MIN_INTERVAL_SECS {
            warn!(
                interval = self.interval_secs,
                "interval is under {MIN_INTERVAL_SECS}s; using {MIN_INTERVAL_SECS}s to respect rate limits"
            );
            return Duration::from_secs(MIN_INTERVAL_SECS);
        }
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    #[must_use]
    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }
}

/// Anything but `false`, `0` or `no` turns the flag on
fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "false" | "0" | "no"
    )
}

fn non_blank<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_number<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = raw.as_str(), "ignoring non-numeric setting");
            None
        }
    }
}
