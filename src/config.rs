use std::time::Duration;

use anyhow::Context;
use reqwest::Url;
use serde::{Deserialize, de::DeserializeOwned};

const DEFAULT_LOGIN_URL: &str = "https://login.dnevnik.ru/login";
const DEFAULT_FEED_URL: &str = "https://dnevnik.ru/userfeed";
const DEFAULT_MARKS_URL: &str = "https://dnevnik.ru/api/v2/marks";
const DEFAULT_SCHEDULE_URL: &str = "https://schools.dnevnik.ru/v2/schedules/view";
const DEFAULT_TIMEOUT_SECS: f64 = 10.0;
const DEFAULT_LOG_TARGET: &str = "dnevnik_scraper::portal";

/// The env config env vars needed for scraping.
#[derive(Debug, Deserialize)]
pub struct ScrapingEnv {
    #[serde(default = "default_login_url")]
    dnevnik_login_url: String,
    #[serde(default = "default_feed_url")]
    dnevnik_feed_url: String,
    #[serde(default = "default_marks_url")]
    dnevnik_marks_url: String,
    #[serde(default = "default_schedule_url")]
    dnevnik_schedule_url: String,
    #[serde(default = "default_timeout_secs")]
    dnevnik_timeout_secs: f64,
    #[serde(default = "default_log_target")]
    dnevnik_log_target: String,
}

fn default_login_url() -> String {
    DEFAULT_LOGIN_URL.to_string()
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_marks_url() -> String {
    DEFAULT_MARKS_URL.to_string()
}

fn default_schedule_url() -> String {
    DEFAULT_SCHEDULE_URL.to_string()
}

fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_log_target() -> String {
    DEFAULT_LOG_TARGET.to_string()
}

#[derive(Debug, Clone)]
pub struct ScrapingConfig {
    pub login_url: String,
    pub feed_url: String,
    pub marks_url: String,
    pub schedule_url: String,
    pub timeout: Duration,
    pub log_target: String,
}

impl ScrapingConfig {
    pub fn new() -> anyhow::Result<Self> {
        let scraping_env = ScrapingEnv::load_from_env()?;
        let timeout = Duration::try_from_secs_f64(scraping_env.dnevnik_timeout_secs)
            .context("DNEVNIK_TIMEOUT_SECS must be a non-negative number of seconds")?;
        Ok(Self {
            login_url: scraping_env.dnevnik_login_url,
            feed_url: scraping_env.dnevnik_feed_url,
            marks_url: scraping_env.dnevnik_marks_url,
            schedule_url: scraping_env.dnevnik_schedule_url,
            timeout,
            log_target: scraping_env.dnevnik_log_target,
        })
    }

    /// Same endpoints layout as the live portal, rooted at `base_url`.
    pub fn for_base_url(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            login_url: format!("{base_url}/login"),
            feed_url: format!("{base_url}/userfeed"),
            marks_url: format!("{base_url}/api/v2/marks"),
            schedule_url: format!("{base_url}/v2/schedules/view"),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `<marks_url>/school/{school_id}/person/{person_id}`, ids escaped as
    /// single path segments.
    pub fn get_marks_url(&self, school_id: &str, person_id: &str) -> anyhow::Result<String> {
        let mut url = Url::parse(&self.marks_url)
            .with_context(|| format!("invalid marks url: {}", self.marks_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("marks url cannot take a path: {}", self.marks_url))?
            .pop_if_empty()
            .extend(["school", school_id, "person", person_id]);
        Ok(url.to_string())
    }

    pub fn get_schedule_url(&self, school_id: &str, group_id: &str) -> anyhow::Result<String> {
        let url = Url::parse_with_params(
            &self.schedule_url,
            &[("school", school_id), ("group", group_id)],
        )
        .with_context(|| format!("invalid schedule url: {}", self.schedule_url))?;
        Ok(url.to_string())
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            feed_url: default_feed_url(),
            marks_url: default_marks_url(),
            schedule_url: default_schedule_url(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            log_target: default_log_target(),
        }
    }
}

/// The env config env vars needed for serving the HTTP api.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
