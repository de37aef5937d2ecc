use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;
use crate::{Result, BASE_URL, CONTAINER_SELECTOR, DEFAULT_EXTENSION, USER_AGENT};

/// Retry parameters (optional `[retry]` section in the config file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 10,
        }
    }
}

/// What to do with a page whose attachment container holds no links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyContainerPolicy {
    /// Record the page as failed.
    #[default]
    Fail,
    /// Count the page as done, with nothing to download.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Page URLs are built as `{base_url}-{month}-{year}`.
    pub base_url: String,
    pub user_agent: String,
    /// CSS selector of the element holding the attachment links.
    pub container_selector: String,
    /// Extension given to every downloaded file.
    pub extension: String,
    /// Whole-request timeout for every GET.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Pause between two pages. 0 disables pacing.
    pub page_delay_secs: f64,
    pub empty_container: EmptyContainerPolicy,
    /// If missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.into(),
            user_agent: USER_AGENT.into(),
            container_selector: CONTAINER_SELECTOR.into(),
            extension: DEFAULT_EXTENSION.into(),
            timeout_secs: 60,
            connect_timeout_secs: 15,
            page_delay_secs: 0.0,
            empty_container: EmptyContainerPolicy::default(),
            retry: None,
        }
    }
}

impl ScraperConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: ScraperConfig = toml::from_str(&data)?;
        tracing::debug!("loaded config from {}: {:?}", path.display(), cfg);
        Ok(cfg)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// `None` when pacing is off (zero, negative or not a number).
    pub fn page_delay(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.page_delay_secs)
            .ok()
            .filter(|d| !d.is_zero())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let Some(retry) = &self.retry else {
            return RetryPolicy::default();
        };
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            base_delay: Duration::try_from_secs_f64(retry.base_delay_secs)
                .unwrap_or(defaults.base_delay),
            max_delay: Duration::from_secs(retry.max_delay_secs),
        }
    }
}
