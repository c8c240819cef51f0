use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ENV_PREFIX: &str = "JOBSCOUT_";

/// Which ADP algorithm to run. Both produce the same records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AdpMode {
    /// Click each listing item, scrape its detail page, reload the list.
    #[default]
    Clickthrough,
    /// Read job ids from captured requisition JSON, then visit each detail URL.
    Intercept,
}

impl FromStr for AdpMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clickthrough" | "click-through" => Ok(Self::Clickthrough),
            "intercept" | "api-intercept" => Ok(Self::Intercept),
            other => Err(ConfigError::Invalid {
                key: "ADP_MODE".into(),
                value: other.into(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub navigation_timeout: Duration,
    pub greenhouse_timeout: Duration,
    pub greenhouse_probe: Duration,
    pub paylocity_timeout: Duration,
    pub paylocity_concurrency: usize,
    pub view_all_wait: Duration,
    pub list_wait: Duration,
    pub detail_wait: Duration,
    pub view_all_settle: Duration,
    pub intercept_settle: Duration,
    pub page_settle: Duration,
    pub adp_mode: AdpMode,
    pub adp_cid: Option<String>,
    pub adp_ccid: Option<String>,
    pub boilerplate_file: Option<PathBuf>,
    pub user_agent: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            greenhouse_timeout: Duration::from_secs(30),
            greenhouse_probe: Duration::from_secs(15),
            paylocity_timeout: Duration::from_secs(15),
            paylocity_concurrency: 16,
            view_all_wait: Duration::from_secs(5),
            list_wait: Duration::from_secs(10),
            detail_wait: Duration::from_secs(15),
            view_all_settle: Duration::from_millis(3000),
            intercept_settle: Duration::from_millis(5000),
            page_settle: Duration::from_millis(1000),
            adp_mode: AdpMode::default(),
            adp_cid: None,
            adp_ccid: None,
            boilerplate_file: None,
            user_agent: None,
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read `JOBSCOUT_*` variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Build settings from an arbitrary key lookup (keys without the prefix).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut s = Self::default();

        let secs = |key: &str, default: Duration| -> Result<Duration, ConfigError> {
            parse_or(&get, key, default.as_secs()).map(Duration::from_secs)
        };
        let millis = |key: &str, default: Duration| -> Result<Duration, ConfigError> {
            parse_or(&get, key, default.as_millis() as u64).map(Duration::from_millis)
        };

        s.navigation_timeout = secs("NAVIGATION_TIMEOUT_SECS", s.navigation_timeout)?;
        s.greenhouse_timeout = secs("GREENHOUSE_TIMEOUT_SECS", s.greenhouse_timeout)?;
        s.greenhouse_probe = secs("GREENHOUSE_PROBE_SECS", s.greenhouse_probe)?;
        s.paylocity_timeout = secs("PAYLOCITY_TIMEOUT_SECS", s.paylocity_timeout)?;
        s.paylocity_concurrency = parse_or(&get, "PAYLOCITY_CONCURRENCY", s.paylocity_concurrency)?;
        s.view_all_wait = secs("VIEW_ALL_WAIT_SECS", s.view_all_wait)?;
        s.list_wait = secs("LIST_WAIT_SECS", s.list_wait)?;
        s.detail_wait = secs("DETAIL_WAIT_SECS", s.detail_wait)?;
        s.view_all_settle = millis("VIEW_ALL_SETTLE_MS", s.view_all_settle)?;
        s.intercept_settle = millis("INTERCEPT_SETTLE_MS", s.intercept_settle)?;
        s.page_settle = millis("PAGE_SETTLE_MS", s.page_settle)?;

        if let Some(mode) = get("ADP_MODE") {
            s.adp_mode = mode.parse()?;
        }
        s.adp_cid = get("ADP_CID").filter(|v| !v.trim().is_empty());
        s.adp_ccid = get("ADP_CCID").filter(|v| !v.trim().is_empty());
        s.boilerplate_file = get("BOILERPLATE_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        s.user_agent = get("USER_AGENT").filter(|v| !v.trim().is_empty());

        if s.paylocity_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "PAYLOCITY_CONCURRENCY".into(),
                value: "0".into(),
            });
        }
        Ok(s)
    }

    /// Same bounds, no settle delays. Used where waiting buys nothing.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            view_all_settle: Duration::ZERO,
            intercept_settle: Duration::ZERO,
            page_settle: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
