//! Redirect policy configuration.
use crate::clipboard::TechniqueId;
use crate::error::ConfigError;
use crate::platform::PlatformMarkers;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_REDIRECT_DATA: &str =
    include_str!("../../redirect-web/static/assets/data/redirect.json");

/// Longest delay a browser timer honours; larger values fire immediately.
pub const MAX_TIMER_MS: u64 = 2_147_483_647;

/// How many copy attempts to make and how long to wait between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,
    /// Techniques in the order they are tried.
    #[serde(default = "default_techniques")]
    pub techniques: Vec<TechniqueId>,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_delay_ms() -> u64 {
    300
}

const fn default_backoff_multiplier() -> u32 {
    2
}

fn default_techniques() -> Vec<TechniqueId> {
    vec![TechniqueId::AsyncClipboard, TechniqueId::SelectionCommand]
}

impl Default for CopyPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            techniques: default_techniques(),
        }
    }
}

impl CopyPolicy {
    /// Wait before the given 1-based attempt. The first attempt runs
    /// immediately; later ones back off geometrically.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = u64::from(self.backoff_multiplier).saturating_pow(attempt - 2);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectConfig {
    #[serde(default)]
    pub copy: CopyPolicy,
    /// Pause after a successful copy before leaving the page.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// How long the app gets to intercept the deep link.
    #[serde(default = "default_deep_link_timeout_ms")]
    pub deep_link_timeout_ms: u64,
    /// Hostname fragments of non-production hosting, where deep links are skipped.
    #[serde(default = "default_staging_hosts")]
    pub staging_hosts: Vec<String>,
    #[serde(default)]
    pub platform: PlatformMarkers,
}

const fn default_settle_delay_ms() -> u64 {
    1500
}

const fn default_deep_link_timeout_ms() -> u64 {
    1000
}

fn default_staging_hosts() -> Vec<String> {
    vec!["ec2".to_string(), "amazonaws.com".to_string()]
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            copy: CopyPolicy::default(),
            settle_delay_ms: default_settle_delay_ms(),
            deep_link_timeout_ms: default_deep_link_timeout_ms(),
            staging_hosts: default_staging_hosts(),
            platform: PlatformMarkers::default(),
        }
    }
}

impl RedirectConfig {
    /// Parse and validate configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the policy is invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_REDIRECT_DATA).unwrap_or_else(|err| {
            log::error!("bundled redirect config rejected: {err}");
            Self::default()
        })
    }

    /// Reject policies the orchestrator cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPolicy`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.copy.max_attempts == 0 {
            return Err(ConfigError::InvalidPolicy(
                "copy.max_attempts must be at least 1".into(),
            ));
        }
        if self.copy.backoff_multiplier == 0 {
            return Err(ConfigError::InvalidPolicy(
                "copy.backoff_multiplier must be at least 1".into(),
            ));
        }
        if self.copy.techniques.is_empty() {
            return Err(ConfigError::InvalidPolicy(
                "copy.techniques must name at least one technique".into(),
            ));
        }
        let longest_backoff = self.copy.delay_for(self.copy.max_attempts).as_millis();
        for (name, millis) in [
            ("settle_delay_ms", u128::from(self.settle_delay_ms)),
            ("deep_link_timeout_ms", u128::from(self.deep_link_timeout_ms)),
            ("copy backoff", longest_backoff),
        ] {
            if millis > u128::from(MAX_TIMER_MS) {
                return Err(ConfigError::InvalidPolicy(format!(
                    "{name} of {millis} ms exceeds the {MAX_TIMER_MS} ms timer limit"
                )));
            }
        }
        for (idx, technique) in self.copy.techniques.iter().enumerate() {
            if self.copy.techniques[..idx].contains(technique) {
                return Err(ConfigError::InvalidPolicy(format!(
                    "copy technique `{technique}` listed twice"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_staging_host(&self, hostname: &str) -> bool {
        self.staging_hosts
            .iter()
            .any(|marker| hostname.contains(marker.as_str()))
    }

    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub const fn deep_link_timeout(&self) -> Duration {
        Duration::from_millis(self.deep_link_timeout_ms)
    }
}
