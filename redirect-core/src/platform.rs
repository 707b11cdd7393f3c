//! User-agent classification.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformClassification {
    /// A device from the mobile family that receives copy + deep-link handling.
    TargetMobile,
    Other,
}

impl PlatformClassification {
    #[must_use]
    pub const fn is_target(self) -> bool {
        matches!(self, Self::TargetMobile)
    }
}

/// Substring markers used to recognise the target mobile family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformMarkers {
    /// Device-model and OS-name tokens.
    #[serde(default = "default_mobile_markers")]
    pub mobile: Vec<String>,
    /// Tokens from browsers that impersonate the target family.
    #[serde(default = "default_excluded_markers")]
    pub excluded: Vec<String>,
}

fn default_mobile_markers() -> Vec<String> {
    ["iPad", "iPhone", "iPod", "iOS", "Mac OS", "like Mac OS"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_excluded_markers() -> Vec<String> {
    ["Windows Phone", "IEMobile"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for PlatformMarkers {
    fn default() -> Self {
        Self {
            mobile: default_mobile_markers(),
            excluded: default_excluded_markers(),
        }
    }
}

impl PlatformMarkers {
    /// Case-sensitive substring classification.
    #[must_use]
    pub fn classify(&self, user_agent: &str) -> PlatformClassification {
        let matched = self
            .mobile
            .iter()
            .find(|marker| user_agent.contains(marker.as_str()));
        let excluded = self
            .excluded
            .iter()
            .any(|marker| user_agent.contains(marker.as_str()));

        match matched {
            Some(marker) if !excluded => {
                log::debug!("user agent matched mobile marker `{marker}`");
                PlatformClassification::TargetMobile
            }
            _ => PlatformClassification::Other,
        }
    }
}

/// Classify with the default marker set.
#[must_use]
pub fn classify(user_agent: &str) -> PlatformClassification {
    PlatformMarkers::default().classify(user_agent)
}
