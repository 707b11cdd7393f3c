//! Deep-link table and store URL resolution.
use crate::error::ConfigError;
use crate::referral::ReferralCode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

const DEFAULT_LINK_DATA: &str =
    include_str!("../../redirect-web/static/assets/data/deep_links.json");

pub const FALLBACK_STORE_URL: &str = "https://apps.apple.com/us/app/gamisodes/id6691440023?ppid=da6284ac-d8ec-4ba7-9a34-790e29216777";
pub const FALLBACK_APP_URI: &str = "gamisodes://babyeinstein";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLinkEntry {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub campaign: String,
    pub referral_code: String,
    pub url: String,
    /// Overrides the table-wide app URI for this code.
    #[serde(default)]
    pub app_uri: Option<String>,
}

/// Where a target-platform visitor should be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeepLinkTarget {
    pub app_uri: String,
    pub store_url: String,
}

#[derive(Debug, Deserialize)]
struct RawLinkTable {
    #[serde(default = "fallback_store_url")]
    default_url: String,
    #[serde(default = "fallback_app_uri")]
    app_uri: String,
    #[serde(default)]
    entries: Vec<DeepLinkEntry>,
}

fn fallback_store_url() -> String {
    FALLBACK_STORE_URL.to_string()
}

fn fallback_app_uri() -> String {
    FALLBACK_APP_URI.to_string()
}

/// Immutable referral-code lookup table.
///
/// Holds at most one entry per referral code and only well-formed URLs, so
/// resolution is a total function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkTable {
    default_url: String,
    app_uri: String,
    entries: Vec<DeepLinkEntry>,
}

impl LinkTable {
    /// Build a validated table.
    ///
    /// # Errors
    ///
    /// Returns an error when two entries share a referral code or when any
    /// URL fails to parse.
    pub fn new(
        default_url: impl Into<String>,
        app_uri: impl Into<String>,
        entries: Vec<DeepLinkEntry>,
    ) -> Result<Self, ConfigError> {
        let default_url = default_url.into();
        let app_uri = app_uri.into();
        check_url(&default_url)?;
        check_url(&app_uri)?;

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.referral_code.as_str()) {
                return Err(ConfigError::DuplicateReferral(entry.referral_code.clone()));
            }
            check_url(&entry.url)?;
            if let Some(uri) = entry.app_uri.as_deref() {
                check_url(uri)?;
            }
        }

        Ok(Self {
            default_url,
            app_uri,
            entries,
        })
    }

    /// Parse and validate a table from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the table fails validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawLinkTable = serde_json::from_str(json)?;
        Self::new(raw.default_url, raw.app_uri, raw.entries)
    }

    /// Table bundled with the web assets, or an empty table on the fallback
    /// URLs if the bundle is unusable.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_LINK_DATA).unwrap_or_else(|err| {
            log::error!("bundled deep-link table rejected: {err}");
            Self::empty()
        })
    }

    /// Process-wide copy of the bundled table.
    #[must_use]
    pub fn bundled() -> &'static Self {
        static TABLE: OnceLock<LinkTable> = OnceLock::new();
        TABLE.get_or_init(Self::load_from_static)
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            default_url: fallback_store_url(),
            app_uri: fallback_app_uri(),
            entries: Vec::new(),
        }
    }

    /// Copy of this table with one more entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is already present or the URL is invalid.
    pub fn with_entry(&self, entry: DeepLinkEntry) -> Result<Self, ConfigError> {
        let mut entries = self.entries.clone();
        entries.push(entry);
        Self::new(self.default_url.clone(), self.app_uri.clone(), entries)
    }

    #[must_use]
    pub fn entry(&self, code: &ReferralCode) -> Option<&DeepLinkEntry> {
        self.entries
            .iter()
            .find(|entry| entry.referral_code == code.as_str())
    }

    /// Store URL for a referral code; the default URL when nothing matches.
    #[must_use]
    pub fn resolve(&self, code: &ReferralCode) -> &str {
        self.entry(code)
            .map_or(self.default_url.as_str(), |entry| entry.url.as_str())
    }

    #[must_use]
    pub fn deep_link(&self, code: &ReferralCode) -> DeepLinkTarget {
        let entry = self.entry(code);
        DeepLinkTarget {
            app_uri: entry
                .and_then(|e| e.app_uri.clone())
                .unwrap_or_else(|| self.app_uri.clone()),
            store_url: self.resolve(code).to_string(),
        }
    }

    #[must_use]
    pub fn default_url(&self) -> &str {
        &self.default_url
    }

    #[must_use]
    pub fn app_uri(&self) -> &str {
        &self.app_uri
    }

    #[must_use]
    pub fn entries(&self) -> &[DeepLinkEntry] {
        &self.entries
    }
}

impl Default for LinkTable {
    fn default() -> Self {
        Self::bundled().clone()
    }
}

fn check_url(raw: &str) -> Result<(), ConfigError> {
    url::Url::parse(raw)
        .map(|_| ())
        .map_err(|source| ConfigError::InvalidUrl {
            url: raw.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: &str, url: &str) -> DeepLinkEntry {
        DeepLinkEntry {
            platform: "EMAIL".into(),
            campaign: "TEST".into(),
            referral_code: code.into(),
            url: url.into(),
            app_uri: None,
        }
    }

    #[test]
    fn bundled_table_resolves_campaign_and_default() {
        let table = LinkTable::load_from_static();
        let campaign = table.resolve(&ReferralCode::new("babyeinsteinE1"));
        assert!(campaign.ends_with("&referrer=babyeinsteinE1"));
        assert_eq!(
            table.resolve(&ReferralCode::default_code()),
            table.default_url()
        );
        assert_eq!(table.app_uri(), FALLBACK_APP_URI);
    }

    #[test]
    fn unknown_codes_resolve_to_default() {
        let table = LinkTable::load_from_static();
        for code in ["nope", "BABYEINSTEINE1", "babyeinsteinE1 ", "ref"] {
            assert_eq!(table.resolve(&ReferralCode::new(code)), table.default_url());
        }
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let err = LinkTable::new(
            FALLBACK_STORE_URL,
            FALLBACK_APP_URI,
            vec![
                entry("dup", "https://example.com/a"),
                entry("dup", "https://example.com/b"),
            ],
        )
        .expect_err("duplicate code should be rejected");
        assert!(matches!(err, ConfigError::DuplicateReferral(code) if code == "dup"));
    }

    #[test]
    fn malformed_urls_are_rejected() {
        let err = LinkTable::new(
            FALLBACK_STORE_URL,
            FALLBACK_APP_URI,
            vec![entry("bad", "not a url")],
        )
        .expect_err("bad url should be rejected");
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn entry_app_uri_overrides_table_uri() {
        let mut custom = entry("app", "https://example.com/store");
        custom.app_uri = Some("gamisodes://special".into());
        let table = LinkTable::empty().with_entry(custom).expect("valid table");
        let target = table.deep_link(&ReferralCode::new("app"));
        assert_eq!(target.app_uri, "gamisodes://special");
        assert_eq!(target.store_url, "https://example.com/store");

        let fallback = table.deep_link(&ReferralCode::new("other"));
        assert_eq!(fallback.app_uri, FALLBACK_APP_URI);
        assert_eq!(fallback.store_url, FALLBACK_STORE_URL);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let table = LinkTable::from_json("{}").expect("empty object is a valid table");
        assert_eq!(table.default_url(), FALLBACK_STORE_URL);
        assert!(table.entries().is_empty());
    }
}
