//! Referral code extraction from the page query string.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Query parameter carrying the referral code.
pub const REFERRAL_PARAM: &str = "ref";
/// Sentinel used when the visitor arrives without a referral code.
pub const DEFAULT_REFERRAL: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralCode(String);

impl ReferralCode {
    /// Wrap a raw value, collapsing empty input to the sentinel code.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.is_empty() {
            Self::default_code()
        } else {
            Self(raw)
        }
    }

    #[must_use]
    pub fn default_code() -> Self {
        Self(DEFAULT_REFERRAL.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_REFERRAL
    }
}

impl Default for ReferralCode {
    fn default() -> Self {
        Self::default_code()
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReferralCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Read the `ref` parameter from a location search string.
///
/// Accepts the string with or without its leading `?`. Only the first `ref`
/// pair counts; when it is empty or missing the sentinel code is returned.
#[must_use]
pub fn extract_referral(location_search: &str) -> ReferralCode {
    let query = location_search.strip_prefix('?').unwrap_or(location_search);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == REFERRAL_PARAM)
        .map_or_else(ReferralCode::default_code, |(_, value)| {
            ReferralCode::new(value.into_owned())
        })
}
