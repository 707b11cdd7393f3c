//! Capability interfaces the orchestrator depends on.
//!
//! The web crate backs these with browser APIs; [`crate::fakes`] provides
//! in-memory versions.
use crate::error::RedirectError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "kebab-case")]
pub enum NavigationTarget {
    /// Web URL of the app's store listing.
    Store(String),
    /// App-specific URI that opens the installed app.
    AppUri(String),
}

impl NavigationTarget {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Store(url) | Self::AppUri(url) => url,
        }
    }

    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(url) => write!(f, "store {url}"),
            Self::AppUri(uri) => write!(f, "app {uri}"),
        }
    }
}

/// Full-page navigation.
pub trait NavigationPort {
    /// Leave the page for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::Navigation`] if the browser refuses the navigation.
    fn navigate(&self, target: &NavigationTarget) -> Result<(), RedirectError>;
}

/// Read-only inputs taken from the hosting page.
pub trait EnvironmentPort {
    /// Query string of the current location, including the leading `?`.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::Environment`] when the location is unreadable.
    fn location_search(&self) -> Result<String, RedirectError>;

    /// Browser identification string.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::Environment`] when the navigator is unreadable.
    fn user_agent(&self) -> Result<String, RedirectError>;

    /// Hostname serving the page.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::Environment`] when the location is unreadable.
    fn hostname(&self) -> Result<String, RedirectError>;

    /// Whether the browser is known to fake the target family's user agent
    /// through something other than the user-agent string itself.
    fn impersonating_browser(&self) -> bool {
        false
    }
}

/// Transient user-visible messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Notice {
    Copied { code: String },
    /// Automatic copy failed; the visitor should copy the code by hand.
    CopyFailed { code: String },
}

pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Notifier that drops every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, notice: Notice) {
        log::trace!("notice suppressed: {notice:?}");
    }
}
