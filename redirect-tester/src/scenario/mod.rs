use redirect_core::{LinkTable, NavigationTarget, ReferralCode};

pub mod catalog;

pub use catalog::{catalog_scenarios, find_scenario, list_scenarios};

pub const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 18_2 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.0 Mobile/15E148 Safari/604.1";
pub const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";
pub const PRODUCTION_HOST: &str = "links.gamisodes.com";

/// How the scripted clipboard behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardSetup {
    Working,
    /// The async API is missing; the selection command works.
    AsyncMissing,
    /// Every technique refuses to write.
    Denied,
    /// The async API rejects the first `n` writes and the selection
    /// command always fails.
    Flaky(usize),
}

/// Inputs for one replay of the redirect flow.
#[derive(Debug, Clone)]
pub struct ScenarioSetup {
    pub search: String,
    /// `None` simulates an unreadable user agent.
    pub user_agent: Option<String>,
    pub hostname: String,
    pub impersonating: bool,
    pub clipboard: ClipboardSetup,
    pub refuse_app_uri: bool,
    /// Press "Continue to the App Store" if the flow stops in manual fallback.
    pub resume_manual: bool,
}

impl ScenarioSetup {
    #[must_use]
    pub fn new(search: &str, user_agent: &str) -> Self {
        Self {
            search: search.to_string(),
            user_agent: Some(user_agent.to_string()),
            hostname: PRODUCTION_HOST.to_string(),
            impersonating: false,
            clipboard: ClipboardSetup::Working,
            refuse_app_uri: false,
            resume_manual: false,
        }
    }

    #[must_use]
    pub fn on_host(mut self, hostname: &str) -> Self {
        self.hostname = hostname.to_string();
        self
    }

    #[must_use]
    pub const fn clipboard(mut self, clipboard: ClipboardSetup) -> Self {
        self.clipboard = clipboard;
        self
    }

    #[must_use]
    pub fn without_user_agent(mut self) -> Self {
        self.user_agent = None;
        self
    }

    #[must_use]
    pub const fn impersonating(mut self) -> Self {
        self.impersonating = true;
        self
    }

    #[must_use]
    pub const fn refusing_app_uri(mut self) -> Self {
        self.refuse_app_uri = true;
        self
    }

    #[must_use]
    pub const fn resuming_manually(mut self) -> Self {
        self.resume_manual = true;
        self
    }
}

/// Navigation a scenario expects, resolved against the link table at check time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedNav {
    AppUri(&'static str),
    /// Store URL the referral code resolves to.
    Store(&'static str),
}

impl ExpectedNav {
    #[must_use]
    pub fn resolve(self, links: &LinkTable) -> NavigationTarget {
        match self {
            Self::AppUri(code) => {
                NavigationTarget::AppUri(links.deep_link(&ReferralCode::new(code)).app_uri)
            }
            Self::Store(code) => {
                NavigationTarget::Store(links.resolve(&ReferralCode::new(code)).to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Expectation {
    pub navigations: Vec<ExpectedNav>,
    /// Label of the last state entered.
    pub final_state: Option<&'static str>,
    pub elapsed_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    pub setup: ScenarioSetup,
    pub expect: Expectation,
}
