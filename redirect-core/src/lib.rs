//! Referral redirect engine
//!
//! Platform-agnostic decision logic for the app-store referral redirector:
//! which destination a visitor gets, whether the referral code is copied to
//! the clipboard first, and when to hand control back to the visitor. The
//! browser side effects are reached only through the traits in [`ports`],
//! [`clipboard`] and [`schedule`].

pub mod clipboard;
pub mod config;
pub mod error;
pub mod fakes;
pub mod handoff;
pub mod links;
pub mod orchestrator;
pub mod platform;
pub mod ports;
pub mod referral;
pub mod schedule;

pub use clipboard::{ClipboardPort, CopyOutcome, CopyReport, CopyStrategy, TechniqueId};
pub use config::{CopyPolicy, MAX_TIMER_MS, RedirectConfig};
pub use error::{ConfigError, CopyError, RedirectError};
pub use handoff::AppHandoff;
pub use links::{DeepLinkEntry, DeepLinkTarget, LinkTable};
pub use orchestrator::{
    Orchestrator, RedirectDecision, RedirectOutcome, RedirectPorts, RedirectState,
};
pub use platform::{PlatformClassification, PlatformMarkers, classify};
pub use ports::{
    EnvironmentPort, NavigationPort, NavigationTarget, Notice, Notifier, SilentNotifier,
};
pub use referral::{DEFAULT_REFERRAL, REFERRAL_PARAM, ReferralCode, extract_referral};
pub use schedule::{Scheduler, VirtualScheduler};
