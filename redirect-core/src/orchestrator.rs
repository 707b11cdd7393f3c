//! Redirect state machine.
//!
//! `Start -> Classifying -> {ImmediateRedirect | CopyAttempt} ->
//! {DeepLinkAttempt | StoreRedirect | ManualFallback} -> Navigated`
//!
//! Every fault surfaces as a [`RedirectError`] and is turned into a single
//! store navigation by [`Orchestrator::run`], so the visitor is never left on
//! the redirect page without a way forward.
use crate::clipboard::{ClipboardPort, CopyOutcome, CopyStrategy};
use crate::config::RedirectConfig;
use crate::error::RedirectError;
use crate::links::LinkTable;
use crate::platform::PlatformClassification;
use crate::ports::{EnvironmentPort, NavigationPort, NavigationTarget, Notice, Notifier};
use crate::referral::{ReferralCode, extract_referral};
use crate::schedule::Scheduler;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum RedirectState {
    Start,
    Classifying,
    ImmediateRedirect,
    CopyAttempt { attempt: u32 },
    DeepLinkAttempt,
    StoreRedirect,
    ManualFallback,
    Navigated { target: NavigationTarget },
}

impl RedirectState {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Classifying => "classifying",
            Self::ImmediateRedirect => "immediate-redirect",
            Self::CopyAttempt { .. } => "copy-attempt",
            Self::DeepLinkAttempt => "deep-link-attempt",
            Self::StoreRedirect => "store-redirect",
            Self::ManualFallback => "manual-fallback",
            Self::Navigated { .. } => "navigated",
        }
    }
}

impl fmt::Display for RedirectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CopyAttempt { attempt } => write!(f, "copy-attempt #{attempt}"),
            Self::Navigated { target } => write!(f, "navigated to {target}"),
            other => f.write_str(other.label()),
        }
    }
}

/// What one page visit decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectDecision {
    pub referral_code: ReferralCode,
    /// `None` when the user agent could not be read.
    pub classification: Option<PlatformClassification>,
    pub resolved_url: String,
    /// `None` when no copy was attempted.
    pub copy_outcome: Option<CopyOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum RedirectOutcome {
    Navigated {
        target: NavigationTarget,
        decision: RedirectDecision,
    },
    /// Automatic copy gave up; waiting for the visitor to act.
    ManualFallback { decision: RedirectDecision },
    /// A step failed and the flow fell back to the store URL. `target` is
    /// `None` when a store navigation had already been issued or could not be.
    Recovered {
        #[serde(serialize_with = "serialize_display")]
        error: RedirectError,
        target: Option<NavigationTarget>,
        decision: RedirectDecision,
    },
}

fn serialize_display<S: serde::Serializer>(
    value: &RedirectError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl RedirectOutcome {
    #[must_use]
    pub const fn decision(&self) -> &RedirectDecision {
        match self {
            Self::Navigated { decision, .. }
            | Self::ManualFallback { decision }
            | Self::Recovered { decision, .. } => decision,
        }
    }

    /// Final navigation target, if the flow left the page.
    #[must_use]
    pub const fn target(&self) -> Option<&NavigationTarget> {
        match self {
            Self::Navigated { target, .. } => Some(target),
            Self::Recovered { target, .. } => target.as_ref(),
            Self::ManualFallback { .. } => None,
        }
    }
}

/// Browser capabilities handed to the orchestrator.
#[derive(Clone)]
pub struct RedirectPorts {
    pub environment: Rc<dyn EnvironmentPort>,
    pub navigator: Rc<dyn NavigationPort>,
    /// Available clipboard techniques, in any order.
    pub clipboard: Vec<Rc<dyn ClipboardPort>>,
    pub scheduler: Rc<dyn Scheduler>,
    pub notifier: Rc<dyn Notifier>,
}

type Observer = Rc<dyn Fn(&RedirectState)>;

struct RunState {
    trace: RefCell<Vec<RedirectState>>,
    decision: RefCell<RedirectDecision>,
    store_issued: Cell<bool>,
    manual_resumed: Cell<bool>,
}

impl RunState {
    fn new(default_url: &str) -> Self {
        Self {
            trace: RefCell::new(Vec::new()),
            decision: RefCell::new(RedirectDecision {
                referral_code: ReferralCode::default_code(),
                classification: None,
                resolved_url: default_url.to_string(),
                copy_outcome: None,
            }),
            store_issued: Cell::new(false),
            manual_resumed: Cell::new(false),
        }
    }
}

/// Sequences classification, clipboard copy and navigation for one visit.
///
/// Cloning is cheap and clones share the same run state, so a clone can be
/// moved into a spawned task while the original inspects the trace.
#[derive(Clone)]
pub struct Orchestrator {
    config: Rc<RedirectConfig>,
    links: Rc<LinkTable>,
    copy: CopyStrategy,
    ports: RedirectPorts,
    observer: Option<Observer>,
    run: Rc<RunState>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: RedirectConfig, links: LinkTable, ports: RedirectPorts) -> Self {
        let copy = CopyStrategy::ordered(&ports.clipboard, &config.copy.techniques);
        let run = Rc::new(RunState::new(links.default_url()));
        Self {
            config: Rc::new(config),
            links: Rc::new(links),
            copy,
            ports,
            observer: None,
            run,
        }
    }

    /// Call `observer` on every state transition.
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(&RedirectState) + 'static) -> Self {
        self.observer = Some(Rc::new(observer));
        self
    }

    #[must_use]
    pub fn config(&self) -> &RedirectConfig {
        &self.config
    }

    #[must_use]
    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    #[must_use]
    pub const fn copy_strategy(&self) -> &CopyStrategy {
        &self.copy
    }

    #[must_use]
    pub fn trace(&self) -> Vec<RedirectState> {
        self.run.trace.borrow().clone()
    }

    #[must_use]
    pub fn state(&self) -> Option<RedirectState> {
        self.run.trace.borrow().last().cloned()
    }

    #[must_use]
    pub fn decision(&self) -> RedirectDecision {
        self.run.decision.borrow().clone()
    }

    /// Run the whole flow from page load.
    pub async fn run(&self) -> RedirectOutcome {
        match self.try_run().await {
            Ok(outcome) => outcome,
            Err(error) => self.recover(error),
        }
    }

    /// Continue from [`RedirectState::ManualFallback`] after the visitor
    /// activated the manual control: copy inside the gesture, then leave.
    ///
    /// Returns `None` when the flow is not waiting in manual fallback, so
    /// repeated taps are ignored.
    pub async fn resume_manual(&self) -> Option<RedirectOutcome> {
        if self.state() != Some(RedirectState::ManualFallback) || self.run.manual_resumed.get() {
            log::warn!("manual redirect requested outside manual fallback; ignoring");
            return None;
        }
        self.run.manual_resumed.set(true);
        let outcome = match self.try_resume_manual().await {
            Ok(outcome) => outcome,
            Err(error) => self.recover(error),
        };
        Some(outcome)
    }

    async fn try_run(&self) -> Result<RedirectOutcome, RedirectError> {
        self.enter(RedirectState::Start);
        let search = self.ports.environment.location_search()?;
        let code = extract_referral(&search);
        let resolved_url = self.links.resolve(&code).to_string();
        log::info!("referral code `{code}` resolves to {resolved_url}");
        {
            let mut decision = self.run.decision.borrow_mut();
            decision.referral_code = code.clone();
            decision.resolved_url = resolved_url;
        }

        self.enter(RedirectState::Classifying);
        let user_agent = self.ports.environment.user_agent()?;
        let classification = if self.ports.environment.impersonating_browser() {
            PlatformClassification::Other
        } else {
            self.config.platform.classify(&user_agent)
        };
        self.run.decision.borrow_mut().classification = Some(classification);

        if !classification.is_target() {
            self.enter(RedirectState::ImmediateRedirect);
            return self.store_redirect();
        }

        match self.copy_with_retries(&code).await {
            CopyOutcome::Succeeded => {
                self.ports.scheduler.sleep(self.config.settle_delay()).await;
                self.deep_link(&code).await
            }
            CopyOutcome::Failed => {
                self.ports.notifier.notify(Notice::CopyFailed {
                    code: code.to_string(),
                });
                self.enter(RedirectState::ManualFallback);
                Ok(RedirectOutcome::ManualFallback {
                    decision: self.decision(),
                })
            }
        }
    }

    async fn try_resume_manual(&self) -> Result<RedirectOutcome, RedirectError> {
        let code = self.decision().referral_code;
        let report = self
            .copy
            .copy_and_notify(code.as_str(), self.ports.notifier.as_ref())
            .await;
        self.run.decision.borrow_mut().copy_outcome = Some(report.outcome);
        self.deep_link(&code).await
    }

    async fn copy_with_retries(&self, code: &ReferralCode) -> CopyOutcome {
        let policy = &self.config.copy;
        for attempt in 1..=policy.max_attempts {
            let delay = policy.delay_for(attempt);
            if !delay.is_zero() {
                self.ports.scheduler.sleep(delay).await;
            }
            self.enter(RedirectState::CopyAttempt { attempt });
            let report = self.copy.attempt_copy(code.as_str()).await;
            self.run.decision.borrow_mut().copy_outcome = Some(report.outcome);
            if report.outcome.succeeded() {
                self.ports.notifier.notify(Notice::Copied {
                    code: code.to_string(),
                });
                return CopyOutcome::Succeeded;
            }
        }
        log::warn!(
            "referral code not copied after {} attempts",
            policy.max_attempts
        );
        CopyOutcome::Failed
    }

    async fn deep_link(&self, code: &ReferralCode) -> Result<RedirectOutcome, RedirectError> {
        self.enter(RedirectState::DeepLinkAttempt);
        let hostname = self.ports.environment.hostname()?;
        if self.config.is_staging_host(&hostname) {
            log::info!("non-production host `{hostname}`, skipping app URI");
            return self.store_redirect();
        }

        let target = self.links.deep_link(code);
        self.navigate(&NavigationTarget::AppUri(target.app_uri))?;
        self.ports
            .scheduler
            .sleep(self.config.deep_link_timeout())
            .await;
        log::info!("{}", RedirectError::DeepLinkTimeout);
        self.store_redirect()
    }

    fn store_redirect(&self) -> Result<RedirectOutcome, RedirectError> {
        self.enter(RedirectState::StoreRedirect);
        let decision = self.decision();
        let target = NavigationTarget::Store(decision.resolved_url.clone());
        self.navigate(&target)?;
        self.enter(RedirectState::Navigated {
            target: target.clone(),
        });
        Ok(RedirectOutcome::Navigated { target, decision })
    }

    fn navigate(&self, target: &NavigationTarget) -> Result<(), RedirectError> {
        if target.is_store() {
            self.run.store_issued.set(true);
        }
        log::info!("navigating to {target}");
        self.ports.navigator.navigate(target)
    }

    fn recover(&self, error: RedirectError) -> RedirectOutcome {
        log::error!("redirect failed, falling back to the store: {error}");
        let decision = self.decision();
        let target = if self.run.store_issued.get() {
            None
        } else {
            self.enter(RedirectState::StoreRedirect);
            let target = NavigationTarget::Store(decision.resolved_url.clone());
            match self.navigate(&target) {
                Ok(()) => {
                    self.enter(RedirectState::Navigated {
                        target: target.clone(),
                    });
                    Some(target)
                }
                Err(nav_error) => {
                    log::error!("fallback store navigation failed: {nav_error}");
                    None
                }
            }
        };
        RedirectOutcome::Recovered {
            error,
            target,
            decision,
        }
    }

    fn enter(&self, state: RedirectState) {
        log::debug!("redirect state -> {state}");
        if let Some(observer) = self.observer.as_ref() {
            observer(&state);
        }
        self.run.trace.borrow_mut().push(state);
    }
}
