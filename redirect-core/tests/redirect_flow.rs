use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::executor::LocalPool;
use futures::future::{Aborted, abortable};
use futures::task::LocalSpawnExt;
use redirect_core::fakes::{FakeClipboard, FakeEnvironment, FakeNavigator, RecordingNotifier, drive};
use redirect_core::{
    AppHandoff, ClipboardPort, CopyOutcome, LinkTable, NavigationTarget, Notice, Orchestrator,
    PlatformClassification, RedirectConfig, RedirectError, RedirectOutcome, RedirectPorts,
    RedirectState, TechniqueId, VirtualScheduler,
};

const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 18_2 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.0 Mobile/15E148 Safari/604.1";
const DESKTOP: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";
const PROD_HOST: &str = "links.gamisodes.com";
const CAMPAIGN: &str = "babyeinsteinE1";

struct Harness {
    orchestrator: Orchestrator,
    navigator: Rc<FakeNavigator>,
    notifier: Rc<RecordingNotifier>,
    scheduler: VirtualScheduler,
    clipboards: Vec<Rc<FakeClipboard>>,
}

impl Harness {
    fn new(environment: FakeEnvironment, clipboards: Vec<FakeClipboard>) -> Self {
        let navigator = Rc::new(FakeNavigator::default());
        let notifier = Rc::new(RecordingNotifier::default());
        let scheduler = VirtualScheduler::new();
        let clipboards: Vec<Rc<FakeClipboard>> = clipboards.into_iter().map(Rc::new).collect();
        let ports = RedirectPorts {
            environment: Rc::new(environment),
            navigator: navigator.clone(),
            clipboard: clipboards
                .iter()
                .map(|c| Rc::clone(c) as Rc<dyn ClipboardPort>)
                .collect(),
            scheduler: Rc::new(scheduler.clone()),
            notifier: notifier.clone(),
        };
        let orchestrator =
            Orchestrator::new(RedirectConfig::default(), LinkTable::load_from_static(), ports);
        Self {
            orchestrator,
            navigator,
            notifier,
            scheduler,
            clipboards,
        }
    }

    fn working(search: &str, user_agent: &str) -> Self {
        Self::new(
            FakeEnvironment::new(search, user_agent, PROD_HOST),
            vec![
                FakeClipboard::working(TechniqueId::AsyncClipboard),
                FakeClipboard::working(TechniqueId::SelectionCommand),
            ],
        )
    }

    fn run(&self) -> RedirectOutcome {
        let orchestrator = self.orchestrator.clone();
        drive(&self.scheduler, async move { orchestrator.run().await }).expect("flow completes")
    }

    fn resume(&self) -> Option<RedirectOutcome> {
        let orchestrator = self.orchestrator.clone();
        drive(&self.scheduler, async move { orchestrator.resume_manual().await })
            .expect("resume completes")
    }

    fn copy_calls(&self) -> usize {
        self.clipboards.iter().map(|c| c.calls()).sum()
    }
}

fn campaign_url() -> String {
    LinkTable::load_from_static()
        .resolve(&redirect_core::ReferralCode::new(CAMPAIGN))
        .to_string()
}

fn default_url() -> String {
    LinkTable::load_from_static().default_url().to_string()
}

#[test]
fn desktop_without_ref_goes_straight_to_default_store() {
    let h = Harness::working("", DESKTOP);
    let outcome = h.run();

    assert_eq!(
        h.navigator.navigations(),
        vec![NavigationTarget::Store(default_url())]
    );
    assert_eq!(h.copy_calls(), 0);
    assert_eq!(h.scheduler.now(), Duration::ZERO);
    assert_eq!(outcome.decision().classification, Some(PlatformClassification::Other));
    assert_eq!(outcome.decision().copy_outcome, None);
    assert!(outcome.decision().referral_code.is_default());
    assert_eq!(
        h.orchestrator.trace(),
        vec![
            RedirectState::Start,
            RedirectState::Classifying,
            RedirectState::ImmediateRedirect,
            RedirectState::StoreRedirect,
            RedirectState::Navigated {
                target: NavigationTarget::Store(default_url())
            },
        ]
    );
}

#[test]
fn desktop_with_campaign_ref_skips_copy() {
    let h = Harness::working("?ref=babyeinsteinE1", DESKTOP);
    h.run();
    assert_eq!(
        h.navigator.navigations(),
        vec![NavigationTarget::Store(campaign_url())]
    );
    assert_eq!(h.copy_calls(), 0);
    assert!(h.notifier.notices().is_empty());
}

#[test]
fn iphone_campaign_copies_then_tries_app_before_store() {
    let h = Harness::working("?ref=babyeinsteinE1", IPHONE);
    let outcome = h.run();

    assert_eq!(
        h.navigator.navigations(),
        vec![
            NavigationTarget::AppUri("gamisodes://babyeinstein".into()),
            NavigationTarget::Store(campaign_url()),
        ]
    );
    assert_eq!(outcome.target(), Some(&NavigationTarget::Store(campaign_url())));
    assert_eq!(outcome.decision().resolved_url, campaign_url());
    assert_eq!(outcome.decision().copy_outcome, Some(CopyOutcome::Succeeded));
    assert_eq!(h.clipboards[0].contents().as_deref(), Some(CAMPAIGN));
    assert_eq!(h.clipboards[1].calls(), 0);
    assert_eq!(
        h.notifier.notices(),
        vec![Notice::Copied {
            code: CAMPAIGN.into()
        }]
    );
    // settle delay + deep-link timeout
    assert_eq!(h.scheduler.now(), Duration::from_millis(2500));
    assert_eq!(h.scheduler.pending_timers(), 0);
}

#[test]
fn app_taking_over_cancels_store_fallback() {
    let h = Harness::working("?ref=babyeinsteinE1", IPHONE);
    let orchestrator = h.orchestrator.clone();
    let (task, handle) = abortable(async move { orchestrator.run().await });
    h.navigator.intercept_app_with(handle);

    let result = drive(&h.scheduler, task).expect("task settles");
    assert!(result.is_err(), "flow should be aborted by the app taking over");
    assert_eq!(
        h.navigator.navigations(),
        vec![NavigationTarget::AppUri("gamisodes://babyeinstein".into())]
    );
    assert_eq!(h.scheduler.pending_timers(), 0);
    assert_eq!(h.orchestrator.state(), Some(RedirectState::DeepLinkAttempt));
}

type Settled = Rc<RefCell<Option<Result<RedirectOutcome, Aborted>>>>;

/// Spawn the flow the way the page does: abortable, tracked by `handoff`,
/// with every state fed through the handoff.
fn spawn_with_handoff(h: &Harness, handoff: &AppHandoff) -> (LocalPool, Settled) {
    let observed = handoff.clone();
    let orchestrator = h
        .orchestrator
        .clone()
        .with_observer(move |state| observed.observe(state));
    let (task, handle) = abortable(async move { orchestrator.run().await });
    handoff.track(handle);

    let pool = LocalPool::new();
    let settled: Settled = Rc::new(RefCell::new(None));
    let out = Rc::clone(&settled);
    pool.spawner()
        .spawn_local(async move {
            *out.borrow_mut() = Some(task.await);
        })
        .expect("spawn flow");
    (pool, settled)
}

fn run_to_end(h: &Harness, pool: &mut LocalPool, settled: &Settled) {
    pool.run_until_stalled();
    while settled.borrow().is_none() && h.scheduler.advance_to_next() {
        pool.run_until_stalled();
    }
}

#[test]
fn hiding_the_page_during_copy_retries_does_not_strand_the_visitor() {
    let h = Harness::new(
        FakeEnvironment::new("?ref=babyeinsteinE1", IPHONE, PROD_HOST),
        vec![FakeClipboard::flaky(TechniqueId::AsyncClipboard, 2)],
    );
    let handoff = AppHandoff::new();
    let (mut pool, settled) = spawn_with_handoff(&h, &handoff);

    pool.run_until_stalled();
    assert_eq!(h.orchestrator.state(), Some(RedirectState::CopyAttempt { attempt: 1 }));
    assert_eq!(h.scheduler.pending_timers(), 1, "backoff before attempt 2");
    assert!(!handoff.page_hidden());

    run_to_end(&h, &mut pool, &settled);
    let outcome = settled
        .borrow_mut()
        .take()
        .expect("flow settles")
        .expect("flow is not aborted");
    assert_eq!(outcome.target(), Some(&NavigationTarget::Store(campaign_url())));
    assert_eq!(
        h.navigator.navigations(),
        vec![
            NavigationTarget::AppUri("gamisodes://babyeinstein".into()),
            NavigationTarget::Store(campaign_url()),
        ]
    );
}

#[test]
fn hiding_the_page_during_the_settle_delay_still_redirects() {
    let h = Harness::working("?ref=babyeinsteinE1", IPHONE);
    let handoff = AppHandoff::new();
    let (mut pool, settled) = spawn_with_handoff(&h, &handoff);

    pool.run_until_stalled();
    assert_eq!(h.orchestrator.state(), Some(RedirectState::CopyAttempt { attempt: 1 }));
    assert!(!handoff.page_hidden());

    run_to_end(&h, &mut pool, &settled);
    assert!(matches!(settled.borrow().as_ref(), Some(Ok(_))));
    assert_eq!(h.navigator.store_navigations(), 1);
}

#[test]
fn hiding_the_page_after_opening_the_app_cancels_store_fallback() {
    let h = Harness::working("?ref=babyeinsteinE1", IPHONE);
    let handoff = AppHandoff::new();
    let (mut pool, settled) = spawn_with_handoff(&h, &handoff);

    pool.run_until_stalled();
    assert!(h.scheduler.advance_to_next(), "settle delay");
    pool.run_until_stalled();
    assert_eq!(h.orchestrator.state(), Some(RedirectState::DeepLinkAttempt));
    assert!(handoff.app_opened());

    assert!(handoff.page_hidden());
    pool.run_until_stalled();
    assert!(matches!(settled.borrow().as_ref(), Some(Err(Aborted))));
    assert_eq!(h.navigator.store_navigations(), 0);
    assert_eq!(h.scheduler.pending_timers(), 0);
}

#[test]
fn async_clipboard_failure_falls_back_to_selection() {
    let h = Harness::new(
        FakeEnvironment::new("?ref=promo42", IPHONE, PROD_HOST),
        vec![
            FakeClipboard::unavailable(TechniqueId::AsyncClipboard),
            FakeClipboard::working(TechniqueId::SelectionCommand),
        ],
    );
    let outcome = h.run();
    assert_eq!(outcome.decision().copy_outcome, Some(CopyOutcome::Succeeded));
    assert_eq!(h.clipboards[1].contents().as_deref(), Some("promo42"));
    assert_eq!(h.navigator.store_navigations(), 1);
    assert_eq!(
        outcome.target(),
        Some(&NavigationTarget::Store(default_url()))
    );
}

#[test]
fn copy_is_retried_with_increasing_delays() {
    let h = Harness::new(
        FakeEnvironment::new("?ref=promo42", IPHONE, PROD_HOST),
        vec![FakeClipboard::flaky(TechniqueId::AsyncClipboard, 2)],
    );
    let outcome = h.run();

    assert_eq!(outcome.decision().copy_outcome, Some(CopyOutcome::Succeeded));
    assert_eq!(h.clipboards[0].calls(), 3);
    let attempts: Vec<_> = h
        .orchestrator
        .trace()
        .into_iter()
        .filter(|state| matches!(state, RedirectState::CopyAttempt { .. }))
        .collect();
    assert_eq!(
        attempts,
        vec![
            RedirectState::CopyAttempt { attempt: 1 },
            RedirectState::CopyAttempt { attempt: 2 },
            RedirectState::CopyAttempt { attempt: 3 },
        ]
    );
    // 300 + 600 of backoff, then settle and deep-link timeout
    assert_eq!(h.scheduler.now(), Duration::from_millis(900 + 1500 + 1000));
}

#[test]
fn exhausted_copy_ends_in_manual_fallback_without_navigation() {
    let h = Harness::new(
        FakeEnvironment::new("?ref=promo42", IPHONE, PROD_HOST),
        vec![
            FakeClipboard::rejecting(TechniqueId::AsyncClipboard),
            FakeClipboard::rejecting(TechniqueId::SelectionCommand),
        ],
    );
    let outcome = h.run();

    assert!(matches!(outcome, RedirectOutcome::ManualFallback { .. }));
    assert!(h.navigator.navigations().is_empty());
    assert_eq!(h.orchestrator.state(), Some(RedirectState::ManualFallback));
    assert_eq!(h.clipboards[0].calls(), 3);
    assert_eq!(h.clipboards[1].calls(), 3);
    assert_eq!(outcome.decision().copy_outcome, Some(CopyOutcome::Failed));
    assert_eq!(
        h.notifier.notices(),
        vec![Notice::CopyFailed {
            code: "promo42".into()
        }]
    );
    assert_eq!(h.scheduler.pending_timers(), 0);
}

#[test]
fn manual_activation_copies_then_navigates_once() {
    let h = Harness::new(
        FakeEnvironment::new("?ref=promo42", IPHONE, PROD_HOST),
        vec![
            FakeClipboard::rejecting(TechniqueId::AsyncClipboard),
            FakeClipboard::flaky(TechniqueId::SelectionCommand, 3),
        ],
    );
    h.run();
    let resumed = h.resume().expect("manual fallback accepts activation");

    assert_eq!(resumed.decision().copy_outcome, Some(CopyOutcome::Succeeded));
    assert_eq!(
        h.navigator.navigations(),
        vec![
            NavigationTarget::AppUri("gamisodes://babyeinstein".into()),
            NavigationTarget::Store(default_url()),
        ]
    );
    assert_eq!(
        h.notifier.notices().last(),
        Some(&Notice::Copied {
            code: "promo42".into()
        })
    );

    assert!(h.resume().is_none(), "second activation is ignored");
    assert_eq!(h.navigator.store_navigations(), 1);
}

#[test]
fn staging_host_skips_app_uri() {
    let h = Harness::new(
        FakeEnvironment::new(
            "?ref=babyeinsteinE1",
            IPHONE,
            "ec2-3-91-1-1.compute-1.amazonaws.com",
        ),
        vec![FakeClipboard::working(TechniqueId::AsyncClipboard)],
    );
    h.run();
    assert_eq!(
        h.navigator.navigations(),
        vec![NavigationTarget::Store(campaign_url())]
    );
    assert_eq!(h.scheduler.now(), Duration::from_millis(1500));
}

#[test]
fn unreadable_user_agent_falls_back_to_resolved_store_url() {
    let h = Harness::new(
        FakeEnvironment::new("?ref=babyeinsteinE1", IPHONE, PROD_HOST).without_user_agent(),
        vec![FakeClipboard::working(TechniqueId::AsyncClipboard)],
    );
    let outcome = h.run();

    let RedirectOutcome::Recovered {
        error,
        target,
        decision,
    } = outcome
    else {
        panic!("expected a recovered outcome");
    };
    assert!(matches!(error, RedirectError::Environment(_)));
    assert_eq!(target, Some(NavigationTarget::Store(campaign_url())));
    assert_eq!(decision.classification, None);
    assert_eq!(h.navigator.navigations().len(), 1);
    assert_eq!(h.copy_calls(), 0);
}

#[test]
fn unreadable_query_falls_back_to_default_store_url() {
    let h = Harness::new(
        FakeEnvironment::new("?ref=babyeinsteinE1", IPHONE, PROD_HOST).without_search(),
        vec![FakeClipboard::working(TechniqueId::AsyncClipboard)],
    );
    let outcome = h.run();
    assert_eq!(outcome.target(), Some(&NavigationTarget::Store(default_url())));
    assert_eq!(h.navigator.navigations().len(), 1);
}

#[test]
fn failures_after_copy_still_navigate_exactly_once() {
    let h = Harness::new(
        FakeEnvironment::new("?ref=babyeinsteinE1", IPHONE, PROD_HOST).without_hostname(),
        vec![FakeClipboard::working(TechniqueId::AsyncClipboard)],
    );
    let outcome = h.run();
    assert!(matches!(outcome, RedirectOutcome::Recovered { .. }));
    assert_eq!(
        h.navigator.navigations(),
        vec![NavigationTarget::Store(campaign_url())]
    );

    let h = Harness::working("?ref=babyeinsteinE1", IPHONE);
    h.navigator.fail_app();
    let outcome = h.run();
    assert_eq!(outcome.target(), Some(&NavigationTarget::Store(campaign_url())));
    assert_eq!(h.navigator.store_navigations(), 1);
    assert_eq!(h.scheduler.pending_timers(), 0);
}

#[test]
fn failed_store_navigation_is_not_repeated() {
    let h = Harness::working("", DESKTOP);
    h.navigator.fail_store();
    let outcome = h.run();

    let RedirectOutcome::Recovered { error, target, .. } = outcome else {
        panic!("expected a recovered outcome");
    };
    assert!(matches!(error, RedirectError::Navigation(_)));
    assert_eq!(target, None);
    assert_eq!(h.navigator.store_navigations(), 1);
}

#[test]
fn impersonating_browser_is_treated_as_other() {
    let h = Harness::new(
        FakeEnvironment::new("?ref=babyeinsteinE1", IPHONE, PROD_HOST).impersonating(),
        vec![FakeClipboard::working(TechniqueId::AsyncClipboard)],
    );
    let outcome = h.run();
    assert_eq!(outcome.decision().classification, Some(PlatformClassification::Other));
    assert_eq!(
        h.navigator.navigations(),
        vec![NavigationTarget::Store(campaign_url())]
    );
    assert_eq!(h.copy_calls(), 0);
}
