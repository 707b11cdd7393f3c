//! Runs a scenario against in-memory ports on virtual time.
use anyhow::{Result, anyhow};
use redirect_core::fakes::{FakeClipboard, FakeEnvironment, FakeNavigator, RecordingNotifier, drive};
use redirect_core::{
    ClipboardPort, LinkTable, NavigationTarget, Notice, Orchestrator, RedirectConfig,
    RedirectOutcome, RedirectPorts, RedirectState, TechniqueId, VirtualScheduler,
};
use std::rc::Rc;
use std::time::Duration;

use crate::scenario::{ClipboardSetup, ScenarioSetup};

/// Everything observable about one replay.
#[derive(Debug, Clone)]
pub struct ReplayRun {
    pub outcome: RedirectOutcome,
    pub trace: Vec<RedirectState>,
    pub navigations: Vec<NavigationTarget>,
    pub notices: Vec<Notice>,
    pub elapsed: Duration,
}

impl ReplayRun {
    #[must_use]
    pub fn final_state(&self) -> Option<&RedirectState> {
        self.trace.last()
    }
}

fn clipboards(setup: ClipboardSetup) -> Vec<Rc<dyn ClipboardPort>> {
    let (async_api, selection) = match setup {
        ClipboardSetup::Working => (
            FakeClipboard::working(TechniqueId::AsyncClipboard),
            FakeClipboard::working(TechniqueId::SelectionCommand),
        ),
        ClipboardSetup::AsyncMissing => (
            FakeClipboard::unavailable(TechniqueId::AsyncClipboard),
            FakeClipboard::working(TechniqueId::SelectionCommand),
        ),
        ClipboardSetup::Denied => (
            FakeClipboard::rejecting(TechniqueId::AsyncClipboard),
            FakeClipboard::rejecting(TechniqueId::SelectionCommand),
        ),
        ClipboardSetup::Flaky(failures) => (
            FakeClipboard::flaky(TechniqueId::AsyncClipboard, failures),
            FakeClipboard::rejecting(TechniqueId::SelectionCommand),
        ),
    };
    vec![Rc::new(async_api) as Rc<dyn ClipboardPort>, Rc::new(selection)]
}

fn environment(setup: &ScenarioSetup) -> FakeEnvironment {
    let env = FakeEnvironment::new(
        &setup.search,
        setup.user_agent.as_deref().unwrap_or_default(),
        &setup.hostname,
    );
    let env = if setup.user_agent.is_none() {
        env.without_user_agent()
    } else {
        env
    };
    if setup.impersonating {
        env.impersonating()
    } else {
        env
    }
}

/// Replay `setup` to completion.
///
/// # Errors
/// Fails if the flow stalls without a pending timer.
pub fn replay(setup: &ScenarioSetup, config: &RedirectConfig, links: &LinkTable) -> Result<ReplayRun> {
    let scheduler = VirtualScheduler::new();
    let navigator = Rc::new(FakeNavigator::default());
    if setup.refuse_app_uri {
        navigator.fail_app();
    }
    let notifier = Rc::new(RecordingNotifier::default());
    let ports = RedirectPorts {
        environment: Rc::new(environment(setup)),
        navigator: navigator.clone(),
        clipboard: clipboards(setup.clipboard),
        scheduler: Rc::new(scheduler.clone()),
        notifier: notifier.clone(),
    };
    let orchestrator = Orchestrator::new(config.clone(), links.clone(), ports);

    let flow = orchestrator.clone();
    let mut outcome = drive(&scheduler, async move { flow.run().await })
        .ok_or_else(|| anyhow!("redirect flow stalled"))?;

    if setup.resume_manual && matches!(outcome, RedirectOutcome::ManualFallback { .. }) {
        log::debug!("pressing continue after manual fallback");
        let flow = orchestrator.clone();
        outcome = drive(&scheduler, async move { flow.resume_manual().await })
            .ok_or_else(|| anyhow!("manual resume stalled"))?
            .ok_or_else(|| anyhow!("manual resume was ignored"))?;
    }

    Ok(ReplayRun {
        outcome,
        trace: orchestrator.trace(),
        navigations: navigator.navigations(),
        notices: notifier.notices(),
        elapsed: scheduler.now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{DESKTOP_UA, IPHONE_UA};

    fn run(setup: &ScenarioSetup) -> ReplayRun {
        replay(setup, &RedirectConfig::default(), &LinkTable::load_from_static()).unwrap()
    }

    #[test]
    fn desktop_replay_is_instant() {
        let result = run(&ScenarioSetup::new("", DESKTOP_UA));
        assert_eq!(result.elapsed, Duration::ZERO);
        assert_eq!(result.navigations.len(), 1);
        assert!(result.notices.is_empty());
    }

    #[test]
    fn denied_copy_without_resume_stops_in_manual_fallback() {
        let setup = ScenarioSetup::new("?ref=promo", IPHONE_UA).clipboard(ClipboardSetup::Denied);
        let result = run(&setup);
        assert_eq!(result.final_state(), Some(&RedirectState::ManualFallback));
        assert!(result.navigations.is_empty());
        assert_eq!(
            result.notices,
            vec![Notice::CopyFailed {
                code: "promo".into()
            }]
        );
    }
}
