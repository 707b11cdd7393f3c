//! In-memory port implementations for tests and offline replays.
use crate::clipboard::{ClipboardPort, TechniqueId};
use crate::error::{CopyError, RedirectError};
use crate::ports::{EnvironmentPort, NavigationPort, NavigationTarget, Notice, Notifier};
use crate::schedule::VirtualScheduler;
use async_trait::async_trait;
use futures::executor::LocalPool;
use futures::future::AbortHandle;
use futures::task::LocalSpawnExt;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipboardBehaviour {
    Works,
    Unavailable,
    Rejects,
    /// Rejects the first `n` writes, then works.
    FlakyFor(usize),
}

/// Clipboard technique with scripted behaviour.
#[derive(Debug)]
pub struct FakeClipboard {
    id: TechniqueId,
    behaviour: ClipboardBehaviour,
    calls: Cell<usize>,
    contents: RefCell<Option<String>>,
}

impl FakeClipboard {
    fn with(id: TechniqueId, behaviour: ClipboardBehaviour) -> Self {
        Self {
            id,
            behaviour,
            calls: Cell::new(0),
            contents: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn working(id: TechniqueId) -> Self {
        Self::with(id, ClipboardBehaviour::Works)
    }

    #[must_use]
    pub fn unavailable(id: TechniqueId) -> Self {
        Self::with(id, ClipboardBehaviour::Unavailable)
    }

    #[must_use]
    pub fn rejecting(id: TechniqueId) -> Self {
        Self::with(id, ClipboardBehaviour::Rejects)
    }

    #[must_use]
    pub fn flaky(id: TechniqueId, failures: usize) -> Self {
        Self::with(id, ClipboardBehaviour::FlakyFor(failures))
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

#[async_trait(?Send)]
impl ClipboardPort for FakeClipboard {
    fn id(&self) -> TechniqueId {
        self.id
    }

    async fn write_text(&self, text: &str) -> Result<(), CopyError> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        match self.behaviour {
            ClipboardBehaviour::Unavailable => {
                Err(CopyError::Unavailable(format!("{} missing", self.id)))
            }
            ClipboardBehaviour::Rejects => Err(CopyError::WriteFailed("permission denied".into())),
            ClipboardBehaviour::FlakyFor(failures) if call < failures => {
                Err(CopyError::WriteFailed("not triggered by a user gesture".into()))
            }
            ClipboardBehaviour::Works | ClipboardBehaviour::FlakyFor(_) => {
                *self.contents.borrow_mut() = Some(text.to_string());
                Ok(())
            }
        }
    }
}

/// Fixed page inputs, any of which can be made unreadable.
#[derive(Debug, Clone)]
pub struct FakeEnvironment {
    search: Option<String>,
    user_agent: Option<String>,
    hostname: Option<String>,
    impersonating: bool,
}

impl FakeEnvironment {
    #[must_use]
    pub fn new(search: &str, user_agent: &str, hostname: &str) -> Self {
        Self {
            search: Some(search.to_string()),
            user_agent: Some(user_agent.to_string()),
            hostname: Some(hostname.to_string()),
            impersonating: false,
        }
    }

    #[must_use]
    pub fn without_search(mut self) -> Self {
        self.search = None;
        self
    }

    #[must_use]
    pub fn without_user_agent(mut self) -> Self {
        self.user_agent = None;
        self
    }

    #[must_use]
    pub fn without_hostname(mut self) -> Self {
        self.hostname = None;
        self
    }

    #[must_use]
    pub const fn impersonating(mut self) -> Self {
        self.impersonating = true;
        self
    }
}

fn unreadable(value: Option<&String>, what: &str) -> Result<String, RedirectError> {
    value
        .cloned()
        .ok_or_else(|| RedirectError::Environment(format!("{what} unreadable")))
}

impl EnvironmentPort for FakeEnvironment {
    fn location_search(&self) -> Result<String, RedirectError> {
        unreadable(self.search.as_ref(), "location.search")
    }

    fn user_agent(&self) -> Result<String, RedirectError> {
        unreadable(self.user_agent.as_ref(), "navigator.userAgent")
    }

    fn hostname(&self) -> Result<String, RedirectError> {
        unreadable(self.hostname.as_ref(), "location.hostname")
    }

    fn impersonating_browser(&self) -> bool {
        self.impersonating
    }
}

/// Records navigations instead of performing them.
#[derive(Debug, Default)]
pub struct FakeNavigator {
    navigations: RefCell<Vec<NavigationTarget>>,
    fail_store: Cell<bool>,
    fail_app: Cell<bool>,
    app_interceptor: RefCell<Option<AbortHandle>>,
}

impl FakeNavigator {
    /// Navigations in the order they were requested, failed ones included.
    #[must_use]
    pub fn navigations(&self) -> Vec<NavigationTarget> {
        self.navigations.borrow().clone()
    }

    #[must_use]
    pub fn store_navigations(&self) -> usize {
        self.navigations
            .borrow()
            .iter()
            .filter(|target| target.is_store())
            .count()
    }

    pub fn fail_store(&self) {
        self.fail_store.set(true);
    }

    pub fn fail_app(&self) {
        self.fail_app.set(true);
    }

    /// Simulate the installed app taking over: navigating to an app URI
    /// aborts the task behind `handle`, as leaving the page would.
    pub fn intercept_app_with(&self, handle: AbortHandle) {
        *self.app_interceptor.borrow_mut() = Some(handle);
    }
}

impl NavigationPort for FakeNavigator {
    fn navigate(&self, target: &NavigationTarget) -> Result<(), RedirectError> {
        self.navigations.borrow_mut().push(target.clone());
        let fail = match target {
            NavigationTarget::Store(_) => self.fail_store.get(),
            NavigationTarget::AppUri(_) => self.fail_app.get(),
        };
        if fail {
            return Err(RedirectError::Navigation(format!("refused {target}")));
        }
        if let (NavigationTarget::AppUri(_), Some(handle)) =
            (target, self.app_interceptor.borrow().as_ref())
        {
            handle.abort();
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: RefCell<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }
}

/// Run `future` to completion, advancing `scheduler` whenever the future
/// stalls on a timer.
///
/// Returns `None` if the future stalls with no timer left to fire.
pub fn drive<F>(scheduler: &VirtualScheduler, future: F) -> Option<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    let mut pool = LocalPool::new();
    let slot = Rc::new(RefCell::new(None));
    let out = Rc::clone(&slot);
    if let Err(err) = pool.spawner().spawn_local(async move {
        *out.borrow_mut() = Some(future.await);
    }) {
        log::error!("could not spawn redirect replay: {err}");
        return None;
    }

    loop {
        pool.run_until_stalled();
        if let Some(output) = slot.borrow_mut().take() {
            return Some(output);
        }
        if !scheduler.advance_to_next() {
            return None;
        }
    }
}
