//! Cancellation of redirect tasks once the installed app takes over.
//!
//! Hiding the page only means the app opened after the app URI was
//! navigated to. Before that (app switcher, another tab) the flow keeps
//! running so the visitor always ends up somewhere.
use crate::orchestrator::RedirectState;
use futures::future::AbortHandle;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Default)]
struct HandoffState {
    app_opened: Cell<bool>,
    tasks: RefCell<Vec<AbortHandle>>,
}

/// Shared between the page's tasks, the orchestrator observer and the
/// visibility listeners. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct AppHandoff {
    inner: Rc<HandoffState>,
}

impl AppHandoff {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task to cancel on handoff or teardown.
    pub fn track(&self, handle: AbortHandle) {
        let mut tasks = self.inner.tasks.borrow_mut();
        tasks.retain(|task| !task.is_aborted());
        tasks.push(handle);
    }

    /// Feed every orchestrator state through here. The app URI is opened
    /// right after [`RedirectState::DeepLinkAttempt`] is entered.
    pub fn observe(&self, state: &RedirectState) {
        if matches!(state, RedirectState::DeepLinkAttempt) {
            self.inner.app_opened.set(true);
        }
    }

    #[must_use]
    pub fn app_opened(&self) -> bool {
        self.inner.app_opened.get()
    }

    /// The page was hidden or unloaded. Cancels tracked tasks only if the
    /// app URI was already opened; returns whether it did.
    pub fn page_hidden(&self) -> bool {
        if !self.app_opened() {
            log::debug!("page hidden before the app was opened, redirect continues");
            return false;
        }
        log::info!("page hidden after opening the app, cancelling store fallback");
        self.cancel_all();
        true
    }

    /// Abort every tracked task.
    pub fn cancel_all(&self) {
        for handle in self.inner.tasks.borrow_mut().drain(..) {
            handle.abort();
        }
    }
}
