//! Browser-backed implementations of the core ports.
mod clipboard;
mod environment;
mod navigation;
mod timers;
mod visibility;

pub use clipboard::{AsyncClipboard, SelectionCommand};
pub use environment::BrowserEnvironment;
pub use navigation::BrowserNavigator;
pub use timers::BrowserScheduler;
pub use visibility::PageHiddenGuard;

use crate::dom::DomError;
use redirect_core::{ClipboardPort, CopyError, Notifier, RedirectError, RedirectPorts};
use std::rc::Rc;

impl From<DomError> for RedirectError {
    fn from(err: DomError) -> Self {
        match err {
            DomError::NoWindow | DomError::NoDocument => Self::Environment(err.to_string()),
            DomError::Js(message) => Self::Unexpected(message),
        }
    }
}

impl From<DomError> for CopyError {
    fn from(err: DomError) -> Self {
        match err {
            DomError::NoWindow | DomError::NoDocument => Self::Unavailable(err.to_string()),
            DomError::Js(message) => Self::WriteFailed(message),
        }
    }
}

/// Clipboard techniques the browser build can offer.
#[must_use]
pub fn clipboard_ports() -> Vec<Rc<dyn ClipboardPort>> {
    vec![Rc::new(AsyncClipboard) as Rc<dyn ClipboardPort>, Rc::new(SelectionCommand)]
}

/// Wire the orchestrator to the live page.
#[must_use]
pub fn browser_ports(notifier: Rc<dyn Notifier>) -> RedirectPorts {
    RedirectPorts {
        environment: Rc::new(BrowserEnvironment),
        navigator: Rc::new(BrowserNavigator),
        clipboard: clipboard_ports(),
        scheduler: Rc::new(BrowserScheduler),
        notifier,
    }
}
