use crate::dom;
use redirect_core::{NavigationPort, NavigationTarget, RedirectError};

/// Navigates by assigning `location.href`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

impl NavigationPort for BrowserNavigator {
    fn navigate(&self, target: &NavigationTarget) -> Result<(), RedirectError> {
        dom::window()?
            .location()
            .set_href(target.url())
            .map_err(|err| {
                RedirectError::Navigation(format!("{target}: {}", dom::js_error_message(&err)))
            })
    }
}
