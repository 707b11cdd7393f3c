use crate::dom;
use redirect_core::{EnvironmentPort, RedirectError};

/// Reads location and navigator of the current page.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserEnvironment;

fn unreadable(what: &str, err: &wasm_bindgen::JsValue) -> RedirectError {
    RedirectError::Environment(format!("{what}: {}", dom::js_error_message(err)))
}

impl EnvironmentPort for BrowserEnvironment {
    fn location_search(&self) -> Result<String, RedirectError> {
        dom::window()?
            .location()
            .search()
            .map_err(|err| unreadable("location.search", &err))
    }

    fn user_agent(&self) -> Result<String, RedirectError> {
        dom::window()?
            .navigator()
            .user_agent()
            .map_err(|err| unreadable("navigator.userAgent", &err))
    }

    fn hostname(&self) -> Result<String, RedirectError> {
        dom::window()?
            .location()
            .hostname()
            .map_err(|err| unreadable("location.hostname", &err))
    }

    /// IE11 on Windows Phone advertises itself as an iPhone but defines
    /// `window.MSStream`.
    fn impersonating_browser(&self) -> bool {
        dom::window_has("MSStream")
    }
}
