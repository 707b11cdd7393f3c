use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlDocument, Window};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("`window` is not available")]
    NoWindow,
    #[error("`document` is not available")]
    NoDocument,
    #[error("{0}")]
    Js(String),
}

impl From<JsValue> for DomError {
    fn from(value: JsValue) -> Self {
        Self::Js(js_error_message(&value))
    }
}

/// Retrieve the global `window` object.
///
/// # Errors
/// Returns [`DomError::NoWindow`] outside a browser context.
pub fn window() -> Result<Window, DomError> {
    web_sys::window().ok_or(DomError::NoWindow)
}

/// Retrieve the document object for DOM interactions.
///
/// # Errors
/// Returns an error when the window or its document cannot be accessed.
pub fn document() -> Result<Document, DomError> {
    window()?.document().ok_or(DomError::NoDocument)
}

/// The document viewed as an HTML document, for `execCommand`.
///
/// # Errors
/// Returns an error when the document is missing or is not an HTML document.
pub fn html_document() -> Result<HtmlDocument, DomError> {
    document()?
        .dyn_into::<HtmlDocument>()
        .map_err(|_| DomError::Js("document is not an HTML document".into()))
}

/// Convert a JavaScript value into a readable string for error reporting.
#[must_use]
pub fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| err.message().into())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Check for a property on `window` without reading it.
#[must_use]
pub fn window_has(property: &str) -> bool {
    window()
        .ok()
        .and_then(|win| js_sys::Reflect::has(&win, &JsValue::from_str(property)).ok())
        .unwrap_or(false)
}
