// Accessibility helpers

use wasm_bindgen::JsCast;

/// Id of the polite live region that narrates redirect progress.
pub const STATUS_REGION_ID: &str = "redirect-status";

/// Get CSS for visible focus indicators and screen reader utilities
///
/// Returns critical accessibility CSS that should be injected early in the page load.
#[must_use]
pub const fn visible_focus_css() -> &'static str {
    ":focus{outline:3px solid #2563EB;outline-offset:2px} .sr-only{position:absolute;width:1px;height:1px;margin:-1px;overflow:hidden;clip:rect(0 0 0 0);white-space:nowrap;}"
}

const FOCUSABLE: &str = "a[href], button:not([disabled]), input:not([disabled]), [tabindex]:not([tabindex='-1'])";

/// Move focus to the first focusable element inside `container_id`.
pub fn trap_focus_in(container_id: &str) {
    let Ok(doc) = crate::dom::document() else {
        return;
    };
    let first = doc
        .get_element_by_id(container_id)
        .and_then(|container| container.query_selector(FOCUSABLE).ok().flatten())
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok());
    if let Some(el) = first {
        let _ = el.focus();
    }
}

/// Return focus to the element with `id`, if it still exists.
pub fn restore_focus(id: &str) {
    if let Some(el) = crate::dom::document()
        .ok()
        .and_then(|doc| doc.get_element_by_id(id))
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
    {
        let _ = el.focus();
    }
}
