use crate::dom::{self, js_error_message};
use async_trait::async_trait;
use redirect_core::{ClipboardPort, CopyError, TechniqueId};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlInputElement;

/// `navigator.clipboard.writeText`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncClipboard;

#[async_trait(?Send)]
impl ClipboardPort for AsyncClipboard {
    fn id(&self) -> TechniqueId {
        TechniqueId::AsyncClipboard
    }

    async fn write_text(&self, text: &str) -> Result<(), CopyError> {
        let navigator = dom::window()?.navigator();
        // Older engines and insecure origins expose no clipboard object.
        let has_clipboard = js_sys::Reflect::has(&navigator, &JsValue::from_str("clipboard"))
            .unwrap_or(false);
        if !has_clipboard {
            return Err(CopyError::Unavailable("navigator.clipboard missing".into()));
        }
        let promise = navigator.clipboard().write_text(text);
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| CopyError::WriteFailed(js_error_message(&err)))
    }
}

/// Select a hidden input and run `document.execCommand("copy")`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionCommand;

impl SelectionCommand {
    fn copy_via_selection(text: &str) -> Result<(), CopyError> {
        let document = dom::html_document()?;
        let body = document
            .body()
            .ok_or_else(|| CopyError::Unavailable("document has no body".into()))?;
        let input = document
            .create_element("input")
            .map_err(dom::DomError::from)?
            .dyn_into::<HtmlInputElement>()
            .map_err(|_| CopyError::Unavailable("could not create input".into()))?;
        input.set_value(text);
        input.set_read_only(true);
        let style = input.style();
        for (name, value) in [("position", "fixed"), ("top", "-1000px"), ("opacity", "0")] {
            style.set_property(name, value).map_err(dom::DomError::from)?;
        }
        body.append_child(&input).map_err(dom::DomError::from)?;

        let copied = Self::select_and_copy(&document, &input, text);
        input.remove();
        copied
    }

    fn select_and_copy(
        document: &web_sys::HtmlDocument,
        input: &HtmlInputElement,
        text: &str,
    ) -> Result<(), CopyError> {
        input.focus().map_err(dom::DomError::from)?;
        input.select();
        // iOS ignores select() on read-only inputs without an explicit range.
        let end = u32::try_from(text.encode_utf16().count()).unwrap_or(u32::MAX);
        input
            .set_selection_range(0, end)
            .map_err(dom::DomError::from)?;
        match document.exec_command("copy") {
            Ok(true) => Ok(()),
            Ok(false) => Err(CopyError::WriteFailed("execCommand(\"copy\") returned false".into())),
            Err(err) => Err(CopyError::WriteFailed(js_error_message(&err))),
        }
    }
}

#[async_trait(?Send)]
impl ClipboardPort for SelectionCommand {
    fn id(&self) -> TechniqueId {
        TechniqueId::SelectionCommand
    }

    async fn write_text(&self, text: &str) -> Result<(), CopyError> {
        Self::copy_via_selection(text)
    }
}
