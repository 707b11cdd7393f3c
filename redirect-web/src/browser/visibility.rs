use crate::dom::{self, DomError};
use redirect_core::AppHandoff;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, VisibilityState, Window};

/// Reports page hide and unload events to an [`AppHandoff`], which cancels
/// the redirect only if the app URI was already opened.
///
/// Listeners are removed when the guard is dropped.
pub struct PageHiddenGuard {
    window: Window,
    document: Document,
    on_visibility: Closure<dyn FnMut()>,
    on_pagehide: Closure<dyn FnMut()>,
}

impl PageHiddenGuard {
    /// # Errors
    /// Returns an error when the window or document is unavailable or a
    /// listener cannot be registered.
    pub fn install(handoff: AppHandoff) -> Result<Self, DomError> {
        let window = dom::window()?;
        let document = dom::document()?;

        let on_visibility = {
            let handoff = handoff.clone();
            let document = document.clone();
            Closure::<dyn FnMut()>::new(move || {
                if document.visibility_state() == VisibilityState::Hidden {
                    handoff.page_hidden();
                }
            })
        };
        let on_pagehide = Closure::<dyn FnMut()>::new(move || {
            handoff.page_hidden();
        });

        document.add_event_listener_with_callback(
            "visibilitychange",
            on_visibility.as_ref().unchecked_ref(),
        )?;
        window.add_event_listener_with_callback("pagehide", on_pagehide.as_ref().unchecked_ref())?;

        Ok(Self {
            window,
            document,
            on_visibility,
            on_pagehide,
        })
    }
}

impl Drop for PageHiddenGuard {
    fn drop(&mut self) {
        let _ = self.document.remove_event_listener_with_callback(
            "visibilitychange",
            self.on_visibility.as_ref().unchecked_ref(),
        );
        let _ = self.window.remove_event_listener_with_callback(
            "pagehide",
            self.on_pagehide.as_ref().unchecked_ref(),
        );
    }
}
