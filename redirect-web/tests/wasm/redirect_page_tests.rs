use redirect_web::components::manual_copy::COPY_LABEL;
use redirect_web::dom;
use redirect_web::pages::redirect::{
    COPIED_STATUS, FALLBACK_LINK, HEADING, RedirectView, ViewProps,
};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use yew::{AttrValue, Callback, Renderer};

fn ensure_app_root() -> web_sys::Element {
    let doc = dom::document().expect("document");
    if let Some(root) = doc.get_element_by_id("app") {
        root.set_inner_html("");
        return root;
    }
    let root = doc.create_element("div").expect("create app root");
    root.set_id("app");
    doc.body()
        .expect("document body")
        .append_child(&root)
        .expect("append app root");
    root
}

fn props(manual_open: bool) -> ViewProps {
    ViewProps {
        store_url: AttrValue::from("https://apps.apple.com/us/app/gamisodes/id6691440023"),
        status: AttrValue::from("Checking your device"),
        code: AttrValue::from("babyeinsteinE1"),
        toasts: Vec::new(),
        on_dismiss: None,
        manual_open,
        manual_pending: false,
        copied: false,
        on_copy: Callback::noop(),
        on_continue: Callback::noop(),
        on_close: Callback::noop(),
    }
}

async fn settle() {
    gloo_timers::future::TimeoutFuture::new(0).await;
}

#[wasm_bindgen_test]
async fn status_region_is_polite_live_region() {
    Renderer::<RedirectView>::with_root_and_props(ensure_app_root(), props(false)).render();
    settle().await;

    let doc = dom::document().expect("document");
    let status = doc
        .get_element_by_id(redirect_web::a11y::STATUS_REGION_ID)
        .expect("status region");
    assert_eq!(status.get_attribute("aria-live").unwrap_or_default(), "polite");
    let heading = doc.query_selector("h1").expect("query").expect("heading");
    assert_eq!(heading.text_content().unwrap_or_default(), HEADING);
    let link = doc.get_element_by_id("store-link").expect("store link");
    assert_eq!(link.text_content().unwrap_or_default(), FALLBACK_LINK);
}

#[wasm_bindgen_test]
async fn manual_dialog_focuses_first_control() {
    Renderer::<RedirectView>::with_root_and_props(ensure_app_root(), props(true)).render();
    settle().await;

    let doc = dom::document().expect("document");
    let dialog = doc
        .query_selector("[role='dialog']")
        .expect("query")
        .expect("dialog rendered");
    assert_eq!(dialog.get_attribute("aria-modal").unwrap_or_default(), "true");
    let active: web_sys::Node = doc.active_element().expect("something focused").into();
    assert!(dialog.contains(Some(&active)));
}

fn status_text() -> String {
    dom::document()
        .expect("document")
        .get_element_by_id(redirect_web::a11y::STATUS_REGION_ID)
        .and_then(|status| status.text_content())
        .unwrap_or_default()
}

#[wasm_bindgen_test]
async fn status_region_follows_every_update() {
    let mut handle = Renderer::<RedirectView>::with_root_and_props(
        ensure_app_root(),
        ViewProps {
            status: AttrValue::from(COPIED_STATUS),
            ..props(true)
        },
    )
    .render();
    settle().await;
    assert_eq!(status_text(), COPIED_STATUS);

    for next in ["Opening the app", "Leaving this page"] {
        handle.update(ViewProps {
            status: AttrValue::from(next),
            ..props(false)
        });
        settle().await;
        assert_eq!(status_text(), next);
    }
}

#[wasm_bindgen_test]
async fn manual_copy_button_runs_the_copy_callback() {
    let clicks = Rc::new(Cell::new(0));
    let on_copy = {
        let clicks = Rc::clone(&clicks);
        Callback::from(move |()| clicks.set(clicks.get() + 1))
    };
    Renderer::<RedirectView>::with_root_and_props(
        ensure_app_root(),
        ViewProps {
            on_copy,
            ..props(true)
        },
    )
    .render();
    settle().await;

    let button = dom::document()
        .expect("document")
        .query_selector("[role='dialog'] button.btn-secondary")
        .expect("query")
        .expect("copy button")
        .dyn_into::<web_sys::HtmlElement>()
        .expect("html element");
    assert_eq!(button.text_content().unwrap_or_default().trim(), COPY_LABEL);
    button.click();
    settle().await;
    assert_eq!(clicks.get(), 1);
}
