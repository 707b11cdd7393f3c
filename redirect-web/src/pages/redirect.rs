//! The page every referral link lands on.
use crate::a11y::{self, STATUS_REGION_ID};
use crate::components::button::Button;
use crate::components::manual_copy::ManualCopy;
use crate::components::toast::{Toast, ToastAction, ToastItem, ToastQueue};
use redirect_core::{AppHandoff, LinkTable, Orchestrator, RedirectState, extract_referral};
use std::cell::RefCell;
use std::rc::Rc;
use yew::prelude::*;
use yew_router::prelude::*;

pub const HEADING: &str = "Redirecting you to the App Store...";
pub const FALLBACK_LINK: &str = "If not redirected, click here";
/// Shown in manual fallback once the dialog has been dismissed.
pub const RESUME_LABEL: &str = "Copy code and continue";
pub const COPIED_STATUS: &str = "Referral code copied";
pub const COPY_FAILED_STATUS: &str = "Copy failed, tap and hold the code to copy it";

type OrchestratorSlot = Rc<RefCell<Option<Orchestrator>>>;

/// Screen-reader narration for each step of the flow.
#[must_use]
pub const fn status_message(state: &RedirectState) -> &'static str {
    match state {
        RedirectState::Start | RedirectState::Classifying => "Checking your device",
        RedirectState::CopyAttempt { .. } => "Copying your referral code",
        RedirectState::DeepLinkAttempt => "Opening the app",
        RedirectState::ImmediateRedirect | RedirectState::StoreRedirect => {
            "Opening the App Store"
        }
        RedirectState::ManualFallback => "Copy your referral code to continue",
        RedirectState::Navigated { .. } => "Leaving this page",
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct ViewProps {
    pub store_url: AttrValue,
    pub status: AttrValue,
    pub code: AttrValue,
    #[prop_or_default]
    pub toasts: Vec<ToastItem>,
    #[prop_or_default]
    pub on_dismiss: Option<Callback<usize>>,
    #[prop_or_default]
    pub manual_open: bool,
    /// Waiting in manual fallback for the visitor to act.
    #[prop_or_default]
    pub manual_pending: bool,
    #[prop_or_default]
    pub copied: bool,
    #[prop_or_default]
    pub on_copy: Callback<()>,
    #[prop_or_default]
    pub on_continue: Callback<()>,
    #[prop_or_default]
    pub on_close: Callback<()>,
}

/// Stateless markup of the redirect page.
#[function_component(RedirectView)]
pub fn redirect_view(p: &ViewProps) -> Html {
    let resume = (p.manual_pending && !p.manual_open).then(|| {
        let on_continue = p.on_continue.clone();
        html! {
            <p>
                <Button
                    label={AttrValue::from(RESUME_LABEL)}
                    onclick={Callback::from(move |_: MouseEvent| on_continue.emit(()))}
                    class={classes!("btn-primary", "redirect__resume")}
                />
            </p>
        }
    });
    html! {
        <main id="main" class="redirect" role="main">
            <style>{ a11y::visible_focus_css() }</style>
            <div class="redirect__spinner" aria-hidden="true"></div>
            <h1>{ HEADING }</h1>
            <p>
                <a id="store-link" class="redirect__fallback" href={p.store_url.clone()}>
                    { FALLBACK_LINK }
                </a>
            </p>
            { for resume }
            <p id={STATUS_REGION_ID} class="sr-only" aria-live="polite">{ p.status.clone() }</p>
            <Toast toasts={p.toasts.clone()} on_dismiss={p.on_dismiss.clone()} />
            <ManualCopy
                open={p.manual_open}
                code={p.code.clone()}
                copied={p.copied}
                on_copy={p.on_copy.clone()}
                on_continue={p.on_continue.clone()}
                on_close={p.on_close.clone()}
            />
        </main>
    }
}

#[derive(Clone)]
struct PageHandles {
    toasts: UseReducerDispatcher<ToastQueue>,
    status: UseStateHandle<AttrValue>,
    manual_open: UseStateHandle<bool>,
    manual_pending: UseStateHandle<bool>,
    copied: UseStateHandle<bool>,
    orchestrator: OrchestratorSlot,
    handoff: AppHandoff,
}

/// Reads the referral code from the current location and runs the redirect
/// flow once on mount.
#[function_component(RedirectPage)]
pub fn redirect_page() -> Html {
    let search = use_location()
        .map(|location| location.query_str().to_string())
        .unwrap_or_default();
    let code = extract_referral(&search);
    let store_url = AttrValue::from(LinkTable::bundled().resolve(&code).to_string());

    let toasts = use_reducer(ToastQueue::default);
    let status = use_state(|| AttrValue::from(status_message(&RedirectState::Start)));
    let manual_open = use_state(|| false);
    let manual_pending = use_state(|| false);
    let copied = use_state(|| false);
    let orchestrator: OrchestratorSlot = use_mut_ref(|| None);
    let handoff = (*use_state(AppHandoff::new)).clone();

    let handles = PageHandles {
        toasts: toasts.dispatcher(),
        status: status.clone(),
        manual_open: manual_open.clone(),
        manual_pending: manual_pending.clone(),
        copied: copied.clone(),
        orchestrator,
        handoff,
    };

    {
        let handles = handles.clone();
        use_effect_with((), move |_| {
            start_redirect(&handles);
            move || handles.handoff.cancel_all()
        });
    }

    let on_dismiss = {
        let dispatcher = toasts.dispatcher();
        Callback::from(move |id| dispatcher.dispatch(ToastAction::Dismiss(id)))
    };
    let on_close = {
        let manual_open = manual_open.clone();
        Callback::from(move |()| manual_open.set(false))
    };

    html! {
        <RedirectView
            store_url={store_url}
            status={(*status).clone()}
            code={AttrValue::from(code.to_string())}
            toasts={toasts.items.clone()}
            on_dismiss={Some(on_dismiss)}
            manual_open={*manual_open}
            manual_pending={*manual_pending}
            copied={*copied}
            on_copy={copy_callback(&handles)}
            on_continue={continue_callback(&handles)}
            on_close={on_close}
        />
    }
}

#[cfg(target_arch = "wasm32")]
fn spawn_guarded<T: 'static>(
    handoff: &AppHandoff,
    task: impl std::future::Future<Output = T> + 'static,
    on_done: impl FnOnce(T) + 'static,
) {
    use crate::browser::PageHiddenGuard;
    use futures::future::{Aborted, abortable};

    let (task, handle) = abortable(task);
    let guard = PageHiddenGuard::install(handoff.clone())
        .map_err(|err| log::warn!("page visibility is not observable: {err}"))
        .ok();
    handoff.track(handle);
    wasm_bindgen_futures::spawn_local(async move {
        let result = task.await;
        drop(guard);
        match result {
            Ok(value) => on_done(value),
            Err(Aborted) => log::info!("redirect task cancelled"),
        }
    });
}

#[cfg(target_arch = "wasm32")]
fn start_redirect(handles: &PageHandles) {
    use crate::browser::browser_ports;
    use crate::components::toast::ToastNotifier;
    use redirect_core::{RedirectConfig, RedirectOutcome};

    let notifier = Rc::new(ToastNotifier::new(handles.toasts.clone()));
    let status = handles.status.clone();
    let handoff = handles.handoff.clone();
    let orchestrator = Orchestrator::new(
        RedirectConfig::load_from_static(),
        LinkTable::bundled().clone(),
        browser_ports(notifier),
    )
    .with_observer(move |state| {
        handoff.observe(state);
        status.set(AttrValue::from(status_message(state)));
    });
    *handles.orchestrator.borrow_mut() = Some(orchestrator.clone());

    let manual_open = handles.manual_open.clone();
    let manual_pending = handles.manual_pending.clone();
    spawn_guarded(
        &handles.handoff,
        async move { orchestrator.run().await },
        move |outcome| match outcome {
            RedirectOutcome::ManualFallback { .. } => {
                manual_pending.set(true);
                manual_open.set(true);
            }
            other => log::debug!("redirect finished: {other:?}"),
        },
    );
}

#[cfg(not(target_arch = "wasm32"))]
fn start_redirect(_handles: &PageHandles) {}

#[cfg(target_arch = "wasm32")]
fn copy_callback(handles: &PageHandles) -> Callback<()> {
    let slot = Rc::clone(&handles.orchestrator);
    let copied = handles.copied.clone();
    let status = handles.status.clone();
    Callback::from(move |()| {
        let Some(orchestrator) = slot.borrow().clone() else {
            return;
        };
        let copied = copied.clone();
        let status = status.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let code = orchestrator.decision().referral_code;
            let report = orchestrator.copy_strategy().attempt_copy(code.as_str()).await;
            if report.outcome.succeeded() {
                copied.set(true);
                status.set(AttrValue::from(COPIED_STATUS));
            } else {
                status.set(AttrValue::from(COPY_FAILED_STATUS));
            }
        });
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn copy_callback(_handles: &PageHandles) -> Callback<()> {
    Callback::noop()
}

#[cfg(target_arch = "wasm32")]
fn continue_callback(handles: &PageHandles) -> Callback<()> {
    let handles = handles.clone();
    Callback::from(move |()| {
        let Some(orchestrator) = handles.orchestrator.borrow().clone() else {
            return;
        };
        handles.manual_open.set(false);
        handles.manual_pending.set(false);
        spawn_guarded(
            &handles.handoff,
            async move { orchestrator.resume_manual().await },
            |outcome| log::debug!("manual redirect finished: {outcome:?}"),
        );
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn continue_callback(_handles: &PageHandles) -> Callback<()> {
    Callback::noop()
}
