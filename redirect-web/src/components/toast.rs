//! Transient notices shown over the redirect page.
use redirect_core::{Notice, Notifier};
use std::rc::Rc;
use yew::prelude::*;

/// How long a toast stays up before it dismisses itself.
pub const TOAST_TTL_MS: u32 = 3_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
}

impl ToastKind {
    const fn class(self) -> &'static str {
        match self {
            Self::Success => "toast--success",
            Self::Warning => "toast--warning",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToastItem {
    pub id: usize,
    pub kind: ToastKind,
    pub message: AttrValue,
}

impl ToastItem {
    #[must_use]
    pub fn from_notice(id: usize, notice: &Notice) -> Self {
        let (kind, message) = match notice {
            Notice::Copied { .. } => (ToastKind::Success, "Referral code copied"),
            Notice::CopyFailed { .. } => (
                ToastKind::Warning,
                "Couldn't copy automatically, copy the code manually",
            ),
        };
        Self {
            id,
            kind,
            message: AttrValue::from(message),
        }
    }
}

pub enum ToastAction {
    Push(Notice),
    Dismiss(usize),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToastQueue {
    next_id: usize,
    pub items: Vec<ToastItem>,
}

impl ToastQueue {
    /// Id the next pushed toast will get.
    #[must_use]
    pub const fn next_id(&self) -> usize {
        self.next_id
    }
}

impl Reducible for ToastQueue {
    type Action = ToastAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            ToastAction::Push(notice) => {
                next.items.push(ToastItem::from_notice(next.next_id, &notice));
                next.next_id += 1;
            }
            ToastAction::Dismiss(id) => next.items.retain(|item| item.id != id),
        }
        Rc::new(next)
    }
}

/// Forwards orchestrator notices into a [`ToastQueue`].
pub struct ToastNotifier {
    queue: UseReducerDispatcher<ToastQueue>,
}

impl ToastNotifier {
    #[must_use]
    pub const fn new(queue: UseReducerDispatcher<ToastQueue>) -> Self {
        Self { queue }
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, notice: Notice) {
        self.queue.dispatch(ToastAction::Push(notice));
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct ToastProps {
    pub toasts: Vec<ToastItem>,
    #[prop_or_default]
    pub on_dismiss: Option<Callback<usize>>,
}

#[function_component(Toast)]
pub fn toast(props: &ToastProps) -> Html {
    {
        let on_dismiss = props.on_dismiss.clone();
        let newest = props.toasts.last().map(|item| item.id);
        use_effect_with(newest, move |newest| {
            #[cfg(target_arch = "wasm32")]
            if let (Some(id), Some(cb)) = (*newest, on_dismiss) {
                wasm_bindgen_futures::spawn_local(async move {
                    gloo_timers::future::TimeoutFuture::new(TOAST_TTL_MS).await;
                    cb.emit(id);
                });
            }
            #[cfg(not(target_arch = "wasm32"))]
            let _ = (newest, on_dismiss);
            || {}
        });
    }

    html! {
        <div class="toast-stack" role="status" aria-live="polite">
            { for props.toasts.iter().map(|toast| {
                let dismiss_btn = props.on_dismiss.as_ref().map(|cb| {
                    let id = toast.id;
                    let cb = cb.clone();
                    let on_click = Callback::from(move |_| cb.emit(id));
                    html! { <button type="button" class="toast__dismiss" aria-label="Dismiss" onclick={on_click}>{"✕"}</button> }
                }).unwrap_or_default();
                html! {
                    <div class={classes!("toast", toast.kind.class())} key={toast.id}>
                        <span>{ toast.message.clone() }</span>
                        { dismiss_btn }
                    </div>
                }
            }) }
        </div>
    }
}
