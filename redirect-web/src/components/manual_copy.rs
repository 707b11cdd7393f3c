//! Dialog shown when the referral code could not be copied automatically.
use crate::components::button::Button;
use crate::components::modal::Modal;
use yew::prelude::*;

pub const DIALOG_TITLE: &str = "Copy Your Referral Code";
pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";
pub const CONTINUE_LABEL: &str = "Continue to the App Store";

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    pub open: bool,
    pub code: AttrValue,
    /// Set once a copy from inside the dialog succeeded.
    #[prop_or_default]
    pub copied: bool,
    pub on_copy: Callback<()>,
    pub on_continue: Callback<()>,
    pub on_close: Callback<()>,
}

#[function_component(ManualCopy)]
pub fn manual_copy(p: &Props) -> Html {
    let select_all = Callback::from(|e: MouseEvent| {
        if let Some(input) = e.target_dyn_into::<web_sys::HtmlInputElement>() {
            input.select();
        }
    });
    let on_copy = {
        let cb = p.on_copy.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let on_continue = {
        let cb = p.on_continue.clone();
        Callback::from(move |_| cb.emit(()))
    };
    let copy_label = if p.copied { COPIED_LABEL } else { COPY_LABEL };

    html! {
        <Modal
            open={p.open}
            title={DIALOG_TITLE}
            description={AttrValue::from("We couldn't copy your referral code automatically. Copy it below before continuing.")}
            on_close={p.on_close.clone()}
            return_focus_id={AttrValue::from("store-link")}
        >
            <div class="manual-copy">
                <label for="referral-code" class="sr-only">{ "Referral code" }</label>
                <input
                    id="referral-code"
                    class="manual-copy__code"
                    type="text"
                    readonly=true
                    value={p.code.clone()}
                    onclick={select_all}
                />
                <Button label={AttrValue::from(copy_label)} onclick={on_copy} class={classes!("btn-secondary")} />
            </div>
            <p class="manual-copy__tip">
                { "Tip: if the Copy button doesn't work, tap and hold the code to select and copy it." }
            </p>
            <Button label={AttrValue::from(CONTINUE_LABEL)} onclick={on_continue} class={classes!("btn-primary")} />
        </Modal>
    }
}
