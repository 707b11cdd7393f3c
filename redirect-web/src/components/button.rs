use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    pub label: AttrValue,
    #[prop_or_default]
    pub onclick: Callback<MouseEvent>,
    #[prop_or_default]
    pub class: Classes,
    #[prop_or_default]
    pub disabled: bool,
}

#[function_component(Button)]
pub fn button(p: &Props) -> Html {
    let onclick = p.onclick.clone();
    let label = p.label.clone();
    html! {
        <button type="button" class={classes!("btn", p.class.clone())} disabled={p.disabled} {onclick}>
            { label }
        </button>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use yew::LocalServerRenderer;

    #[test]
    fn button_renders_label() {
        let props = Props {
            label: AttrValue::from("Continue to the App Store"),
            onclick: Callback::noop(),
            class: Classes::new(),
            disabled: false,
        };
        let html = block_on(LocalServerRenderer::<Button>::with_props(props).render());
        assert!(html.contains("Continue to the App Store"));
        assert!(html.contains("type=\"button\""));
    }
}
