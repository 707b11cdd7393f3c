use crate::pages::redirect::RedirectPage;
use crate::router::Route;
use yew::prelude::*;
#[cfg(target_arch = "wasm32")]
use yew_router::prelude::*;

/// Every route lands on the redirect page.
#[must_use]
pub fn switch(route: Route) -> Html {
    match route {
        Route::Home | Route::NotFound => html! { <RedirectPage /> },
    }
}

#[cfg(target_arch = "wasm32")]
#[function_component(App)]
pub fn app() -> Html {
    let router_base = crate::paths::router_base().map(AttrValue::from);
    html! {
        <BrowserRouter basename={router_base}>
            <Switch<Route> render={switch} />
        </BrowserRouter>
    }
}
