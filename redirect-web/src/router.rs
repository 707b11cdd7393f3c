use yew_router::prelude::*;

#[derive(Clone, Debug, Routable, PartialEq, Eq)]
pub enum Route {
    #[at("/")]
    Home,
    /// Campaign links may point at any path; every path redirects.
    #[at("/404")]
    #[not_found]
    NotFound,
}
