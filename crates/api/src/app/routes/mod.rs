use axum::Router;

pub mod auth;
pub mod catalog;
pub mod configurator;
pub mod news;
pub mod orders;
pub mod profile;
pub mod servicing;
pub mod system;

/// Routes under `/api` that need no token.
pub fn public_router() -> Router {
    Router::new()
        .merge(auth::public())
        .merge(catalog::public())
        .merge(servicing::public())
        .merge(news::public())
}

/// Routes under `/api` that require a bearer token.
pub fn protected_router() -> Router {
    Router::new()
        .merge(auth::protected())
        .merge(configurator::protected())
        .merge(orders::protected())
        .merge(servicing::protected())
        .merge(profile::protected())
        .merge(news::protected())
}
