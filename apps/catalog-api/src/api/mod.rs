use axum::Router;

pub mod catalog;
pub mod health;

/// Prefix handed to `create_router`; the catalog is served from the root.
pub const API_PREFIX: &str = "";

/// Mount point of the catalog routes.
pub const PRODUCT_PATH: &str = "/product";

/// Creates the API routes, mounted under [`API_PREFIX`] by `create_router`.
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new().nest(PRODUCT_PATH, catalog::router(state))
}

/// Creates a router with the /ready endpoint that performs actual health checks.
pub fn ready_router(state: crate::state::AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
