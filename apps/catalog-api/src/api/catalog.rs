use axum::Router;
use domain_catalog::{CatalogService, InMemoryCatalogRepository, PgCatalogRepository, handlers};

pub fn router(state: &crate::state::AppState) -> Router {
    match &state.db {
        Some(db) => handlers::router(CatalogService::new(PgCatalogRepository::new(db.clone()))),
        None => {
            tracing::warn!("Using in-memory catalog storage; data is lost on restart");
            handlers::router(CatalogService::new(InMemoryCatalogRepository::new()))
        }
    }
}
