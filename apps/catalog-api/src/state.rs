//! Application state shared by the route builders and the readiness probe.

/// Cloned into routers; only `Arc`-backed handles inside.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL pool, absent with `CATALOG_STORAGE=memory`
    pub db: Option<database::postgres::DatabaseConnection>,
}
