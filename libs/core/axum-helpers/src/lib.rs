//! # Axum Helpers
//!
//! Shared building blocks for the HTTP services in this workspace.
//!
//! - **[`server`]**: router assembly with OpenAPI UIs, health, graceful shutdown
//! - **[`http`]**: CORS and security-header middleware
//! - **[`errors`]**: the JSON error envelope and its error codes
//! - **[`extractors`]**: id, JSON body and query extractors that reject with that envelope
//! - **[`audit`]**: structured audit events for write operations

pub mod audit;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};

pub use http::{cors_layer_from_env, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{IdPath, JsonBody, QueryParams};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
