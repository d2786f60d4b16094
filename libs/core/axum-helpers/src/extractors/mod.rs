//! Custom extractors for Axum handlers.
//!
//! Each one rejects with the shared [`AppError`](crate::errors::AppError)
//! envelope instead of axum's plain-text rejection bodies.

pub mod id_path;
pub mod json_body;
pub mod query_params;

pub use id_path::IdPath;
pub use json_body::JsonBody;
pub use query_params::QueryParams;
