//! Catalog Domain
//!
//! Hierarchical products with attached images.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, audit events
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validators, projection, error mapping
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← In-memory or Postgres, cascading delete
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Records, inputs, entities
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_catalog::{handlers, CatalogService, InMemoryCatalogRepository};
//!
//! let service = CatalogService::new(InMemoryCatalogRepository::new());
//! let router = axum::Router::new().nest("/product", handlers::router(service));
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod projection;
pub mod repository;
pub mod service;
pub mod validator;

pub use error::{CatalogError, CatalogResult};
pub use models::{
    DeletedTree, Image, ImageInput, ImageType, NewImage, NewProduct, Product, ProductDetails,
    ProductInput, ProductRef, ReferenceInput,
};
pub use postgres::PgCatalogRepository;
pub use projection::Projection;
pub use repository::{CatalogRepository, InMemoryCatalogRepository};
pub use service::CatalogService;
pub use validator::{ImageValidator, ProductValidator};
