//! Sea-ORM entities backing the Postgres repository

pub mod images;
pub mod products;
