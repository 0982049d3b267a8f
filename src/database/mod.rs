//! # Database Module
//!
//! PostgreSQL integration using tokio-postgres and deadpool for async operations.
//! Includes connection management, models, migrations and the `Store`
//! implementations used by the handlers.

pub mod connection;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod postgres;
pub mod store;

pub use connection::{DatabaseConfig, DatabaseConnection};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{Catalog, ListFilter, Paged, Store, StoreError};
