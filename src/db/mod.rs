//! Database module: registry row models, DDL and storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring the two registry tables
//! - `schema.rs`: Postgres DDL for the tables and the dedup trigger
//! - `mapping.rs`: source export columns -> registry columns
//! - `postgres.rs`: append/read helpers over a pool

pub mod mapping;
pub mod models;
pub mod postgres;
pub mod schema;

pub use models::{NewRegistryRecord, RegistryFields, RegistryRecord, UniqueRegistryRecord};
pub use postgres::{PgPool, RegistryStorage};
pub use schema::{DESCRIPTIVE_COLUMNS, REGISTRY_TABLE, SCHEMA_STATEMENTS, UNIQUE_TABLE};
