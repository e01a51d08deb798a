//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and request bodies
//! - `schema.rs`: SQL DDL per backend (SQLite and Postgres)
//! - `placeholder.rs`: `$N` to `?N` rewriting for SQLite
//! - `store.rs`: `LedgerStore`, the single entry point for queries

pub mod models;
pub mod placeholder;
pub mod schema;
pub mod store;

pub use models::{Entry, EntryInput, Payment, PaymentInput};
pub use schema::{POSTGRES_INIT, SQLITE_INIT};
pub use store::{Backend, LedgerStore};
