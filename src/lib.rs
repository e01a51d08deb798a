pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod types;

pub use error::LedgerError;
pub use db::LedgerStore;
pub use router::{LedgerState, ledger_router};
