pub mod client;

pub use client::{LedgerClient, MonthSnapshot, SettingsUpdate};
