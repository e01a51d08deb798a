pub mod coerce;
pub mod month;
pub mod settings;

pub use month::Month;
pub use settings::{AppSettings, Theme};
