pub mod entries;
pub mod payments;
pub mod reports;
pub mod session;
pub mod settings;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::Month;

/// Success body for writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            id: None,
            message: None,
        }
    }

    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::ok()
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok()
        }
    }
}

/// `?month=YYYY-MM`; an absent or empty value means "no month filter".
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

impl MonthQuery {
    pub fn month(&self) -> Result<Option<Month>, LedgerError> {
        match self.month.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }

    /// The requested month, or the current one.
    pub fn month_or_current(&self) -> Result<Month, LedgerError> {
        Ok(self.month()?.unwrap_or_else(Month::current))
    }
}

/// `?id=` form of the delete routes.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i64,
}
