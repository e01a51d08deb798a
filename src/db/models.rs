use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::coerce;

/// One day's delivery. `date` is unique across the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub date: NaiveDate,
    pub quantity: f64,
    pub rate: f64,
}

impl Entry {
    pub fn amount(&self) -> f64 {
        self.quantity * self.rate
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: f64,
}

/// Body of `POST /api/entries` and `PUT /api/entries/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryInput {
    pub date: NaiveDate,
    #[serde(deserialize_with = "coerce::number")]
    pub quantity: f64,
    #[serde(deserialize_with = "coerce::number")]
    pub rate: f64,
}

/// Body of `POST /api/payments`; an `id` turns the insert into an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub date: NaiveDate,
    #[serde(deserialize_with = "coerce::number")]
    pub amount: f64,
}

pub(crate) fn date_to_sql(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn date_from_sql(raw: &str) -> Result<NaiveDate, sqlx::Error> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
