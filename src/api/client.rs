use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use url::Url;

use crate::db::models::{Entry, EntryInput, Payment, PaymentInput};
use crate::error::LedgerError;
use crate::handlers::Ack;
use crate::service::{ChartPoint, MonthlyReport, MonthlySummary, daily_series};
use crate::types::settings::is_valid_pin;
use crate::types::{AppSettings, Month, Theme};

/// Partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

/// Everything the dashboard shows for one month.
#[derive(Debug, Clone)]
pub struct MonthSnapshot {
    pub month: Month,
    pub entries: Vec<Entry>,
    pub payments: Vec<Payment>,
    pub settings: AppSettings,
}

impl MonthSnapshot {
    pub fn summary(&self) -> MonthlySummary {
        MonthlySummary::compute(&self.entries, &self.payments)
    }

    pub fn chart(&self) -> Vec<ChartPoint> {
        daily_series(self.month, &self.entries)
    }

    pub fn report(&self) -> MonthlyReport {
        MonthlyReport::new(self.month, self.entries.clone(), &self.payments)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// HTTP client for the ledger API, authenticating with the PIN as a bearer token.
#[derive(Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    base: Url,
    pin: String,
}

impl LedgerClient {
    pub fn new(base: Url, pin: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base, pin)
    }

    pub fn with_client(http: reqwest::Client, base: Url, pin: impl Into<String>) -> Self {
        Self {
            http,
            base,
            pin: pin.into(),
        }
    }

    fn url(&self, path: &str) -> Result<Url, LedgerError> {
        Ok(self.base.join(path)?)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, LedgerError> {
        let resp = req.bearer_auth(&self.pin).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let body = resp.bytes().await?;
        let err: Option<ErrorBody> = serde_json::from_slice(&body).ok();
        let code = err.as_ref().map(|e| e.code.as_str()).unwrap_or_default();
        warn!(
            %status,
            code,
            message = err.as_ref().map(|e| e.message.as_str()).unwrap_or_default(),
            "ledger request failed"
        );
        Err(match (status, code) {
            (StatusCode::BAD_REQUEST, "PIN_MISMATCH") => LedgerError::PinMismatch,
            (StatusCode::BAD_REQUEST, "INVALID_PIN") => LedgerError::InvalidPinFormat,
            (StatusCode::UNAUTHORIZED, _) => LedgerError::Unauthorized,
            (StatusCode::TOO_MANY_REQUESTS, _) => LedgerError::TooManyAttempts,
            (StatusCode::NOT_FOUND, "NOT_FOUND") => LedgerError::NotFound("record"),
            _ => LedgerError::UpstreamStatus(status),
        })
    }

    /// Check the PIN against the server.
    pub async fn login(&self) -> Result<(), LedgerError> {
        let req = self
            .http
            .post(self.url("/api/login")?)
            .json(&serde_json::json!({ "pin": self.pin }));
        let _: Ack = self.send(req).await.map_err(|e| match e {
            LedgerError::Unauthorized => LedgerError::IncorrectPin,
            other => other,
        })?;
        Ok(())
    }

    pub async fn entries(&self, month: Month) -> Result<Vec<Entry>, LedgerError> {
        let req = self
            .http
            .get(self.url("/api/entries")?)
            .query(&[("month", month.to_string())]);
        self.send(req).await
    }

    pub async fn payments(&self, month: Month) -> Result<Vec<Payment>, LedgerError> {
        let req = self
            .http
            .get(self.url("/api/payments")?)
            .query(&[("month", month.to_string())]);
        self.send(req).await
    }

    pub async fn settings(&self) -> Result<AppSettings, LedgerError> {
        let map: BTreeMap<String, String> =
            self.send(self.http.get(self.url("/api/settings")?)).await?;
        Ok(AppSettings::from_map(&map))
    }

    /// Fetch entries, payments and settings for `month` concurrently.
    pub async fn month_snapshot(&self, month: Month) -> Result<MonthSnapshot, LedgerError> {
        let (entries, payments, settings) =
            futures::try_join!(self.entries(month), self.payments(month), self.settings())?;
        debug!(%month, entries = entries.len(), payments = payments.len(), "month fetched");
        Ok(MonthSnapshot {
            month,
            entries,
            payments,
            settings,
        })
    }

    /// Save the day's entry, replacing any existing one. Returns the row id.
    pub async fn save_entry(&self, input: &EntryInput) -> Result<i64, LedgerError> {
        let req = self.http.post(self.url("/api/entries")?).json(input);
        let ack: Ack = self.send(req).await?;
        ack.id.ok_or(LedgerError::UpstreamStatus(StatusCode::OK))
    }

    pub async fn update_entry(&self, id: i64, input: &EntryInput) -> Result<(), LedgerError> {
        let req = self
            .http
            .put(self.url(&format!("/api/entries/{id}"))?)
            .json(input);
        let _: Ack = self.send(req).await?;
        Ok(())
    }

    pub async fn delete_entry(&self, id: i64) -> Result<(), LedgerError> {
        let req = self.http.delete(self.url(&format!("/api/entries/{id}"))?);
        let _: Ack = self.send(req).await?;
        Ok(())
    }

    /// Insert, or update in place when `input.id` is set. Returns the row id.
    pub async fn save_payment(&self, input: &PaymentInput) -> Result<i64, LedgerError> {
        let req = self.http.post(self.url("/api/payments")?).json(input);
        let ack: Ack = self.send(req).await?;
        ack.id.ok_or(LedgerError::UpstreamStatus(StatusCode::OK))
    }

    pub async fn delete_payment(&self, id: i64) -> Result<(), LedgerError> {
        let req = self.http.delete(self.url(&format!("/api/payments/{id}"))?);
        let _: Ack = self.send(req).await?;
        Ok(())
    }

    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<(), LedgerError> {
        let req = self.http.post(self.url("/api/settings")?).json(update);
        let _: Ack = self.send(req).await?;
        Ok(())
    }

    /// Change the PIN. The new PIN must be 4 digits and match its confirmation;
    /// on success this client switches to it.
    pub async fn change_pin(
        &mut self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), LedgerError> {
        if new != confirm {
            return Err(LedgerError::PinConfirmationMismatch);
        }
        if !is_valid_pin(new) {
            return Err(LedgerError::InvalidPinFormat);
        }
        let req = self
            .http
            .post(self.url("/api/change-pin")?)
            .json(&serde_json::json!({ "currentPin": current, "newPin": new }));
        let _: Ack = self.send(req).await?;
        self.pin = new.to_string();
        Ok(())
    }
}
