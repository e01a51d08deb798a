use crate::db::models::{Entry, EntryInput, Payment, PaymentInput, date_from_sql, date_to_sql};
use crate::db::placeholder;
use crate::db::schema::{self, POSTGRES_INIT, SEED_SETTING, SQLITE_INIT};
use crate::error::LedgerError;
use crate::types::Month;
use crate::types::settings::{AppSettings, DEFAULT_PIN, PIN_KEY, SEED_SETTINGS, is_valid_pin};
use backon::{ExponentialBuilder, Retryable};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

const UPSERT_SETTING: &str = "INSERT INTO settings (key, value) VALUES ($1, $2) \
     ON CONFLICT (key) DO UPDATE SET value = excluded.value";

/// Which database sits behind the pool, taken from the URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    pub fn from_url(database_url: &str) -> Result<Self, LedgerError> {
        let scheme = database_url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default();
        match scheme.as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            _ => Err(LedgerError::Config(format!(
                "unsupported database url scheme `{scheme}`; use sqlite: or postgres:"
            ))),
        }
    }

    fn ddl(self) -> &'static str {
        match self {
            Backend::Sqlite => SQLITE_INIT,
            Backend::Postgres => POSTGRES_INIT,
        }
    }
}

/// Ledger tables over either backend. Queries are written with `$N`
/// placeholders and rewritten for SQLite on the way out.
#[derive(Clone)]
pub struct LedgerStore {
    pool: AnyPool,
    backend: Backend,
}

impl LedgerStore {
    /// Connect, retrying transient failures, then initialize the schema.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, LedgerError> {
        let backend = Backend::from_url(database_url)?;
        sqlx::any::install_default_drivers();

        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(5)
            .with_jitter();

        let pool = (|| async {
            AnyPoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect(database_url)
                .await
        })
        .retry(retry_policy)
        .when(|e| matches!(e, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut))
        .notify(|err, delay| {
            warn!(error = %err, ?delay, "database connection failed; retrying");
        })
        .await?;

        let store = Self { pool, backend };
        store.init_schema().await?;
        info!(?backend, "ledger store ready");
        Ok(store)
    }

    fn sql<'q>(&self, query: &'q str) -> Cow<'q, str> {
        match self.backend {
            Backend::Sqlite => placeholder::to_sqlite(query),
            Backend::Postgres => Cow::Borrowed(query),
        }
    }

    /// Create the tables if missing and seed default settings. Idempotent.
    pub async fn init_schema(&self) -> Result<(), LedgerError> {
        for stmt in schema::statements(self.backend.ddl()) {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        let seed = self.sql(SEED_SETTING);
        for (key, value) in SEED_SETTINGS {
            sqlx::query(&seed)
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    /// Entries for `month` (every entry when `None`), ordered by date.
    pub async fn list_entries(&self, month: Option<Month>) -> Result<Vec<Entry>, LedgerError> {
        let rows = match month {
            Some(month) => {
                let sql = self.sql(
                    "SELECT id, date, quantity, rate FROM entries WHERE date LIKE $1 ORDER BY date ASC",
                );
                sqlx::query(&sql)
                    .bind(month.like_pattern())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT id, date, quantity, rate FROM entries ORDER BY date ASC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(Self::row_to_entry).collect()
    }

    pub async fn get_entry(&self, id: i64) -> Result<Option<Entry>, LedgerError> {
        let sql = self.sql("SELECT id, date, quantity, rate FROM entries WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_entry).transpose()
    }

    /// Insert the day's entry, replacing quantity and rate if the date exists.
    /// Returns the row id.
    pub async fn upsert_entry(&self, input: &EntryInput) -> Result<i64, LedgerError> {
        let sql = self.sql(
            r#"
            INSERT INTO entries (date, quantity, rate) VALUES ($1, $2, $3)
            ON CONFLICT (date) DO UPDATE SET
                quantity = excluded.quantity,
                rate = excluded.rate
            RETURNING id
            "#,
        );
        let rec: (i64,) = sqlx::query_as(&sql)
            .bind(date_to_sql(input.date))
            .bind(input.quantity)
            .bind(input.rate)
            .fetch_one(&self.pool)
            .await?;
        debug!(id = rec.0, date = %input.date, "entry saved");
        Ok(rec.0)
    }

    /// Overwrite an entry by id.
    pub async fn update_entry(&self, id: i64, input: &EntryInput) -> Result<(), LedgerError> {
        let sql = self.sql("UPDATE entries SET date = $1, quantity = $2, rate = $3 WHERE id = $4");
        let done = sqlx::query(&sql)
            .bind(date_to_sql(input.date))
            .bind(input.quantity)
            .bind(input.rate)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(LedgerError::NotFound("entry"));
        }
        Ok(())
    }

    /// Returns whether a row was removed.
    pub async fn delete_entry(&self, id: i64) -> Result<bool, LedgerError> {
        let sql = self.sql("DELETE FROM entries WHERE id = $1");
        let done = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn list_payments(&self, month: Option<Month>) -> Result<Vec<Payment>, LedgerError> {
        let rows = match month {
            Some(month) => {
                let sql = self.sql(
                    "SELECT id, date, amount FROM payments WHERE date LIKE $1 ORDER BY date ASC, id ASC",
                );
                sqlx::query(&sql)
                    .bind(month.like_pattern())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT id, date, amount FROM payments ORDER BY date ASC, id ASC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(Self::row_to_payment).collect()
    }

    /// Update in place when `input.id` is set, insert otherwise. Returns the row id.
    pub async fn save_payment(&self, input: &PaymentInput) -> Result<i64, LedgerError> {
        match input.id {
            Some(id) => {
                self.update_payment(id, input).await?;
                Ok(id)
            }
            None => {
                let sql =
                    self.sql("INSERT INTO payments (date, amount) VALUES ($1, $2) RETURNING id");
                let rec: (i64,) = sqlx::query_as(&sql)
                    .bind(date_to_sql(input.date))
                    .bind(input.amount)
                    .fetch_one(&self.pool)
                    .await?;
                debug!(id = rec.0, date = %input.date, "payment recorded");
                Ok(rec.0)
            }
        }
    }

    pub async fn update_payment(&self, id: i64, input: &PaymentInput) -> Result<(), LedgerError> {
        let sql = self.sql("UPDATE payments SET date = $1, amount = $2 WHERE id = $3");
        let done = sqlx::query(&sql)
            .bind(date_to_sql(input.date))
            .bind(input.amount)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(LedgerError::NotFound("payment"));
        }
        Ok(())
    }

    pub async fn delete_payment(&self, id: i64) -> Result<bool, LedgerError> {
        let sql = self.sql("DELETE FROM payments WHERE id = $1");
        let done = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    /// Raw key/value settings; rows with a NULL value are left out.
    pub async fn settings_map(&self) -> Result<BTreeMap<String, String>, LedgerError> {
        let rows = sqlx::query("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;
        let mut map = BTreeMap::new();
        for row in rows {
            let key: String = row.try_get("key")?;
            let value: Option<String> = row.try_get("value")?;
            if let Some(value) = value {
                map.insert(key, value);
            }
        }
        Ok(map)
    }

    pub async fn app_settings(&self) -> Result<AppSettings, LedgerError> {
        Ok(AppSettings::from_map(&self.settings_map().await?))
    }

    /// Upsert every pair in one transaction.
    pub async fn put_settings(&self, pairs: &[(String, String)]) -> Result<(), LedgerError> {
        let sql = self.sql(UPSERT_SETTING);
        let mut tx = self.pool.begin().await?;
        for (key, value) in pairs {
            sqlx::query(&sql)
                .bind(key.as_str())
                .bind(value.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Constant-time comparison against the stored PIN (or the default when unset).
    pub async fn verify_pin(&self, candidate: &str) -> Result<bool, LedgerError> {
        let stored = self.app_settings().await?.pin;
        Ok(pins_match(candidate, &stored))
    }

    /// Replace the PIN after checking the current one. Nothing is written on mismatch.
    pub async fn change_pin(&self, current: &str, new: &str) -> Result<(), LedgerError> {
        let select = self.sql("SELECT value FROM settings WHERE key = $1");
        let upsert = self.sql(UPSERT_SETTING);

        let mut tx = self.pool.begin().await?;
        let stored: Option<(Option<String>,)> = sqlx::query_as(&select)
            .bind(PIN_KEY)
            .fetch_optional(&mut *tx)
            .await?;
        let stored = stored
            .and_then(|(v,)| v)
            .unwrap_or_else(|| DEFAULT_PIN.to_string());

        if !pins_match(current, &stored) {
            return Err(LedgerError::PinMismatch);
        }
        if !is_valid_pin(new) {
            return Err(LedgerError::InvalidPinFormat);
        }

        sqlx::query(&upsert)
            .bind(PIN_KEY)
            .bind(new)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!("PIN changed");
        Ok(())
    }

    fn row_to_entry(row: AnyRow) -> Result<Entry, LedgerError> {
        let id: i64 = row.try_get("id")?;
        let date: String = row.try_get("date")?;
        let quantity: Option<f64> = row.try_get("quantity")?;
        let rate: Option<f64> = row.try_get("rate")?;
        Ok(Entry {
            id,
            date: date_from_sql(&date)?,
            quantity: quantity.unwrap_or_default(),
            rate: rate.unwrap_or_default(),
        })
    }

    fn row_to_payment(row: AnyRow) -> Result<Payment, LedgerError> {
        let id: i64 = row.try_get("id")?;
        let date: String = row.try_get("date")?;
        let amount: Option<f64> = row.try_get("amount")?;
        Ok(Payment {
            id,
            date: date_from_sql(&date)?,
            amount: amount.unwrap_or_default(),
        })
    }
}

pub(crate) fn pins_match(candidate: &str, stored: &str) -> bool {
    bool::from(candidate.as_bytes().ct_eq(stored.as_bytes()))
}
