use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    middleware::from_extractor_with_state,
    routing::{get, post, put},
};
use axum_extra::extract::cookie::Key;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

use crate::config::Config;
use crate::db::LedgerStore;
use crate::error::LedgerError;
use crate::handlers::{entries, payments, reports, session, settings};
use crate::middleware::auth::RequireSession;
use crate::middleware::throttle::PinThrottle;

/// Largest request body accepted by any route.
pub const BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone)]
pub struct LedgerState {
    pub store: LedgerStore,
    pub cookie_key: Key,
    /// Shared by login, bearer and PIN-change attempts.
    pub pin_throttle: Arc<PinThrottle>,
    pub session_ttl: time::Duration,
    pub insecure_cookie: bool,
}

impl LedgerState {
    pub fn new(store: LedgerStore, cfg: &Config) -> Result<Self, LedgerError> {
        let cookie_key = match cfg.cookie_key_bytes()? {
            Some(bytes) => Key::try_from(bytes.as_slice())
                .map_err(|e| LedgerError::Config(format!("invalid cookie_secret: {e}")))?,
            None => {
                warn!("no cookie_secret configured; sessions end when the server restarts");
                Key::generate()
            }
        };
        let per_minute =
            NonZeroU32::new(cfg.login_attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        Ok(Self {
            store,
            cookie_key,
            pin_throttle: Arc::new(PinThrottle::per_minute(per_minute)),
            session_ttl: time::Duration::days(cfg.session_days.max(1)),
            insecure_cookie: cfg.insecure_cookie,
        })
    }

    /// Check `candidate` against the stored PIN, refusing while locked out
    /// and spending an attempt when it is wrong.
    pub async fn check_pin(&self, candidate: &str) -> Result<bool, LedgerError> {
        self.pin_throttle.ensure_open()?;
        let ok = self.store.verify_pin(candidate).await?;
        if !ok {
            self.pin_throttle.record_failure();
        }
        Ok(ok)
    }
}

impl FromRef<LedgerState> for Key {
    fn from_ref(state: &LedgerState) -> Self {
        state.cookie_key.clone()
    }
}

pub fn ledger_router(state: LedgerState) -> Router {
    let protected = Router::new()
        .route(
            "/api/entries",
            get(entries::list_entries)
                .post(entries::save_entry)
                .delete(entries::delete_entry_by_query),
        )
        .route(
            "/api/entries/{id}",
            put(entries::update_entry).delete(entries::delete_entry),
        )
        .route(
            "/api/payments",
            get(payments::list_payments)
                .post(payments::save_payment)
                .delete(payments::delete_payment_by_query),
        )
        .route(
            "/api/payments/{id}",
            put(payments::update_payment).delete(payments::delete_payment),
        )
        .route(
            "/api/settings",
            get(settings::get_settings).post(settings::update_settings),
        )
        .route("/api/change-pin", post(session::change_pin))
        .route("/api/summary", get(reports::month_summary))
        .route("/api/report", get(reports::report_pdf))
        .route("/api/report/share", get(reports::share_report))
        .route_layer(from_extractor_with_state::<RequireSession, _>(
            state.clone(),
        ));

    Router::new()
        .route("/api/login", post(session::login))
        .route("/api/logout", post(session::logout))
        .route("/api/session", get(session::session_status))
        .merge(protected)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
