use axum::{Json, extract::State};
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::Ack;
use crate::error::LedgerError;
use crate::middleware::auth::{clear_session, has_session, session_cookie};
use crate::router::LedgerState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub pin: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePinRequest {
    pub current_pin: String,
    pub new_pin: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub logged_in: bool,
}

/// POST /api/login -> sets the session cookie when the PIN matches.
pub async fn login(
    State(state): State<LedgerState>,
    jar: PrivateCookieJar<Key>,
    Json(req): Json<LoginRequest>,
) -> Result<(PrivateCookieJar<Key>, Json<Ack>), LedgerError> {
    if !state.check_pin(req.pin.trim()).await? {
        warn!("login rejected");
        return Err(LedgerError::IncorrectPin);
    }
    info!("login accepted");
    let jar = jar.add(session_cookie(&state));
    Ok((jar, Json(Ack::ok())))
}

/// POST /api/logout
pub async fn logout(jar: PrivateCookieJar<Key>) -> (PrivateCookieJar<Key>, Json<Ack>) {
    (clear_session(jar), Json(Ack::ok()))
}

/// GET /api/session
pub async fn session_status(jar: PrivateCookieJar<Key>) -> Json<SessionStatus> {
    Json(SessionStatus {
        logged_in: has_session(&jar),
    })
}

/// POST /api/change-pin
pub async fn change_pin(
    State(state): State<LedgerState>,
    Json(req): Json<ChangePinRequest>,
) -> Result<Json<Ack>, LedgerError> {
    state.pin_throttle.ensure_open()?;
    state
        .store
        .change_pin(req.current_pin.trim(), req.new_pin.trim())
        .await
        .inspect_err(|e| {
            if matches!(e, LedgerError::PinMismatch) {
                state.pin_throttle.record_failure();
            }
            warn!(error = %e, "PIN change rejected");
        })?;
    Ok(Json(Ack::with_message("PIN updated successfully")))
}
