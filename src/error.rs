use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum LedgerError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Current PIN is incorrect")]
    PinMismatch,

    #[error("Incorrect PIN")]
    IncorrectPin,

    #[error("PIN must be exactly 4 digits")]
    InvalidPinFormat,

    #[error("New PIN and confirmation do not match")]
    PinConfirmationMismatch,

    #[error("Too many PIN attempts; try again later")]
    TooManyAttempts,

    #[error("Login required")]
    Unauthorized,

    #[error("invalid month `{0}`, expected YYYY-MM")]
    InvalidMonth(String),

    #[error("setting `{0}` cannot be written here")]
    ReadOnlySetting(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),
}

impl LedgerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            LedgerError::PinMismatch => (StatusCode::BAD_REQUEST, "PIN_MISMATCH"),
            LedgerError::InvalidPinFormat | LedgerError::PinConfirmationMismatch => {
                (StatusCode::BAD_REQUEST, "INVALID_PIN")
            }
            LedgerError::InvalidMonth(_) | LedgerError::ReadOnlySetting(_) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            LedgerError::Unauthorized | LedgerError::IncorrectPin => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
            }
            LedgerError::TooManyAttempts => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT"),
            LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            LedgerError::UpstreamStatus(code) => (*code, "UPSTREAM_ERROR"),
            LedgerError::Reqwest(_) | LedgerError::UrlParse(_) => {
                (StatusCode::BAD_GATEWAY, "BAD_GATEWAY")
            }
            LedgerError::Json(_)
            | LedgerError::DatabaseError(_)
            | LedgerError::Config(_)
            | LedgerError::Pdf(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "An internal server error occurred.".to_string()
        } else {
            self.to_string()
        };
        let body = ApiErrorResponse {
            success: false,
            code: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Error body shared by every endpoint; `success` mirrors the success payloads.
#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn pin_mismatch_is_a_400_with_message() {
        let resp = LedgerError::PinMismatch.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["message"], "Current PIN is incorrect");
    }

    #[tokio::test]
    async fn database_errors_hide_detail() {
        let resp = LedgerError::DatabaseError(SqlxError::RowNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["code"], "INTERNAL_ERROR");
        assert!(!v["message"].as_str().unwrap().contains("no rows"));
    }
}
