use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::info;

use super::MonthQuery;
use crate::error::LedgerError;
use crate::router::LedgerState;
use crate::service::{ChartPoint, MonthlyReport, MonthlySummary, daily_series};
use crate::types::{AppSettings, Month};

#[derive(Debug, Serialize)]
pub struct MonthView {
    pub month: Month,
    pub summary: MonthlySummary,
    pub chart: Vec<ChartPoint>,
    pub settings: AppSettings,
}

#[derive(Debug, Serialize)]
pub struct ShareMessage {
    pub text: String,
    pub url: String,
}

async fn load_report(state: &LedgerState, month: Month) -> Result<MonthlyReport, LedgerError> {
    let entries = state.store.list_entries(Some(month)).await?;
    let payments = state.store.list_payments(Some(month)).await?;
    Ok(MonthlyReport::new(month, entries, &payments))
}

/// GET /api/summary?month= -> dashboard numbers and the daily series.
pub async fn month_summary(
    State(state): State<LedgerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthView>, LedgerError> {
    let month = query.month_or_current()?;
    let report = load_report(&state, month).await?;
    let settings = state.store.app_settings().await?;
    Ok(Json(MonthView {
        month,
        summary: report.summary,
        chart: daily_series(month, &report.entries),
        settings,
    }))
}

/// GET /api/report?month= -> PDF download.
pub async fn report_pdf(
    State(state): State<LedgerState>,
    Query(query): Query<MonthQuery>,
) -> Result<impl IntoResponse, LedgerError> {
    let month = query.month_or_current()?;
    let report = load_report(&state, month).await?;
    let pdf = report.to_pdf()?;
    info!(%month, bytes = pdf.len(), "report rendered");
    let disposition = format!("attachment; filename=\"{}\"", report.filename());
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}

/// GET /api/report/share?month= -> text message plus a wa.me link.
pub async fn share_report(
    State(state): State<LedgerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<ShareMessage>, LedgerError> {
    let month = query.month_or_current()?;
    let report = load_report(&state, month).await?;
    Ok(Json(ShareMessage {
        text: report.share_text(),
        url: report.share_url(),
    }))
}
