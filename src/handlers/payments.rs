use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::info;

use super::{Ack, IdQuery, MonthQuery};
use crate::db::models::{Payment, PaymentInput};
use crate::error::LedgerError;
use crate::router::LedgerState;

pub async fn list_payments(
    State(state): State<LedgerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<Payment>>, LedgerError> {
    let payments = state.store.list_payments(query.month()?).await?;
    Ok(Json(payments))
}

/// POST /api/payments -> update in place when the body carries an id.
pub async fn save_payment(
    State(state): State<LedgerState>,
    Json(input): Json<PaymentInput>,
) -> Result<Json<Ack>, LedgerError> {
    let id = state.store.save_payment(&input).await?;
    info!(id, date = %input.date, amount = input.amount, updated = input.id.is_some(), "payment saved");
    Ok(Json(Ack::with_id(id)))
}

pub async fn update_payment(
    State(state): State<LedgerState>,
    Path(id): Path<i64>,
    Json(input): Json<PaymentInput>,
) -> Result<Json<Ack>, LedgerError> {
    state.store.update_payment(id, &input).await?;
    info!(id, date = %input.date, "payment updated");
    Ok(Json(Ack::with_id(id)))
}

pub async fn delete_payment(
    State(state): State<LedgerState>,
    Path(id): Path<i64>,
) -> Result<Json<Ack>, LedgerError> {
    let removed = state.store.delete_payment(id).await?;
    info!(id, removed, "payment delete");
    Ok(Json(Ack::ok()))
}

pub async fn delete_payment_by_query(
    state: State<LedgerState>,
    Query(IdQuery { id }): Query<IdQuery>,
) -> Result<Json<Ack>, LedgerError> {
    delete_payment(state, Path(id)).await
}
