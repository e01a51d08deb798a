use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::info;

use super::{Ack, IdQuery, MonthQuery};
use crate::db::models::{Entry, EntryInput};
use crate::error::LedgerError;
use crate::router::LedgerState;

/// GET /api/entries?month=YYYY-MM
pub async fn list_entries(
    State(state): State<LedgerState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<Entry>>, LedgerError> {
    let entries = state.store.list_entries(query.month()?).await?;
    Ok(Json(entries))
}

/// POST /api/entries -> replaces any entry already on that date.
pub async fn save_entry(
    State(state): State<LedgerState>,
    Json(input): Json<EntryInput>,
) -> Result<Json<Ack>, LedgerError> {
    let id = state.store.upsert_entry(&input).await?;
    info!(id, date = %input.date, quantity = input.quantity, rate = input.rate, "entry saved");
    Ok(Json(Ack::with_id(id)))
}

/// PUT /api/entries/{id}
pub async fn update_entry(
    State(state): State<LedgerState>,
    Path(id): Path<i64>,
    Json(input): Json<EntryInput>,
) -> Result<Json<Ack>, LedgerError> {
    state.store.update_entry(id, &input).await?;
    info!(id, date = %input.date, "entry updated");
    Ok(Json(Ack::with_id(id)))
}

/// DELETE /api/entries/{id}
pub async fn delete_entry(
    State(state): State<LedgerState>,
    Path(id): Path<i64>,
) -> Result<Json<Ack>, LedgerError> {
    remove(&state, id).await
}

/// DELETE /api/entries?id=
pub async fn delete_entry_by_query(
    State(state): State<LedgerState>,
    Query(IdQuery { id }): Query<IdQuery>,
) -> Result<Json<Ack>, LedgerError> {
    remove(&state, id).await
}

async fn remove(state: &LedgerState, id: i64) -> Result<Json<Ack>, LedgerError> {
    let removed = state.store.delete_entry(id).await?;
    info!(id, removed, "entry delete");
    Ok(Json(Ack::ok()))
}
