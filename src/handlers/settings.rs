use axum::{Json, extract::State};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::info;

use super::Ack;
use crate::error::LedgerError;
use crate::router::LedgerState;
use crate::types::settings::PIN_KEY;

/// GET /api/settings -> flat key/value map. The PIN never leaves the server.
pub async fn get_settings(
    State(state): State<LedgerState>,
) -> Result<Json<BTreeMap<String, String>>, LedgerError> {
    let mut map = state.store.settings_map().await?;
    map.remove(PIN_KEY);
    Ok(Json(map))
}

/// POST /api/settings -> upsert every key of a flat JSON object.
pub async fn update_settings(
    State(state): State<LedgerState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Ack>, LedgerError> {
    let pairs = settings_pairs(body)?;
    state.store.put_settings(&pairs).await?;
    info!(keys = ?pairs.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(), "settings updated");
    Ok(Json(Ack::ok()))
}

/// Stringify values: strings verbatim, other scalars via their JSON text, nulls dropped.
fn settings_pairs(body: Map<String, Value>) -> Result<Vec<(String, String)>, LedgerError> {
    let mut pairs = Vec::with_capacity(body.len());
    for (key, value) in body {
        if key == PIN_KEY {
            return Err(LedgerError::ReadOnlySetting(key));
        }
        let value = match value {
            Value::Null => continue,
            Value::String(s) => s,
            other => other.to_string(),
        };
        pairs.push((key, value));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn values_are_stringified() {
        let pairs = settings_pairs(body(json!({
            "default_rate": 64.5,
            "theme": "forest",
            "compact": true,
            "unused": null,
        })))
        .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("compact".to_string(), "true".to_string()),
                ("default_rate".to_string(), "64.5".to_string()),
                ("theme".to_string(), "forest".to_string()),
            ]
        );
    }

    #[test]
    fn pin_cannot_be_set_directly() {
        assert!(matches!(
            settings_pairs(body(json!({"pin": "0000"}))),
            Err(LedgerError::ReadOnlySetting(k)) if k == "pin"
        ));
    }
}
