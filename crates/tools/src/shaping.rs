//! Normalization of upstream record-service payloads.
//!
//! The record service has shipped several field spellings over time
//! (`id` / `task_id`, `score` / `score_bps`, `bundle_uri` /
//! `evidence_bundle_uri`). Scripts always see the canonical names.

use serde_json::{json, Value as JsonValue};

/// First of `keys` present on `object` with a non-null value.
fn first_present<'a>(object: &'a JsonValue, keys: &[&str]) -> Option<&'a JsonValue> {
    keys.iter()
        .filter_map(|key| object.get(key))
        .find(|value| !value.is_null())
}

fn field(object: &JsonValue, keys: &[&str]) -> JsonValue {
    first_present(object, keys).cloned().unwrap_or(JsonValue::Null)
}

/// Shape a `GET /records` page.
///
/// `limit` and `offset` echo the upstream values when present, otherwise the
/// values that were requested.
pub fn shape_record_list(payload: &JsonValue, limit: i64, offset: i64) -> JsonValue {
    let items: Vec<JsonValue> = payload
        .get("items")
        .and_then(JsonValue::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    json!({
                        "task_id": field(item, &["task_id", "id"]),
                        "score_bps": field(item, &["score_bps", "score"]),
                        "program_id": field(item, &["program_id"]),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "items": items,
        "limit": first_present(payload, &["limit"]).cloned().unwrap_or_else(|| json!(limit)),
        "offset": first_present(payload, &["offset"]).cloned().unwrap_or_else(|| json!(offset)),
    })
}

/// Shape a `GET /receipts/{task_id}` response, keeping the raw payload.
pub fn shape_receipt(payload: &JsonValue, requested_task_id: &str) -> JsonValue {
    json!({
        "task_id": first_present(payload, &["task_id", "id"])
            .cloned()
            .unwrap_or_else(|| json!(requested_task_id)),
        "status": field(payload, &["status"]),
        "evidence_bundle_uri": field(payload, &["evidence_bundle_uri", "bundle_uri"]),
        "raw": payload,
    })
}
