//! Liveness probe.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::state::SharedState;

/// `GET /healthcheck`: process is up, plus a couple of cheap gauges.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<Value> {
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    Json(json!({
        "status": "ok",
        "time": now,
        "rooms": state.registry.len(),
    }))
}
