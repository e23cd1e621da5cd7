use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::{info, warn};

use super::{
    models::{FormQuery, HealthResponse, TargetSummary},
    state::AppState,
};
use crate::api::error::ApiError;
use crate::handlers::{HandlerInfo, ProbeResult};
use crate::observability::MetricsSnapshot;
use crate::targets::{FormData, TargetRecord};

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Registered target types with their display metadata (GET /target-types)
pub async fn list_target_types(State(state): State<AppState>) -> Json<Vec<HandlerInfo>> {
    Json(state.registry.infos())
}

/// Normalize a form submission for a target type (POST /target-types/{kind}/form)
///
/// The body is a flat JSON object of strings. Returns the validated record
/// with secrets masked. `?current=<name>` passes a configured target as the
/// record being edited.
pub async fn normalize_form(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<FormQuery>,
    body: Bytes,
) -> Result<Json<TargetRecord>, ApiError> {
    let handler = state.registry.get_by_name(&kind)?;
    let form: FormData = serde_json::from_slice(&body)?;

    let current = match &query.current {
        Some(name) => Some(find_target(&state, name)?),
        None => None,
    };

    let record = handler.from_form(&form, current).map_err(|e| {
        warn!(target_type = %kind, error = %e, "Rejected target form");
        ApiError::from(e)
    })?;

    Ok(Json(record.redacted()))
}

/// Configured targets (GET /targets)
pub async fn list_targets(State(state): State<AppState>) -> Json<Vec<TargetSummary>> {
    let targets = state
        .config
        .targets
        .iter()
        .map(|(name, record)| TargetSummary {
            name: name.clone(),
            target_type: record.kind(),
        })
        .collect();

    Json(targets)
}

/// Run the connectivity probe for a configured target (POST /targets/{name}/test)
pub async fn test_target(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ProbeResult>, ApiError> {
    let target = find_target(&state, &name)?;
    let result = state.dispatcher.test_connection(target, &name).await;

    info!(target = %name, result = ?result, "Connectivity probe finished");
    Ok(Json(result))
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

fn find_target<'a>(state: &'a AppState, name: &str) -> Result<&'a TargetRecord, ApiError> {
    state
        .config
        .targets
        .get(name)
        .ok_or_else(|| ApiError::NotFound(format!("target '{}'", name)))
}
