//! API models for the DispatchBox target endpoints.
//!
//! - `GET /target-types` returns one [`HandlerInfo`](crate::handlers::HandlerInfo) per type
//! - `POST /target-types/{kind}/form` normalizes a form submission into a redacted target record
//! - `GET /targets` lists configured targets as [`TargetSummary`]
//! - `POST /targets/{name}/test` returns a [`ProbeResult`](crate::handlers::ProbeResult)

use serde::{Deserialize, Serialize};

use crate::targets::TargetKind;

#[derive(Debug, Serialize, Deserialize)]
pub struct TargetSummary {
    pub name: String,
    pub target_type: TargetKind,
}

/// Query parameters for the form endpoint
#[derive(Debug, Default, Deserialize)]
pub struct FormQuery {
    /// Name of the configured target being edited, if any
    pub current: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
