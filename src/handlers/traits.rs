use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::registry::RegistryError;
use super::types::{DispatchContext, DispatchOutcome, HandlerInfo, ProbeResult};
use crate::dicomweb::{ConfigurationError, RequestError};
use crate::payload::PayloadParseError;
use crate::targets::{FormData, TargetRecord, ValidationError};

/// Everything that can stop a dispatch. Never downgraded to success.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("cannot build client: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Payload(#[from] PayloadParseError),

    #[error("request to target failed: {0}")]
    Request(#[from] RequestError),

    #[error("did not store all instances: submitted {submitted}, accepted {accepted}")]
    Incomplete {
        submitted: usize,
        accepted: usize,
        /// Raw remote response.
        response: String,
    },

    #[error("dispatch deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// Capability set implemented once per target type.
///
/// Handlers are built at startup and hold no per-target state: the record is
/// passed to every call.
#[async_trait]
pub trait TargetHandler: Send + Sync {
    /// Display name and icon for this target type
    fn info(&self) -> HandlerInfo;

    /// Normalize a form submission into a validated record.
    ///
    /// `current` is the record being edited, if any.
    fn from_form(
        &self,
        form: &FormData,
        current: Option<&TargetRecord>,
    ) -> Result<TargetRecord, ValidationError>;

    /// Transmit every payload object under `source_folder` and verify that all were accepted.
    async fn send_to_target(
        &self,
        task_id: &str,
        target: &TargetRecord,
        dispatch: &DispatchContext,
        source_folder: &Path,
        task: &Value,
    ) -> Result<DispatchOutcome, DispatchError>;

    /// Read-only connectivity probe. Failures become `false` entries, never errors.
    async fn test_connection(&self, _target: &TargetRecord, _target_name: &str) -> ProbeResult {
        ProbeResult::new()
    }
}
