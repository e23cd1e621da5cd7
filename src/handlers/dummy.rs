use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::info;

use super::traits::{DispatchError, TargetHandler};
use super::types::{DispatchContext, DispatchOutcome, HandlerInfo};
use crate::targets::{DummyTarget, FormData, TargetKind, TargetRecord, ValidationError};

/// Handler for `dummy` targets.
///
/// Accepts every dispatch without transmitting anything. Useful for testing a
/// pipeline end to end without a real receiver.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyHandler;

#[async_trait]
impl TargetHandler for DummyHandler {
    fn info(&self) -> HandlerInfo {
        HandlerInfo {
            kind: TargetKind::Dummy,
            display_name: "Dummy",
            icon: "fa-flask",
        }
    }

    fn from_form(
        &self,
        _form: &FormData,
        _current: Option<&TargetRecord>,
    ) -> Result<TargetRecord, ValidationError> {
        Ok(TargetRecord::Dummy(DummyTarget::default()))
    }

    async fn send_to_target(
        &self,
        task_id: &str,
        _target: &TargetRecord,
        dispatch: &DispatchContext,
        source_folder: &Path,
        _task: &Value,
    ) -> Result<DispatchOutcome, DispatchError> {
        info!(
            task_id,
            target = %dispatch.target_name,
            folder = %source_folder.display(),
            "Dummy target accepted dispatch"
        );
        Ok(DispatchOutcome::success(0))
    }
}
