//! Dispatch invocation: the entry point an orchestrator calls to send a
//! finished task folder to a target.

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::handlers::{
    DispatchContext, DispatchError, DispatchOutcome, HandlerRegistry, ProbeResult,
};
use crate::observability::Metrics;
use crate::targets::TargetRecord;

#[derive(Clone)]
pub struct Dispatcher {
    registry: HandlerRegistry,
    deadline: Option<Duration>,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, metrics: Arc<Metrics>) -> Self {
        Self {
            registry,
            deadline: None,
            metrics,
        }
    }

    /// Bound every send (payload parsing plus submission) by `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Send every payload object under `source_folder` to `target`.
    ///
    /// `dispatch` and `task` are only used for log correlation.
    #[instrument(skip_all, fields(task_id = %task_id, target = %dispatch.target_name))]
    pub async fn send(
        &self,
        task_id: &str,
        target: &TargetRecord,
        dispatch: &DispatchContext,
        source_folder: &Path,
        task: &Value,
    ) -> Result<DispatchOutcome, DispatchError> {
        let result = self
            .run_send(task_id, target, dispatch, source_folder, task)
            .await;

        match &result {
            Ok(outcome) => {
                self.metrics.dispatch_succeeded();
                info!(stored = outcome.stored, "Dispatch completed");
            }
            Err(e) => {
                self.metrics.dispatch_failed();
                error!(error = %e, "Dispatch failed");
            }
        }

        result
    }

    async fn run_send(
        &self,
        task_id: &str,
        target: &TargetRecord,
        dispatch: &DispatchContext,
        source_folder: &Path,
        task: &Value,
    ) -> Result<DispatchOutcome, DispatchError> {
        let handler = self.registry.for_target(target)?;
        let send = handler.send_to_target(task_id, target, dispatch, source_folder, task);

        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, send)
                .await
                .map_err(|_| DispatchError::DeadlineExceeded(deadline))?,
            None => send.await,
        }
    }

    /// Run the handler's connectivity probe. An unregistered target type yields an empty result.
    pub async fn test_connection(&self, target: &TargetRecord, target_name: &str) -> ProbeResult {
        self.metrics.probe_run();

        match self.registry.for_target(target) {
            Ok(handler) => handler.test_connection(target, target_name).await,
            Err(e) => {
                error!(target = target_name, error = %e, "No handler for probe");
                ProbeResult::new()
            }
        }
    }
}
