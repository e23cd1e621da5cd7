//! DICOMweb handlers.
//!
//! The generic and the Cloud Healthcare variants share [`DicomWebHandler`];
//! a [`DicomWebFlavor`] supplies what differs between them: where the service
//! lives, how requests authenticate, and how a record is read from a form.

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::traits::{DispatchError, TargetHandler};
use super::types::{DispatchContext, DispatchOutcome, HandlerInfo, ProbeResult};
use crate::dicomweb::{
    AuthStrategy, ClientConfig, ConfigurationError, DicomWebClient, HttpConfig, ServiceLocation,
    TokenSource,
};
use crate::payload;
use crate::targets::{
    DicomWebTarget, FormData, GcpDicomWebTarget, TargetKind, TargetRecord, ValidationError,
};

/// Probe capability: the base URL did not reject our credentials.
pub const AUTHENTICATION: &str = "authentication";
/// Probe capability: a bounded study search succeeded.
pub const QIDO_QUERY: &str = "QIDO_query";

pub trait DicomWebFlavor: Send + Sync + 'static {
    type Target: Send + Sync;

    const KIND: TargetKind;
    const DISPLAY_NAME: &'static str;
    const ICON: &'static str = "fa-share-alt";

    /// Borrow the flavor's own record variant, if `record` is one.
    fn project(record: &TargetRecord) -> Option<&Self::Target>;

    fn from_form(form: &FormData) -> Result<TargetRecord, ValidationError>;

    fn location(&self, target: &Self::Target) -> ServiceLocation;

    fn credentials(&self, target: &Self::Target) -> AuthStrategy;

    fn token_source(&self) -> Option<Arc<dyn TokenSource>> {
        None
    }
}

/// Any DICOMweb server reachable by URL, with optional Basic or Bearer auth.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDicomWeb;

impl DicomWebFlavor for GenericDicomWeb {
    type Target = DicomWebTarget;

    const KIND: TargetKind = TargetKind::Dicomweb;
    const DISPLAY_NAME: &'static str = "DICOMweb";

    fn project(record: &TargetRecord) -> Option<&DicomWebTarget> {
        match record {
            TargetRecord::Dicomweb(target) => Some(target),
            _ => None,
        }
    }

    fn from_form(form: &FormData) -> Result<TargetRecord, ValidationError> {
        DicomWebTarget::from_form(form).map(TargetRecord::Dicomweb)
    }

    fn location(&self, target: &DicomWebTarget) -> ServiceLocation {
        ServiceLocation {
            url: target.url.clone(),
            qido_prefix: target.qido_url_prefix.clone(),
            wado_prefix: target.wado_url_prefix.clone(),
            stow_prefix: target.stow_url_prefix.clone(),
        }
    }

    fn credentials(&self, target: &DicomWebTarget) -> AuthStrategy {
        AuthStrategy::from_user_supplied(
            target.http_user.as_deref(),
            target.http_password.as_deref(),
            target.access_token.as_deref(),
        )
    }
}

/// DICOM store in the Google Cloud Healthcare API, authenticated with
/// Application Default Credentials.
#[derive(Clone)]
pub struct CloudHealthcare {
    api_base: String,
    token_source: Arc<dyn TokenSource>,
}

impl CloudHealthcare {
    pub fn new(api_base: &str, token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token_source,
        }
    }

    pub fn store_url(&self, target: &GcpDicomWebTarget) -> String {
        format!(
            "{}/projects/{}/locations/{}/datasets/{}/dicomStores/{}/dicomWeb",
            self.api_base,
            target.project_id,
            target.location,
            target.dataset_id,
            target.dicom_store_id
        )
    }
}

impl DicomWebFlavor for CloudHealthcare {
    type Target = GcpDicomWebTarget;

    const KIND: TargetKind = TargetKind::GcpDicomweb;
    const DISPLAY_NAME: &'static str = "GCP DICOMweb";

    fn project(record: &TargetRecord) -> Option<&GcpDicomWebTarget> {
        match record {
            TargetRecord::GcpDicomweb(target) => Some(target),
            _ => None,
        }
    }

    fn from_form(form: &FormData) -> Result<TargetRecord, ValidationError> {
        GcpDicomWebTarget::from_form(form).map(TargetRecord::GcpDicomweb)
    }

    fn location(&self, target: &GcpDicomWebTarget) -> ServiceLocation {
        ServiceLocation::at(self.store_url(target))
    }

    fn credentials(&self, _target: &GcpDicomWebTarget) -> AuthStrategy {
        AuthStrategy::Ambient
    }

    fn token_source(&self) -> Option<Arc<dyn TokenSource>> {
        Some(self.token_source.clone())
    }
}

pub struct DicomWebHandler<F> {
    flavor: F,
    http: HttpConfig,
}

pub type GenericDicomWebHandler = DicomWebHandler<GenericDicomWeb>;
pub type GcpDicomWebHandler = DicomWebHandler<CloudHealthcare>;

impl<F: DicomWebFlavor> DicomWebHandler<F> {
    pub fn new(flavor: F, http: HttpConfig) -> Self {
        Self { flavor, http }
    }

    /// Resolve the record into a client. Deterministic, performs no network I/O.
    pub fn build_client(
        &self,
        target: &TargetRecord,
    ) -> Result<DicomWebClient, ConfigurationError> {
        let own = F::project(target).ok_or(ConfigurationError::WrongTargetType {
            expected: F::KIND,
            actual: target.kind(),
        })?;

        let auth = self.flavor.credentials(own);
        let config = ClientConfig::new(&self.flavor.location(own), auth)?;
        debug!(
            kind = %F::KIND,
            url = %config.base_url,
            auth = config.auth.name(),
            "Built DICOMweb client"
        );

        DicomWebClient::new(config, &self.http, self.flavor.token_source())
    }
}

#[async_trait]
impl<F: DicomWebFlavor> TargetHandler for DicomWebHandler<F> {
    fn info(&self) -> HandlerInfo {
        HandlerInfo {
            kind: F::KIND,
            display_name: F::DISPLAY_NAME,
            icon: F::ICON,
        }
    }

    fn from_form(
        &self,
        form: &FormData,
        _current: Option<&TargetRecord>,
    ) -> Result<TargetRecord, ValidationError> {
        F::from_form(form)
    }

    async fn send_to_target(
        &self,
        task_id: &str,
        target: &TargetRecord,
        dispatch: &DispatchContext,
        source_folder: &Path,
        _task: &Value,
    ) -> Result<DispatchOutcome, DispatchError> {
        let client = self.build_client(target)?;
        let instances = payload::load_instances(source_folder.to_path_buf()).await?;
        let submitted = instances.len();

        info!(
            task_id,
            target = %dispatch.target_name,
            count = submitted,
            "Sending instances via STOW-RS"
        );
        for instance in &instances {
            debug!(
                task_id,
                path = %instance.path.display(),
                sop_class_uid = %instance.sop_class_uid,
                sop_instance_uid = %instance.sop_instance_uid,
                "Queued instance"
            );
        }

        let response = client.store_instances(&instances).await?;
        let accepted = response.accepted();

        if accepted != submitted {
            warn!(
                task_id,
                target = %dispatch.target_name,
                submitted,
                accepted,
                failed = response.failed.len(),
                status = response.status,
                "Target did not store all instances"
            );
            return Err(DispatchError::Incomplete {
                submitted,
                accepted,
                response: response.raw,
            });
        }

        Ok(DispatchOutcome::success(submitted))
    }

    async fn test_connection(&self, target: &TargetRecord, target_name: &str) -> ProbeResult {
        let mut result = ProbeResult::new();

        let client = match self.build_client(target) {
            Ok(client) => client,
            Err(e) => {
                warn!(target = target_name, error = %e, "Cannot build client for probe");
                result.insert(AUTHENTICATION, false);
                result.insert(QIDO_QUERY, false);
                return result;
            }
        };

        let (base, search) = tokio::join!(client.get_base(), client.search_for_studies(1));

        // Only an explicit credential rejection counts against authentication.
        let authenticated = match base {
            Ok(()) => true,
            Err(e) => {
                debug!(target = target_name, error = %e, "Base URL probe failed");
                !e.is_authentication_failure()
            }
        };
        let queried = match search {
            Ok(studies) => {
                debug!(target = target_name, count = studies.len(), "QIDO probe succeeded");
                true
            }
            Err(e) => {
                debug!(target = target_name, error = %e, "QIDO probe failed");
                false
            }
        };

        result.insert(AUTHENTICATION, authenticated);
        result.insert(QIDO_QUERY, queried);
        result
    }
}
