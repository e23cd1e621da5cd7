use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::dicomweb::{CloudHealthcare, DicomWebHandler, GenericDicomWeb};
use super::dummy::DummyHandler;
use super::traits::TargetHandler;
use super::types::HandlerInfo;
use crate::dicomweb::{GcpTokenSource, HttpConfig, TokenSource};
use crate::targets::{TargetKind, TargetRecord};

pub const DEFAULT_HEALTHCARE_API_BASE: &str = "https://healthcare.googleapis.com/v1";

/// Settings shared by the built-in handlers
#[derive(Clone)]
pub struct HandlerSettings {
    pub http: HttpConfig,
    pub healthcare_api_base: String,
    pub token_source: Arc<dyn TokenSource>,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            healthcare_api_base: DEFAULT_HEALTHCARE_API_BASE.to_string(),
            token_source: Arc::new(GcpTokenSource::default()),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("handler already registered for target type '{0}'")]
    DuplicateHandler(TargetKind),

    #[error("no handler for target type '{0}'")]
    UnknownTargetType(String),
}

/// Mutable stage of the registry; only exists during startup.
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: BTreeMap<TargetKind, Arc<dyn TargetHandler>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        kind: TargetKind,
        handler: Arc<dyn TargetHandler>,
    ) -> Result<Self, RegistryError> {
        if self.handlers.contains_key(&kind) {
            return Err(RegistryError::DuplicateHandler(kind));
        }
        self.handlers.insert(kind, handler);
        Ok(self)
    }

    /// Freeze the table.
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: Arc::new(self.handlers),
        }
    }
}

/// Immutable mapping from target type to handler. Cheap to clone, lock-free to read.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: Arc<BTreeMap<TargetKind, Arc<dyn TargetHandler>>>,
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, kind: TargetKind) -> Result<Arc<dyn TargetHandler>, RegistryError> {
        self.handlers
            .get(&kind)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownTargetType(kind.name().to_string()))
    }

    pub fn get_by_name(&self, name: &str) -> Result<Arc<dyn TargetHandler>, RegistryError> {
        let kind = TargetKind::from_name(name)
            .ok_or_else(|| RegistryError::UnknownTargetType(name.to_string()))?;
        self.get(kind)
    }

    pub fn for_target(
        &self,
        target: &TargetRecord,
    ) -> Result<Arc<dyn TargetHandler>, RegistryError> {
        self.get(target.kind())
    }

    pub fn infos(&self) -> Vec<HandlerInfo> {
        self.handlers.values().map(|handler| handler.info()).collect()
    }

    /// Registry with every built-in handler
    pub fn with_defaults(settings: &HandlerSettings) -> Result<Self, RegistryError> {
        let generic = DicomWebHandler::new(GenericDicomWeb, settings.http.clone());
        let cloud = DicomWebHandler::new(
            CloudHealthcare::new(&settings.healthcare_api_base, settings.token_source.clone()),
            settings.http.clone(),
        );

        let registry = Self::builder()
            .register(TargetKind::Dicomweb, Arc::new(generic))?
            .register(TargetKind::GcpDicomweb, Arc::new(cloud))?
            .register(TargetKind::Dummy, Arc::new(DummyHandler))?
            .build();

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_registration_fails() {
        let result = HandlerRegistry::builder()
            .register(TargetKind::Dummy, Arc::new(DummyHandler))
            .and_then(|b| b.register(TargetKind::Dummy, Arc::new(DummyHandler)));

        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateHandler(TargetKind::Dummy))
        );
    }

    #[test]
    fn test_unknown_type_lookup_fails() {
        let registry = HandlerRegistry::builder()
            .register(TargetKind::Dummy, Arc::new(DummyHandler))
            .unwrap()
            .build();

        assert!(matches!(
            registry.get(TargetKind::Dicomweb),
            Err(RegistryError::UnknownTargetType(name)) if name == "dicomweb"
        ));
        assert!(matches!(
            registry.get_by_name("sftp"),
            Err(RegistryError::UnknownTargetType(name)) if name == "sftp"
        ));
    }

    #[test]
    fn test_lookup_returns_same_instance() {
        let registry = HandlerRegistry::with_defaults(&HandlerSettings::default()).unwrap();

        let first = registry.get(TargetKind::Dicomweb).unwrap();
        let second = registry.get(TargetKind::Dicomweb).unwrap();
        let by_name = registry.get_by_name("dicomweb").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &by_name));

        let cloned = registry.clone();
        assert!(Arc::ptr_eq(&first, &cloned.get(TargetKind::Dicomweb).unwrap()));
    }

    #[test]
    fn test_defaults_cover_every_kind() {
        let registry = HandlerRegistry::with_defaults(&HandlerSettings::default()).unwrap();
        for kind in TargetKind::ALL {
            assert_eq!(registry.get(kind).unwrap().info().kind, kind);
        }
        let names: Vec<_> = registry.infos().iter().map(|i| i.display_name).collect();
        assert_eq!(names, vec!["DICOMweb", "GCP DICOMweb", "Dummy"]);
    }
}
