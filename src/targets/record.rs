use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;
use super::form::{self, FormData};

const REDACTED: &str = "********";

/// Discriminant of [`TargetRecord`]; the key of the handler registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Dicomweb,
    GcpDicomweb,
    Dummy,
}

impl TargetKind {
    pub const ALL: [TargetKind; 3] = [
        TargetKind::Dicomweb,
        TargetKind::GcpDicomweb,
        TargetKind::Dummy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TargetKind::Dicomweb => "dicomweb",
            TargetKind::GcpDicomweb => "gcp_dicomweb",
            TargetKind::Dummy => "dummy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configured destination. The tag field is `target_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target_type", rename_all = "snake_case")]
pub enum TargetRecord {
    Dicomweb(DicomWebTarget),
    GcpDicomweb(GcpDicomWebTarget),
    Dummy(DummyTarget),
}

impl TargetRecord {
    pub fn kind(&self) -> TargetKind {
        match self {
            TargetRecord::Dicomweb(_) => TargetKind::Dicomweb,
            TargetRecord::GcpDicomweb(_) => TargetKind::GcpDicomweb,
            TargetRecord::Dummy(_) => TargetKind::Dummy,
        }
    }

    /// Run the constructor checks on a record that did not come through a constructor
    /// (e.g. deserialized from the configuration file).
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            TargetRecord::Dicomweb(target) => target.validate(),
            TargetRecord::GcpDicomweb(target) => target.validate(),
            TargetRecord::Dummy(_) => Ok(()),
        }
    }

    /// Coerce blank optional fields to absent.
    pub fn normalize(self) -> Self {
        match self {
            TargetRecord::Dicomweb(target) => TargetRecord::Dicomweb(target.normalize()),
            other => other,
        }
    }

    /// Copy with secrets masked, safe to log or return from the API.
    pub fn redacted(&self) -> Self {
        match self {
            TargetRecord::Dicomweb(target) => TargetRecord::Dicomweb(target.redacted()),
            other => other.clone(),
        }
    }
}

/// Generic DICOMweb endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicomWebTarget {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qido_url_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wado_url_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stow_url_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl DicomWebTarget {
    pub const OPTIONAL_FIELDS: [&'static str; 6] = [
        "qido_url_prefix",
        "wado_url_prefix",
        "stow_url_prefix",
        "http_user",
        "http_password",
        "access_token",
    ];

    pub fn new(url: impl Into<String>) -> Result<Self, ValidationError> {
        let target = Self {
            url: url.into(),
            qido_url_prefix: None,
            wado_url_prefix: None,
            stow_url_prefix: None,
            http_user: None,
            http_password: None,
            access_token: None,
        };
        target.validate()?;
        Ok(target)
    }

    pub fn from_form(form: &FormData) -> Result<Self, ValidationError> {
        let target = Self {
            url: form::required(form, "url")?,
            qido_url_prefix: form::optional(form, "qido_url_prefix"),
            wado_url_prefix: form::optional(form, "wado_url_prefix"),
            stow_url_prefix: form::optional(form, "stow_url_prefix"),
            http_user: form::optional(form, "http_user"),
            http_password: form::optional(form, "http_password"),
            access_token: form::optional(form, "access_token"),
        };
        target.validate()?;
        Ok(target)
    }

    pub fn with_prefixes(
        mut self,
        qido: Option<&str>,
        wado: Option<&str>,
        stow: Option<&str>,
    ) -> Self {
        self.qido_url_prefix = qido.map(str::to_owned);
        self.wado_url_prefix = wado.map(str::to_owned);
        self.stow_url_prefix = stow.map(str::to_owned);
        self
    }

    pub fn with_basic_auth(mut self, user: &str, password: &str) -> Self {
        self.http_user = Some(user.to_owned());
        self.http_password = Some(password.to_owned());
        self
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(token.to_owned());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        non_blank("url", &self.url)
    }

    fn normalize(self) -> Self {
        let blank_to_none = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            url: self.url,
            qido_url_prefix: blank_to_none(self.qido_url_prefix),
            wado_url_prefix: blank_to_none(self.wado_url_prefix),
            stow_url_prefix: blank_to_none(self.stow_url_prefix),
            http_user: blank_to_none(self.http_user),
            http_password: blank_to_none(self.http_password),
            access_token: blank_to_none(self.access_token),
        }
    }

    fn redacted(&self) -> Self {
        let mask = |value: &Option<String>| value.as_ref().map(|_| REDACTED.to_string());
        Self {
            http_password: mask(&self.http_password),
            access_token: mask(&self.access_token),
            ..self.clone()
        }
    }
}

impl fmt::Debug for DicomWebTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = |value: &Option<String>| value.as_ref().map(|_| REDACTED);
        f.debug_struct("DicomWebTarget")
            .field("url", &self.url)
            .field("qido_url_prefix", &self.qido_url_prefix)
            .field("wado_url_prefix", &self.wado_url_prefix)
            .field("stow_url_prefix", &self.stow_url_prefix)
            .field("http_user", &self.http_user)
            .field("http_password", &secret(&self.http_password))
            .field("access_token", &secret(&self.access_token))
            .finish()
    }
}

/// DICOM store managed by the Google Cloud Healthcare API.
///
/// Carries resource coordinates only; credentials come from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcpDicomWebTarget {
    pub project_id: String,
    pub location: String,
    pub dataset_id: String,
    pub dicom_store_id: String,
}

impl GcpDicomWebTarget {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        dataset_id: impl Into<String>,
        dicom_store_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let target = Self {
            project_id: project_id.into(),
            location: location.into(),
            dataset_id: dataset_id.into(),
            dicom_store_id: dicom_store_id.into(),
        };
        target.validate()?;
        Ok(target)
    }

    pub fn from_form(form: &FormData) -> Result<Self, ValidationError> {
        Self::new(
            form::required(form, "project_id")?,
            form::required(form, "location")?,
            form::required(form, "dataset_id")?,
            form::required(form, "dicom_store_id")?,
        )
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        path_segment("project_id", &self.project_id)?;
        path_segment("location", &self.location)?;
        path_segment("dataset_id", &self.dataset_id)?;
        path_segment("dicom_store_id", &self.dicom_store_id)
    }
}

/// Accepts everything, transmits nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DummyTarget {}

fn non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

/// Each coordinate becomes exactly one segment of the store URL.
fn path_segment(field: &'static str, value: &str) -> Result<(), ValidationError> {
    non_blank(field, value)?;
    let is_dot_segment = matches!(value, "." | "..");
    if is_dot_segment || value.contains(['/', '\\', '?', '#', '%']) {
        return Err(ValidationError::InvalidPathSegment(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_dicomweb_from_form_blank_optionals_become_absent() {
        let mut pairs = vec![("url", "https://pacs.example.org/dicom-web")];
        for field in DicomWebTarget::OPTIONAL_FIELDS {
            pairs.push((field, ""));
        }

        let target = DicomWebTarget::from_form(&form(&pairs)).unwrap();
        assert_eq!(target.url, "https://pacs.example.org/dicom-web");
        assert!(target.qido_url_prefix.is_none());
        assert!(target.wado_url_prefix.is_none());
        assert!(target.stow_url_prefix.is_none());
        assert!(target.http_user.is_none());
        assert!(target.http_password.is_none());
        assert!(target.access_token.is_none());
    }

    #[test]
    fn test_dicomweb_from_form_keeps_values() {
        let target = DicomWebTarget::from_form(&form(&[
            ("name", "pacs"),
            ("url", "https://pacs.example.org"),
            ("qido_url_prefix", "qido"),
            ("stow_url_prefix", "stow"),
            ("http_user", "alice"),
            ("http_password", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(target.qido_url_prefix.as_deref(), Some("qido"));
        assert_eq!(target.stow_url_prefix.as_deref(), Some("stow"));
        assert_eq!(target.http_user.as_deref(), Some("alice"));
        assert_eq!(target.http_password.as_deref(), Some("s3cret"));
        assert!(target.wado_url_prefix.is_none());
    }

    #[test]
    fn test_dicomweb_requires_url() {
        let missing = DicomWebTarget::from_form(&form(&[("http_user", "alice")]));
        assert_eq!(missing.unwrap_err(), ValidationError::MissingField("url"));

        let blank = DicomWebTarget::from_form(&form(&[("url", "  ")]));
        assert_eq!(blank.unwrap_err(), ValidationError::BlankField("url"));
    }

    #[test]
    fn test_gcp_from_form_requires_all_coordinates() {
        let ok = GcpDicomWebTarget::from_form(&form(&[
            ("project_id", "proj"),
            ("location", "europe-west4"),
            ("dataset_id", "ds"),
            ("dicom_store_id", "store"),
        ]))
        .unwrap();
        assert_eq!(ok.location, "europe-west4");

        let missing = GcpDicomWebTarget::from_form(&form(&[
            ("project_id", "proj"),
            ("location", "europe-west4"),
            ("dataset_id", "ds"),
        ]));
        assert_eq!(missing.unwrap_err(), ValidationError::MissingField("dicom_store_id"));

        let blank = GcpDicomWebTarget::from_form(&form(&[
            ("project_id", ""),
            ("location", "europe-west4"),
            ("dataset_id", "ds"),
            ("dicom_store_id", "store"),
        ]));
        assert_eq!(blank.unwrap_err(), ValidationError::BlankField("project_id"));
    }

    #[test]
    fn test_gcp_coordinates_must_be_single_segments() {
        let escape = GcpDicomWebTarget::new("proj", "eu", "../../other", "store");
        assert_eq!(escape.unwrap_err(), ValidationError::InvalidPathSegment("dataset_id"));

        let dots = GcpDicomWebTarget::new("proj", "..", "ds", "store");
        assert_eq!(dots.unwrap_err(), ValidationError::InvalidPathSegment("location"));

        let query = GcpDicomWebTarget::new("proj", "eu", "ds", "store?x=1");
        assert_eq!(query.unwrap_err(), ValidationError::InvalidPathSegment("dicom_store_id"));

        let dotted = GcpDicomWebTarget::new("my-proj", "us-central1", "ds.v2", "store_1").unwrap();
        assert_eq!(dotted.dataset_id, "ds.v2");
    }

    #[test]
    fn test_record_serde_tag() {
        let record = TargetRecord::Dicomweb(DicomWebTarget::new("http://localhost:8042").unwrap());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["target_type"], "dicomweb");
        assert_eq!(json["url"], "http://localhost:8042");
        assert!(json.get("http_user").is_none());

        let parsed: TargetRecord = serde_json::from_value(serde_json::json!({
            "target_type": "gcp_dicomweb",
            "project_id": "p",
            "location": "l",
            "dataset_id": "d",
            "dicom_store_id": "s"
        }))
        .unwrap();
        assert_eq!(parsed.kind(), TargetKind::GcpDicomweb);

        let dummy: TargetRecord = serde_json::from_str(r#"{"target_type":"dummy"}"#).unwrap();
        assert_eq!(dummy.kind(), TargetKind::Dummy);
    }

    #[test]
    fn test_normalize_config_record() {
        let record: TargetRecord = serde_json::from_str(
            r#"{"target_type":"dicomweb","url":"http://pacs","http_user":"","access_token":" "}"#,
        )
        .unwrap();
        let TargetRecord::Dicomweb(target) = record.normalize() else {
            panic!("expected dicomweb record");
        };
        assert!(target.http_user.is_none());
        assert!(target.access_token.is_none());
    }

    #[test]
    fn test_secrets_are_redacted() {
        let target = DicomWebTarget::new("http://pacs")
            .unwrap()
            .with_basic_auth("alice", "s3cret")
            .with_access_token("tok");

        let debug = format!("{:?}", target);
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("\"tok\""));
        assert!(debug.contains("alice"));

        let TargetRecord::Dicomweb(redacted) = TargetRecord::Dicomweb(target).redacted() else {
            panic!("expected dicomweb record");
        };
        assert_eq!(redacted.http_password.as_deref(), Some(REDACTED));
        assert_eq!(redacted.access_token.as_deref(), Some(REDACTED));
        assert_eq!(redacted.http_user.as_deref(), Some("alice"));
    }

    #[test]
    fn test_kind_names() {
        for kind in TargetKind::ALL {
            assert_eq!(TargetKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(TargetKind::from_name("sftp"), None);
    }
}
