//! STOW-RS request encoding and response decoding.

use bytes::{Bytes, BytesMut};
use serde_json::Value;

use super::RequestError;
use crate::payload::DicomInstance;

pub const DICOM: &str = "application/dicom";
pub const DICOM_JSON: &str = "application/dicom+json";

/// (0008,1199) Referenced SOP Sequence: instances the store accepted.
pub const REFERENCED_SOP_SEQUENCE: &str = "00081199";
/// (0008,1198) Failed SOP Sequence.
pub const FAILED_SOP_SEQUENCE: &str = "00081198";

pub fn content_type(boundary: &str) -> String {
    format!("multipart/related; type=\"{DICOM}\"; boundary={boundary}")
}

/// Encode instances as one `multipart/related` body, one part per file.
pub fn multipart_body(instances: &[DicomInstance], boundary: &str) -> Bytes {
    let payload: usize = instances.iter().map(|i| i.data.len()).sum();
    let mut body = BytesMut::with_capacity(payload + (instances.len() + 1) * 96);

    for instance in instances {
        body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {DICOM}\r\n\r\n").as_bytes());
        body.extend_from_slice(&instance.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    body.freeze()
}

/// Decoded STOW-RS response.
#[derive(Debug, Clone)]
pub struct StoreResponse {
    pub status: u16,
    pub referenced: Vec<Value>,
    pub failed: Vec<Value>,
    /// Response body as received, for diagnostics.
    pub raw: String,
}

impl StoreResponse {
    /// Number of instances the store acknowledged.
    pub fn accepted(&self) -> usize {
        self.referenced.len()
    }

    pub fn parse(
        status: u16,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<Self, RequestError> {
        let raw = String::from_utf8_lossy(body).into_owned();

        if raw.trim().is_empty() {
            return Ok(Self {
                status,
                referenced: Vec::new(),
                failed: Vec::new(),
                raw,
            });
        }

        if let Some(content_type) = content_type {
            if !is_json(content_type) {
                return Err(RequestError::InvalidResponse(format!(
                    "unsupported STOW response content type: {}",
                    content_type
                )));
            }
        }

        let document: Value = serde_json::from_slice(body)
            .map_err(|e| RequestError::InvalidResponse(format!("malformed STOW response: {}", e)))?;

        // Some stores wrap the single response data set in an array.
        let dataset = match &document {
            Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        };

        Ok(Self {
            status,
            referenced: sequence_items(&dataset, REFERENCED_SOP_SEQUENCE),
            failed: sequence_items(&dataset, FAILED_SOP_SEQUENCE),
            raw,
        })
    }
}

fn sequence_items(dataset: &Value, tag: &str) -> Vec<Value> {
    dataset
        .get(tag)
        .and_then(|attribute| attribute.get("Value"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// `application/json` and `+json` structured syntaxes such as `application/dicom+json`.
fn is_json(content_type: &str) -> bool {
    match content_type.parse::<mime::Mime>() {
        Ok(media_type) => {
            media_type.subtype() == mime::JSON
                || media_type.suffix().is_some_and(|suffix| suffix == mime::JSON)
        }
        Err(_) => false,
    }
}
