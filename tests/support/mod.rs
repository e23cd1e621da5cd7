//! Shared fixtures: a mock DICOMweb server and a DICOM file writer.

#![allow(dead_code)]

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_dictionary_std::{tags, uids};
use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
use serde_json::json;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// How the mock store answers each kind of request.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub base_status: u16,
    pub qido_status: u16,
    pub stow_status: u16,
    /// Cap on the instances reported as stored; `None` acknowledges every part.
    pub accept_at_most: Option<usize>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            base_status: 200,
            qido_status: 200,
            stow_status: 200,
            accept_at_most: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    /// Number of `application/dicom` parts in a STOW body
    pub parts: usize,
}

struct MockState {
    behavior: Behavior,
    requests: Mutex<Vec<Recorded>>,
}

pub struct MockStore {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockStore {
    /// Start a mock store on a random local port. Every path is served: a GET
    /// ending in `/studies` is QIDO, a POST ending in `/studies` is STOW, any
    /// other GET is the base URL.
    pub async fn start(behavior: Behavior) -> Self {
        let state = Arc::new(MockState {
            behavior,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn stow_requests(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::POST)
            .collect()
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let get_header = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let parts = count_parts(&body);

    state.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_owned),
        authorization: get_header(header::AUTHORIZATION),
        content_type: get_header(header::CONTENT_TYPE),
        accept: get_header(header::ACCEPT),
        parts,
    });

    let behavior = &state.behavior;
    let is_studies = uri.path().trim_end_matches('/').ends_with("/studies");

    match (method, is_studies) {
        (Method::POST, true) => {
            let accepted = behavior.accept_at_most.map_or(parts, |cap| cap.min(parts));
            let referenced: Vec<_> = (0..accepted)
                .map(|i| json!({"00081155": {"vr": "UI", "Value": [format!("1.2.3.{i}")]}}))
                .collect();
            let body = json!({"00081199": {"vr": "SQ", "Value": referenced}});
            dicom_json(behavior.stow_status, body.to_string())
        }
        (Method::GET, true) => dicom_json(behavior.qido_status, "[]".to_string()),
        (Method::GET, false) => (status(behavior.base_status), "DICOMweb").into_response(),
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

fn dicom_json(code: u16, body: String) -> Response {
    (
        status(code),
        [(header::CONTENT_TYPE, "application/dicom+json")],
        body,
    )
        .into_response()
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

fn count_parts(body: &[u8]) -> usize {
    let marker = b"Content-Type: application/dicom\r\n";
    body.windows(marker.len()).filter(|w| *w == marker).count()
}

/// Write a minimal secondary capture instance to `path`.
pub fn write_instance(path: &Path, sop_instance_uid: &str) {
    let object = InMemDicomObject::from_element_iter([
        DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::SECONDARY_CAPTURE_IMAGE_STORAGE),
        ),
        DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(sop_instance_uid),
        ),
        DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("OT")),
    ]);
    let file = object
        .with_meta(
            FileMetaTableBuilder::new()
                .media_storage_sop_class_uid(uids::SECONDARY_CAPTURE_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(sop_instance_uid)
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN),
        )
        .unwrap();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    file.write_to_file(path).unwrap();
}

/// Populate `folder` with `count` instances, spread over a nested series folder.
pub fn write_study(folder: &Path, count: usize) {
    for i in 0..count {
        let path = if i % 2 == 0 {
            folder.join(format!("{i:03}.dcm"))
        } else {
            folder.join("series").join(format!("{i:03}.dcm"))
        };
        write_instance(&path, &format!("1.2.826.0.1.3680043.{}", i + 1));
    }
}
