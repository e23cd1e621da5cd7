//! Payload discovery: the DICOM instances contained in a source folder.
//!
//! Every `*.dcm` file below the folder (any depth) is read and decoded with
//! `dicom-object`. Decoding is all-or-nothing: the first file that cannot be
//! read or parsed aborts the whole collection.

use bytes::Bytes;
use dicom_dictionary_std::tags;
use dicom_object::OpenFileOptions;
use dicom_object::file::ReadPreamble;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

pub const PAYLOAD_EXTENSION: &str = "dcm";

#[derive(Debug, Error)]
pub enum PayloadParseError {
    #[error("failed to enumerate {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: Box<dicom_object::ReadError>,
    },

    #[error("payload collection interrupted: {0}")]
    Interrupted(String),
}

/// One decoded DICOM file, kept with its original bytes for transmission.
#[derive(Clone)]
pub struct DicomInstance {
    pub path: PathBuf,
    pub sop_class_uid: String,
    pub sop_instance_uid: String,
    pub data: Bytes,
}

impl fmt::Debug for DicomInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DicomInstance")
            .field("path", &self.path)
            .field("sop_class_uid", &self.sop_class_uid)
            .field("sop_instance_uid", &self.sop_instance_uid)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Collect every payload file under `folder` on the blocking pool.
pub async fn load_instances(folder: PathBuf) -> Result<Vec<DicomInstance>, PayloadParseError> {
    tokio::task::spawn_blocking(move || collect_instances(&folder))
        .await
        .map_err(|e| PayloadParseError::Interrupted(e.to_string()))?
}

/// Enumerate and decode all payload files under `folder`, sorted by path.
pub fn collect_instances(folder: &Path) -> Result<Vec<DicomInstance>, PayloadParseError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(folder).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| PayloadParseError::Walk {
            root: folder.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_payload(entry.path()) {
            paths.push(entry.into_path());
        }
    }

    debug!(folder = %folder.display(), count = paths.len(), "Found payload files");

    paths.iter().map(|path| read_instance(path)).collect()
}

/// Read and decode a single DICOM file.
pub fn read_instance(path: &Path) -> Result<DicomInstance, PayloadParseError> {
    let object = OpenFileOptions::new()
        .read_preamble(ReadPreamble::Auto)
        .open_file(path)
        .map_err(|source| PayloadParseError::Decode {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;

    let data = std::fs::read(path).map_err(|source| PayloadParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // Prefer the data set attributes, fall back to the file meta group.
    let sop_class_uid = object
        .element(tags::SOP_CLASS_UID)
        .ok()
        .and_then(|e| e.to_str().ok())
        .map(|uid| trim_uid(&uid))
        .unwrap_or_else(|| trim_uid(&object.meta().media_storage_sop_class_uid));
    let sop_instance_uid = object
        .element(tags::SOP_INSTANCE_UID)
        .ok()
        .and_then(|e| e.to_str().ok())
        .map(|uid| trim_uid(&uid))
        .unwrap_or_else(|| trim_uid(&object.meta().media_storage_sop_instance_uid));

    Ok(DicomInstance {
        path: path.to_path_buf(),
        sop_class_uid,
        sop_instance_uid,
        data: Bytes::from(data),
    })
}

fn is_payload(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext == PAYLOAD_EXTENSION)
}

fn trim_uid(uid: &str) -> String {
    uid.trim_end_matches('\0').trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use dicom_core::{DataElement, PrimitiveValue, VR};
    use dicom_dictionary_std::uids;
    use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
    use std::fs;
    use tempfile::TempDir;

    /// Write a minimal secondary capture instance to `path`.
    pub(crate) fn write_instance(path: &Path, sop_instance_uid: &str) {
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
            DataElement::new(tags::PATIENT_NAME, VR::PN, PrimitiveValue::from("Doe^Jane")),
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
            fs::create_dir_all(parent).unwrap();
        }
        file.write_to_file(path).unwrap();
    }

    #[test]
    fn test_collect_recurses_and_filters_extension() {
        let dir = TempDir::new().unwrap();
        write_instance(&dir.path().join("a.dcm"), "1.2.826.0.1.1");
        write_instance(&dir.path().join("series/b.dcm"), "1.2.826.0.1.2");
        write_instance(&dir.path().join("series/deep/er/c.dcm"), "1.2.826.0.1.3");
        fs::write(dir.path().join("task.json"), "{}").unwrap();
        fs::write(dir.path().join("series/.sending"), "").unwrap();

        let instances = collect_instances(dir.path()).unwrap();
        assert_eq!(instances.len(), 3);

        let uids: Vec<_> = instances.iter().map(|i| i.sop_instance_uid.as_str()).collect();
        assert!(uids.contains(&"1.2.826.0.1.1"));
        assert!(uids.contains(&"1.2.826.0.1.3"));
        assert!(instances.iter().all(|i| !i.data.is_empty()));
        assert_eq!(instances[0].sop_class_uid, uids::SECONDARY_CAPTURE_IMAGE_STORAGE);
    }

    #[test]
    fn test_collect_empty_folder() {
        let dir = TempDir::new().unwrap();
        assert!(collect_instances(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_collect_aborts_on_corrupt_file() {
        let dir = TempDir::new().unwrap();
        write_instance(&dir.path().join("good.dcm"), "1.2.826.0.1.1");
        fs::write(dir.path().join("bad.dcm"), b"not a dicom file").unwrap();

        let result = collect_instances(dir.path());
        match result {
            Err(PayloadParseError::Decode { path, .. }) => {
                assert!(path.ends_with("bad.dcm"));
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_collect_missing_folder() {
        let dir = TempDir::new().unwrap();
        let result = collect_instances(&dir.path().join("gone"));
        assert!(matches!(result, Err(PayloadParseError::Walk { .. })));
    }

    #[tokio::test]
    async fn test_load_instances_off_thread() {
        let dir = TempDir::new().unwrap();
        write_instance(&dir.path().join("x.dcm"), "1.2.826.0.1.9");

        let instances = load_instances(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].sop_instance_uid, "1.2.826.0.1.9");
    }
}
