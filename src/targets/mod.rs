//! Target records: the destinations a dispatch can be sent to.
//!
//! A [`TargetRecord`] is built either from a form submission (through the
//! handler's `from_form`, see [`form`]) or from the configuration file, and is
//! read-only input to every dispatch and probe afterwards.

pub mod form;
mod record;

pub use form::FormData;
pub use record::{DicomWebTarget, DummyTarget, GcpDicomWebTarget, TargetKind, TargetRecord};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' must not be blank")]
    BlankField(&'static str),

    #[error("field '{0}' must be a single URL path segment")]
    InvalidPathSegment(&'static str),
}
