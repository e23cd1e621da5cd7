//! Target handlers
//!
//! One handler per target type, looked up through an immutable registry.
//!
//! ## Key Components
//!
//! - [`TargetHandler`] - capability set implemented per target type
//! - [`DicomWebHandler`] - shared DICOMweb implementation, one per [`DicomWebFlavor`]
//! - [`DummyHandler`] - accepts everything, sends nothing
//! - [`HandlerRegistry`] - frozen map from [`TargetKind`](crate::targets::TargetKind) to handler
//!
//! ## Example
//!
//! ```rust,ignore
//! use dispatchbox::handlers::{DispatchContext, HandlerRegistry, HandlerSettings};
//!
//! let registry = HandlerRegistry::with_defaults(&HandlerSettings::default())?;
//! let handler = registry.for_target(&record)?;
//!
//! let probe = handler.test_connection(&record, "pacs").await;
//! let outcome = handler
//!     .send_to_target("task-1", &record, &DispatchContext::for_target("pacs"), folder, &task)
//!     .await?;
//! ```

pub mod dicomweb;
mod dummy;
mod registry;
mod traits;
pub(crate) mod types;

pub use dicomweb::{
    CloudHealthcare, DicomWebFlavor, DicomWebHandler, GcpDicomWebHandler, GenericDicomWeb,
    GenericDicomWebHandler,
};
pub use dummy::DummyHandler;
pub use registry::{
    DEFAULT_HEALTHCARE_API_BASE, HandlerRegistry, HandlerSettings, RegistryBuilder, RegistryError,
};
pub use traits::{DispatchError, TargetHandler};
pub use types::{DispatchContext, DispatchOutcome, HandlerInfo, ProbeResult};
