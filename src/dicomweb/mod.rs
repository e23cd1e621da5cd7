//! DICOMweb client: QIDO-RS search, STOW-RS store, and the authentication
//! strategies a target can use.

pub mod auth;
mod client;
pub mod stow;

pub use auth::{AuthStrategy, CLOUD_PLATFORM_SCOPE, GcpTokenSource, TokenSource};
pub use client::{ClientConfig, DicomWebClient, HttpConfig, ServiceLocation};
pub use stow::StoreResponse;

use thiserror::Error;

use crate::targets::TargetKind;

/// The client could not be built from an otherwise valid record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("ambient credentials required but no token source is configured")]
    MissingTokenSource,

    #[error("handler for {expected} targets cannot serve a {actual} target")]
    WrongTargetType {
        expected: TargetKind,
        actual: TargetKind,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to obtain credentials: {0}")]
    Credentials(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RequestError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the remote rejected our credentials, or we had none to offer.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, RequestError::Credentials(_)) || self.status() == Some(401)
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RequestError::Timeout
        } else {
            RequestError::RequestFailed(e.to_string())
        }
    }
}
