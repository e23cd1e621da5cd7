//! HTTP client for a single DICOMweb service

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::auth::{AuthStrategy, TokenSource};
use super::stow::{self, StoreResponse};
use super::{ConfigurationError, RequestError};
use crate::payload::DicomInstance;

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: "DispatchBox/0.1.0".to_string(),
        }
    }
}

/// Where a DICOMweb service lives: a base URL plus optional per-service path prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLocation {
    pub url: String,
    pub qido_prefix: Option<String>,
    pub wado_prefix: Option<String>,
    pub stow_prefix: Option<String>,
}

impl ServiceLocation {
    pub fn at(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            qido_prefix: None,
            wado_prefix: None,
            stow_prefix: None,
        }
    }
}

/// Fully resolved client configuration. Two clients built from the same
/// record compare equal here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: Url,
    pub qido_url: Url,
    pub wado_url: Url,
    pub stow_url: Url,
    pub auth: AuthStrategy,
}

impl ClientConfig {
    pub fn new(location: &ServiceLocation, auth: AuthStrategy) -> Result<Self, ConfigurationError> {
        let base_url = parse_service_url(&location.url)?;
        Ok(Self {
            qido_url: service_url(&base_url, location.qido_prefix.as_deref())?,
            wado_url: service_url(&base_url, location.wado_prefix.as_deref())?,
            stow_url: service_url(&base_url, location.stow_prefix.as_deref())?,
            base_url,
            auth,
        })
    }
}

/// DICOMweb client bound to one target
pub struct DicomWebClient {
    http: Client,
    config: ClientConfig,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl DicomWebClient {
    /// Create a new client. Performs no network I/O.
    pub fn new(
        config: ClientConfig,
        http_config: &HttpConfig,
        token_source: Option<Arc<dyn TokenSource>>,
    ) -> Result<Self, ConfigurationError> {
        if config.auth == AuthStrategy::Ambient && token_source.is_none() {
            return Err(ConfigurationError::MissingTokenSource);
        }

        let http = Client::builder()
            .connect_timeout(http_config.connect_timeout)
            .timeout(http_config.request_timeout)
            .user_agent(&http_config.user_agent)
            .build()
            .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            config,
            token_source,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Plain GET against the service base URL.
    pub async fn get_base(&self) -> Result<(), RequestError> {
        let url = self.config.base_url.clone();
        debug!(%url, "GET base URL");

        let request = self.authorize(self.http.get(url)).await?;
        let response = request.send().await?;
        check_status(response).await?;
        Ok(())
    }

    /// QIDO-RS study search bounded to `limit` results.
    pub async fn search_for_studies(&self, limit: u32) -> Result<Vec<Value>, RequestError> {
        let mut url = studies_endpoint(&self.config.qido_url);
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        debug!(%url, "QIDO search for studies");

        let request = self
            .authorize(self.http.get(url).header(ACCEPT, stow::DICOM_JSON))
            .await?;
        let response = check_status(request.send().await?).await?;

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&body)
            .map_err(|e| RequestError::InvalidResponse(format!("malformed QIDO response: {}", e)))
    }

    /// STOW-RS: store all instances in a single request.
    pub async fn store_instances(
        &self,
        instances: &[DicomInstance],
    ) -> Result<StoreResponse, RequestError> {
        let url = studies_endpoint(&self.config.stow_url);
        let boundary = Uuid::new_v4().simple().to_string();
        let body = stow::multipart_body(instances, &boundary);
        debug!(%url, count = instances.len(), size = body.len(), "STOW store instances");

        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, stow::content_type(&boundary))
            .header(ACCEPT, stow::DICOM_JSON)
            .body(body);
        let response = self.authorize(request).await?.send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;

        // 409 means none of the instances were stored; the body still lists them.
        if !status.is_success() && status != StatusCode::CONFLICT {
            warn!(status = status.as_u16(), "STOW request rejected");
            return Err(RequestError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        StoreResponse::parse(status.as_u16(), content_type.as_deref(), &body)
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, RequestError> {
        let request = match &self.config.auth {
            AuthStrategy::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            AuthStrategy::Bearer(token) => request.bearer_auth(token),
            AuthStrategy::Ambient => {
                let source = self.token_source.as_ref().ok_or_else(|| {
                    RequestError::Credentials("no ambient token source".to_string())
                })?;
                request.bearer_auth(source.token().await?)
            }
            AuthStrategy::Anonymous => request,
        };
        Ok(request)
    }
}

async fn check_status(response: Response) -> Result<Response, RequestError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RequestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

fn parse_service_url(url: &str) -> Result<Url, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.cannot_be_a_base() {
        return Err(invalid("not a base URL".to_string()));
    }
    Ok(parsed)
}

fn service_url(base: &Url, prefix: Option<&str>) -> Result<Url, ConfigurationError> {
    match prefix.map(|p| p.trim().trim_matches('/')).filter(|p| !p.is_empty()) {
        None => Ok(base.clone()),
        Some(prefix) => {
            let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), prefix);
            parse_service_url(&joined)
        }
    }
}

fn studies_endpoint(service: &Url) -> Url {
    let mut url = service.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("studies");
    }
    url
}
