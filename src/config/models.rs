use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::dicomweb::{CLOUD_PLATFORM_SCOPE, HttpConfig};
use crate::handlers::DEFAULT_HEALTHCARE_API_BASE;
use crate::targets::TargetRecord;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub gcp: GcpSettings,
    /// Configured targets by name
    #[serde(default)]
    pub targets: BTreeMap<String, TargetRecord>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpSettings {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpSettings {
    pub fn to_http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_user_agent() -> String {
    HttpConfig::default().user_agent
}

/// Dispatch settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DispatchSettings {
    /// Upper bound on a whole send; unbounded when absent
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl DispatchSettings {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// Google Cloud Healthcare API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GcpSettings {
    #[serde(default = "default_healthcare_api_base")]
    pub healthcare_api_base: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl Default for GcpSettings {
    fn default() -> Self {
        Self {
            healthcare_api_base: default_healthcare_api_base(),
            scopes: default_scopes(),
        }
    }
}

fn default_healthcare_api_base() -> String {
    DEFAULT_HEALTHCARE_API_BASE.to_string()
}

fn default_scopes() -> Vec<String> {
    vec![CLOUD_PLATFORM_SCOPE.to_string()]
}
