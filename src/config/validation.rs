use super::models::Config;
use crate::targets::{self, TargetRecord};
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Target '{name}' is invalid: {source}")]
    InvalidTarget {
        name: String,
        #[source]
        source: targets::ValidationError,
    },

    #[error("Target '{name}' has invalid URL '{url}', expected http:// or https://")]
    InvalidTargetUrl { name: String, url: String },

    #[error("Timeout must be positive: {field} = {value}")]
    InvalidTimeout { field: String, value: u64 },

    #[error("Invalid healthcare API base '{url}', expected http:// or https://")]
    InvalidApiBase { url: String },

    #[error("At least one GCP scope is required")]
    NoScopes,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_targets(config)?;
    validate_timeouts(config)?;
    validate_gcp(config)?;
    Ok(())
}

/// Every target must pass the same checks its constructor applies
fn validate_targets(config: &Config) -> Result<(), ValidationError> {
    for (name, target) in &config.targets {
        target
            .validate()
            .map_err(|source| ValidationError::InvalidTarget {
                name: name.clone(),
                source,
            })?;

        if let TargetRecord::Dicomweb(dicomweb) = target {
            if !is_http_url(&dicomweb.url) {
                return Err(ValidationError::InvalidTargetUrl {
                    name: name.clone(),
                    url: dicomweb.url.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_timeouts(config: &Config) -> Result<(), ValidationError> {
    let timeouts = [
        ("http.connect_timeout_secs", Some(config.http.connect_timeout_secs)),
        ("http.request_timeout_secs", Some(config.http.request_timeout_secs)),
        ("dispatch.deadline_secs", config.dispatch.deadline_secs),
    ];

    for (field, value) in timeouts {
        if value == Some(0) {
            return Err(ValidationError::InvalidTimeout {
                field: field.to_string(),
                value: 0,
            });
        }
    }
    Ok(())
}

fn validate_gcp(config: &Config) -> Result<(), ValidationError> {
    if !is_http_url(&config.gcp.healthcare_api_base) {
        return Err(ValidationError::InvalidApiBase {
            url: config.gcp.healthcare_api_base.clone(),
        });
    }
    if config.gcp.scopes.iter().all(|scope| scope.trim().is_empty()) {
        return Err(ValidationError::NoScopes);
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    Url::parse(url.trim())
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}
