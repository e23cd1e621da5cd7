use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "DISPATCHBOX_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/dispatchbox.toml";
const ENV_PREFIX: &str = "DISPATCHBOX";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_from_sources(config_path)
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    load_with_environment(config_path, environment())
}

/// Environment values stay strings; typed fields are coerced on deserialization.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR)
}

fn load_with_environment(config_path: PathBuf, env: Environment) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // DISPATCHBOX__TARGETS__PACS__HTTP_PASSWORD -> targets.pacs.http_password
    builder = builder.add_source(env);

    let mut config: Config = builder.build()?.try_deserialize()?;
    normalize_targets(&mut config);
    Ok(config)
}

/// Same blank-means-absent rule as form input.
fn normalize_targets(config: &mut Config) {
    config.targets = std::mem::take(&mut config.targets)
        .into_iter()
        .map(|(name, target)| (name, target.normalize()))
        .collect();
}
