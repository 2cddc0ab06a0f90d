//! Service configuration loader.
//!
//! Reads `chatsearch.toml` into [`ServiceConfig`], then layers environment
//! variables on top. An explicitly requested file must exist and parse; the
//! implicit default file falls back to defaults when missing or malformed.

use std::path::Path;
use std::str::FromStr;

use chatsearch_types::config::{ServiceConfig, StorageBackend};
use chatsearch_types::error::ConfigError;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "chatsearch.toml";

/// Load configuration from `path` (or [`DEFAULT_CONFIG_FILE`]) and apply
/// environment overrides from the process environment.
pub async fn load_service_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path).await?,
        None => load_default_file(Path::new(DEFAULT_CONFIG_FILE)).await,
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

async fn read_config_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

    toml::from_str::<ServiceConfig>(&content).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

async fn load_default_file(path: &Path) -> ServiceConfig {
    match read_config_file(path).await {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", path.display());
            config
        }
        Err(ConfigError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {} found, using defaults", path.display());
            ServiceConfig::default()
        }
        Err(err) => {
            tracing::warn!("{err}, using defaults");
            ServiceConfig::default()
        }
    }
}

/// Overlay environment variables onto `config`.
///
/// `lookup` resolves a variable name to its value; the binary passes
/// `std::env::var`. Unparseable values are logged and ignored.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("APP_HOST") {
        config.server.host = host;
    }
    set_parsed(&lookup, "APP_PORT", &mut config.server.port);

    if let Some(level) = lookup("LOG_LEVEL") {
        config.logging.level = level.to_lowercase();
    }
    if let Some(debug) = lookup("DEBUG").as_deref().and_then(parse_bool) {
        if debug {
            config.logging.level = "debug".to_string();
        }
    }

    if let Some(model) = lookup("LLM_MODEL_NAME") {
        config.llm.model = model;
    }
    if let Some(provider) = lookup("LLM_MODEL_PROVIDER") {
        config.llm.provider = provider.to_lowercase();
    }
    if let Some(base_url) = lookup("LLM_BASE_URL") {
        config.llm.base_url = Some(base_url);
    }
    if let Some(api_key) = lookup("LLM_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
        config.llm.api_key = Some(api_key);
    }
    set_parsed(&lookup, "LLM_TEMPERATURE", &mut config.llm.temperature);
    set_parsed(&lookup, "LLM_MAX_TOKENS", &mut config.llm.max_tokens);

    set_parsed::<StorageBackend, _>(&lookup, "CHATSEARCH_STORAGE", &mut config.storage.backend);
    if let Some(url) = lookup("CHATSEARCH_DATABASE_URL") {
        config.storage.database_url = url;
    }

    match lookup("CHATSEARCH_SERIALIZE_TURNS").map(|v| (parse_bool(&v), v)) {
        Some((Some(flag), _)) => config.serialize_turns = flag,
        Some((None, raw)) => tracing::warn!("Ignoring CHATSEARCH_SERIALIZE_TURNS={raw}: not a boolean"),
        None => {}
    }
    match lookup("CHATSEARCH_OTEL").map(|v| (parse_bool(&v), v)) {
        Some((Some(flag), _)) => config.logging.otel = flag,
        Some((None, raw)) => tracing::warn!("Ignoring CHATSEARCH_OTEL={raw}: not a boolean"),
        None => {}
    }
}

fn set_parsed<T, F>(lookup: &F, key: &str, slot: &mut T)
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => tracing::warn!("Ignoring {key}={raw}: invalid value"),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
