use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
    #[serde(default)]
    pub pipeline: Option<PipelineSection>,
    #[serde(default)]
    pub renderer: Option<RendererSection>,
    #[serde(default)]
    pub retention: Option<RetentionSection>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PipelineSection {
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    #[serde(default)]
    pub wait_timeout_secs: Option<u64>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RendererSection {
    #[serde(default)]
    pub browser_path: Option<String>,
    #[serde(default)]
    pub extra_args: Option<Vec<String>>,
    #[serde(default)]
    pub render_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RetentionSection {
    #[serde(default)]
    pub status_ttl_minutes: Option<u64>,
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a RawConfigFile from a path. The format is inferred from the extension: .toml, .json
pub fn load_raw_from_file<P: AsRef<Path>>(path: P) -> Result<RawConfigFile, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    parse_config_str(&s, ext.as_deref())
}

/// Parse configuration from a string with optional format hint
#[inline]
fn parse_config_str(s: &str, ext: Option<&str>) -> Result<RawConfigFile, ConfigError> {
    match ext {
        #[cfg(feature = "toml")]
        Some("toml") => toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        #[cfg(feature = "json")]
        Some("json") => serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => parse_config_auto(s),
    }
}

/// Try to parse config by attempting each enabled format
#[inline]
fn parse_config_auto(s: &str) -> Result<RawConfigFile, ConfigError> {
    #[cfg(feature = "toml")]
    if let Ok(cfg) = toml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "json")]
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(any(feature = "toml", feature = "json"))]
    {
        Err(ConfigError::Parse(
            "failed to parse config as any supported format".into(),
        ))
    }

    #[cfg(not(any(feature = "toml", feature = "json")))]
    {
        let _ = s; // suppress unused warning
        Err(ConfigError::Parse("no config format enabled".into()))
    }
}

/// Concrete application configuration with defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub pipeline: PipelineConfig,
    pub renderer: RendererConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub wait_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RendererConfig {
    pub browser_path: String,
    pub extra_args: Vec<String>,
    pub render_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetentionConfig {
    /// 0 keeps statuses forever.
    pub status_ttl_minutes: u64,
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 7080,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
            pipeline: PipelineConfig {
                workers: 1,
                queue_capacity: 64,
                wait_timeout_secs: 90,
                poll_interval_ms: 1000,
            },
            renderer: RendererConfig {
                browser_path: "chromium".to_string(),
                extra_args: Vec::new(),
                render_timeout_secs: 60,
            },
            retention: RetentionConfig {
                status_ttl_minutes: 0,
                sweep_interval_secs: 300,
            },
        }
    }
}

#[inline]
fn parse_bool(s: &str) -> Result<bool, ()> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(()),
    }
}

#[inline]
fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .filter_map(|p| {
            let trimmed = p.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Helper macro to apply optional value if present
macro_rules! apply_opt {
    ($target:expr, $source:expr) => {
        if let Some(v) = $source {
            $target = v;
        }
    };
}

/// Load concrete `Config` from optional file and environment variables.
/// Environment variables take precedence over file values and defaults.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    // Start with file values if provided
    if let Some(p) = path {
        let raw = load_raw_from_file(p)?;
        if let Some(server) = raw.server {
            apply_opt!(cfg.server.host, server.host);
            apply_opt!(cfg.server.port, server.port);
        }
        if let Some(logging) = raw.logging {
            apply_opt!(cfg.logging.level, logging.level);
            apply_opt!(cfg.logging.json, logging.json);
        }
        if let Some(pipeline) = raw.pipeline {
            apply_opt!(cfg.pipeline.workers, pipeline.workers);
            apply_opt!(cfg.pipeline.queue_capacity, pipeline.queue_capacity);
            apply_opt!(cfg.pipeline.wait_timeout_secs, pipeline.wait_timeout_secs);
            apply_opt!(cfg.pipeline.poll_interval_ms, pipeline.poll_interval_ms);
        }
        if let Some(renderer) = raw.renderer {
            apply_opt!(cfg.renderer.browser_path, renderer.browser_path);
            apply_opt!(cfg.renderer.extra_args, renderer.extra_args);
            apply_opt!(cfg.renderer.render_timeout_secs, renderer.render_timeout_secs);
        }
        if let Some(retention) = raw.retention {
            apply_opt!(cfg.retention.status_ttl_minutes, retention.status_ttl_minutes);
            apply_opt!(cfg.retention.sweep_interval_secs, retention.sweep_interval_secs);
        }
    }

    // Apply environment variable overrides (env takes precedence)
    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

/// Helper to parse env var as a specific type
#[inline]
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Helper to parse env var as bool
#[inline]
fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(v) => parse_bool(&v)
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("invalid {}", key))),
        Err(_) => Ok(None),
    }
}

/// Helper to get env var as string
#[inline]
fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Apply all environment variable overrides to config
fn apply_env_overrides(cfg: &mut Config) -> Result<(), ConfigError> {
    // Server
    if let Some(v) = env_str("ADMITDOC_SERVER_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = env_parse::<u16>("ADMITDOC_SERVER_PORT")? {
        cfg.server.port = v;
    }

    // Logging
    if let Some(v) = env_str("ADMITDOC_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_bool("ADMITDOC_LOG_JSON")? {
        cfg.logging.json = v;
    }

    // Pipeline
    if let Some(v) = env_parse::<usize>("ADMITDOC_PIPELINE_WORKERS")? {
        cfg.pipeline.workers = v;
    }
    if let Some(v) = env_parse::<usize>("ADMITDOC_PIPELINE_QUEUE_CAPACITY")? {
        cfg.pipeline.queue_capacity = v;
    }
    if let Some(v) = env_parse::<u64>("ADMITDOC_PIPELINE_WAIT_TIMEOUT_SECS")? {
        cfg.pipeline.wait_timeout_secs = v;
    }
    if let Some(v) = env_parse::<u64>("ADMITDOC_PIPELINE_POLL_INTERVAL_MS")? {
        cfg.pipeline.poll_interval_ms = v;
    }

    // Renderer
    if let Some(v) = env_str("ADMITDOC_RENDERER_BROWSER_PATH") {
        cfg.renderer.browser_path = v;
    }
    if let Some(v) = env_str("ADMITDOC_RENDERER_EXTRA_ARGS") {
        cfg.renderer.extra_args = split_csv(&v);
    }
    if let Some(v) = env_parse::<u64>("ADMITDOC_RENDERER_TIMEOUT_SECS")? {
        cfg.renderer.render_timeout_secs = v;
    }

    // Retention
    if let Some(v) = env_parse::<u64>("ADMITDOC_RETENTION_STATUS_TTL_MINUTES")? {
        cfg.retention.status_ttl_minutes = v;
    }
    if let Some(v) = env_parse::<u64>("ADMITDOC_RETENTION_SWEEP_INTERVAL_SECS")? {
        cfg.retention.sweep_interval_secs = v;
    }

    Ok(())
}

/// Validate higher-level constraints on the resolved configuration.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.server.port == 0 {
        return Err(ConfigError::Validation("server.port must be > 0".into()));
    }
    let host_ok = cfg.server.host.parse::<std::net::IpAddr>().is_ok()
        || (!cfg.server.host.is_empty()
            && cfg
                .server
                .host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.'));
    if !host_ok {
        return Err(ConfigError::Validation(format!(
            "invalid server.host: {}",
            cfg.server.host
        )));
    }

    if cfg.pipeline.workers == 0 {
        return Err(ConfigError::Validation(
            "pipeline.workers must be >= 1".into(),
        ));
    }
    if cfg.pipeline.queue_capacity == 0 {
        return Err(ConfigError::Validation(
            "pipeline.queue_capacity must be >= 1".into(),
        ));
    }
    if cfg.pipeline.wait_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "pipeline.wait_timeout_secs must be >= 1".into(),
        ));
    }
    if cfg.pipeline.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "pipeline.poll_interval_ms must be >= 1".into(),
        ));
    }

    if cfg.renderer.browser_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "renderer.browser_path must not be empty".into(),
        ));
    }
    if cfg.renderer.render_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "renderer.render_timeout_secs must be >= 1".into(),
        ));
    }

    if cfg.retention.status_ttl_minutes > 0 && cfg.retention.sweep_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "retention.sweep_interval_secs must be >= 1 when a TTL is set".into(),
        ));
    }

    Ok(())
}
