//! Configuration loading and data folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is never fatal: it is logged and defaults are used.

use crate::host::SourceKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ENV_CONFIG: &str = "HOSTFUSE_CONFIG";
pub const ENV_DATA_FOLDER: &str = "HOSTFUSE_DATA_FOLDER";
/// Token shared by both sources when no per-source token is set
pub const ENV_SHARED_TOKEN: &str = "HOSTFUSE_TOKEN";

pub const DATABASE_FILE: &str = "hostfuse.db";
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_MAX_PAGES: usize = 1000;
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding `hostfuse.db`
    pub data_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub qualys: Option<SourceSettings>,
    pub crowdstrike: Option<SourceSettings>,
}

impl SourcesConfig {
    pub fn get(&self, kind: SourceKind) -> Option<&SourceSettings> {
        match kind {
            SourceKind::Qualys => self.qualys.as_ref(),
            SourceKind::CrowdStrike => self.crowdstrike.as_ref(),
        }
    }
}

/// Per-source section of `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSettings {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub page_size: Option<usize>,
    pub max_pages: Option<usize>,
    pub requests_per_second: Option<u32>,
}

/// Fully resolved connection settings for one enabled source
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub kind: SourceKind,
    pub endpoint: String,
    pub token: String,
    pub page_size: usize,
    pub max_pages: usize,
    pub requests_per_second: u32,
}

impl fmt::Debug for ResolvedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSource")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}

/// Environment variable names for one source: (endpoint, token)
pub fn source_env_vars(kind: SourceKind) -> (&'static str, &'static str) {
    match kind {
        SourceKind::Qualys => ("HOSTFUSE_QUALYS_API", "HOSTFUSE_QUALYS_TOKEN"),
        SourceKind::CrowdStrike => ("HOSTFUSE_CROWDSTRIKE_API", "HOSTFUSE_CROWDSTRIKE_TOKEN"),
    }
}

/// Validate token (non-empty, non-whitespace)
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}

/// Locate the TOML config file: explicit path, then `HOSTFUSE_CONFIG`, then the
/// platform config directory
pub fn config_file_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|d| d.join("hostfuse").join("config.toml"))
}

/// Load `config.toml`
///
/// A missing file yields defaults with a warning; a file that exists but does not
/// parse is a configuration error.
pub fn load_toml_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = config_file_path(cli_arg) else {
        warn!("Could not determine config directory, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve the data folder (CLI → ENV → TOML → platform default)
pub fn resolve_data_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ENV_DATA_FOLDER) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.data_folder {
        return path.clone();
    }

    default_data_folder()
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hostfuse"))
        .unwrap_or_else(|| PathBuf::from("./hostfuse_data"))
}

/// Database file inside a data folder
pub fn database_path(data_folder: &Path) -> PathBuf {
    data_folder.join(DATABASE_FILE)
}

/// Resolve one source's endpoint and token (ENV → TOML)
///
/// Returns `None` when either the endpoint or a valid token is missing, which
/// means the source is disabled for this run.
pub fn resolve_source(kind: SourceKind, toml_config: &TomlConfig) -> Option<ResolvedSource> {
    let (endpoint_var, token_var) = source_env_vars(kind);
    let settings = toml_config.sources.get(kind).cloned().unwrap_or_default();

    let endpoint = env_value(endpoint_var).or(settings.endpoint.filter(|e| !e.trim().is_empty()));
    let token = env_value(token_var)
        .or_else(|| env_value(ENV_SHARED_TOKEN))
        .or(settings.token.filter(|t| is_valid_token(t)));

    match (endpoint, token) {
        (Some(endpoint), Some(token)) => {
            debug!("Source {} enabled: {}", kind, endpoint);
            Some(ResolvedSource {
                kind,
                endpoint,
                token,
                page_size: settings.page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE),
                max_pages: settings.max_pages.filter(|n| *n > 0).unwrap_or(DEFAULT_MAX_PAGES),
                requests_per_second: settings
                    .requests_per_second
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_REQUESTS_PER_SECOND),
            })
        }
        (None, _) => {
            debug!("Source {} disabled: no endpoint configured", kind);
            None
        }
        (Some(_), None) => {
            warn!("Source {} has an endpoint but no token; skipping it", kind);
            None
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_valid_token(v))
}
