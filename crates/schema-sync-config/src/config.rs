// crates/schema-sync-config/src/config.rs
// ============================================================================
// Module: Schema Sync Configuration
// Description: Configuration loading and validation for Schema Sync.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults, so an empty file is a valid configuration that
//! points at the public schema sources.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "schema-sync.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SCHEMA_SYNC_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 256 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum URL length accepted for schema sources.
pub(crate) const MAX_URL_LENGTH: usize = 2048;
/// Maximum number of stale JSON schema URL suffixes.
pub(crate) const MAX_STALE_SUFFIXES: usize = 64;
/// Placeholder substituted with the manifest tag in schema URL templates.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Default drain period in milliseconds.
pub const DEFAULT_UPDATE_PERIOD_MS: u64 = 1_000;
/// Maximum drain period in milliseconds.
pub(crate) const MAX_UPDATE_PERIOD_MS: u64 = 60 * 60 * 1_000;
/// Default HTTP timeout in milliseconds.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
/// Maximum HTTP timeout in milliseconds.
pub(crate) const MAX_HTTP_TIMEOUT_MS: u64 = 10 * 60 * 1_000;
/// Default HTTP user agent (the release manifest API rejects anonymous clients).
pub const DEFAULT_USER_AGENT: &str = "schema-sync";
/// Default storage directory for downloaded schemas.
pub const DEFAULT_STORAGE_DIR: &str = ".schema-sync";
/// Default version cache file name inside the storage directory.
pub const DEFAULT_VERSION_CACHE_FILE: &str = "versions.json";
/// Default release manifest URL carrying the schema `tag_name`.
pub const DEFAULT_MANIFEST_URL: &str =
    "https://api.github.com/repos/awslabs/goformation/releases/latest";
/// Default CloudFormation schema URL template.
pub const DEFAULT_CFN_URL_TEMPLATE: &str =
    "https://raw.githubusercontent.com/awslabs/goformation/{version}/schema/cloudformation.schema.json";
/// Default SAM schema URL template.
pub const DEFAULT_SAM_URL_TEMPLATE: &str =
    "https://raw.githubusercontent.com/awslabs/goformation/{version}/schema/sam.schema.json";
/// Default buildspec schema CDN URL.
pub const DEFAULT_BUILDSPEC_PRIMARY_URL: &str =
    "https://d3rrggjwfhwld2.cloudfront.net/CodeBuild/buildspec/buildspec-standalone.schema.json";
/// Default buildspec schema object-storage fallback URL.
pub const DEFAULT_BUILDSPEC_FALLBACK_URL: &str =
    "https://s3.amazonaws.com/aws-vs-toolkit/CodeBuild/buildspec/buildspec-standalone.schema.json";
/// Default settings file used by the JSON handler.
pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";
/// Default settings key holding JSON schema associations.
pub const DEFAULT_SETTINGS_KEY: &str = "json.schemas";
/// Default stale schema URL suffix removed on first JSON update.
pub const DEFAULT_STALE_URL_SUFFIX: &str = "/resourceschemas/schema.json";
/// Default URI scheme for YAML contributor schema URIs.
pub const DEFAULT_YAML_SCHEME: &str = "aws";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Schema Sync configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SchemaSyncConfig {
    /// Service drain configuration.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Schema storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Remote schema sources.
    #[serde(default)]
    pub sources: SourcesConfig,
    /// HTTP client configuration.
    #[serde(default)]
    pub http: HttpConfig,
    /// JSON handler configuration.
    #[serde(default)]
    pub json: JsonHandlerConfig,
    /// YAML handler configuration.
    #[serde(default)]
    pub yaml: YamlHandlerConfig,
    /// Event log configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SchemaSyncConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// A missing file at the default location yields the default config; an
    /// explicitly requested file must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.validate()?;
        self.storage.validate()?;
        self.sources.validate()?;
        self.http.validate()?;
        self.json.validate()?;
        self.yaml.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Service drain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Delay between drain cycles in milliseconds.
    #[serde(default = "default_update_period_ms")]
    pub update_period_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            update_period_ms: default_update_period_ms(),
        }
    }
}

impl ServiceConfig {
    /// Returns the drain period as a duration.
    #[must_use]
    pub const fn update_period(&self) -> Duration {
        Duration::from_millis(self.update_period_ms)
    }

    /// Validates service settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.update_period_ms == 0 {
            return Err(ConfigError::Invalid(
                "service.update_period_ms must be greater than zero".to_string(),
            ));
        }
        if self.update_period_ms > MAX_UPDATE_PERIOD_MS {
            return Err(ConfigError::Invalid(format!(
                "service.update_period_ms must be at most {MAX_UPDATE_PERIOD_MS}"
            )));
        }
        Ok(())
    }
}

/// Schema storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding downloaded schema files.
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
    /// Version cache file name inside the storage directory.
    #[serde(default = "default_version_cache_file")]
    pub version_cache: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            version_cache: default_version_cache_file(),
        }
    }
}

impl StorageConfig {
    /// Returns the version cache path.
    #[must_use]
    pub fn version_cache_path(&self) -> PathBuf {
        self.dir.join(&self.version_cache)
    }

    /// Validates storage settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("storage.dir", &self.dir.to_string_lossy())?;
        let name = self.version_cache.trim();
        if name.is_empty() {
            return Err(ConfigError::Invalid("storage.version_cache must be non-empty".to_string()));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(ConfigError::Invalid(
                "storage.version_cache must be a file name, not a path".to_string(),
            ));
        }
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("storage.version_cache is too long".to_string()));
        }
        Ok(())
    }
}

/// Remote schema source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Release manifest URL returning a JSON `tag_name`.
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,
    /// CloudFormation schema URL template containing `{version}`.
    #[serde(default = "default_cfn_url_template")]
    pub cfn_url_template: String,
    /// SAM schema URL template containing `{version}`.
    #[serde(default = "default_sam_url_template")]
    pub sam_url_template: String,
    /// Buildspec schema primary (CDN) URL.
    #[serde(default = "default_buildspec_primary_url")]
    pub buildspec_primary_url: String,
    /// Buildspec schema fallback (object storage) URL.
    #[serde(default = "default_buildspec_fallback_url")]
    pub buildspec_fallback_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            manifest_url: default_manifest_url(),
            cfn_url_template: default_cfn_url_template(),
            sam_url_template: default_sam_url_template(),
            buildspec_primary_url: default_buildspec_primary_url(),
            buildspec_fallback_url: default_buildspec_fallback_url(),
        }
    }
}

impl SourcesConfig {
    /// Returns the CloudFormation schema URL for a manifest tag.
    #[must_use]
    pub fn cfn_url(&self, version: &str) -> String {
        self.cfn_url_template.replace(VERSION_PLACEHOLDER, version)
    }

    /// Returns the SAM schema URL for a manifest tag.
    #[must_use]
    pub fn sam_url(&self, version: &str) -> String {
        self.sam_url_template.replace(VERSION_PLACEHOLDER, version)
    }

    /// Validates source settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_url("sources.manifest_url", &self.manifest_url)?;
        validate_url("sources.buildspec_primary_url", &self.buildspec_primary_url)?;
        validate_url("sources.buildspec_fallback_url", &self.buildspec_fallback_url)?;
        for (field, template) in [
            ("sources.cfn_url_template", &self.cfn_url_template),
            ("sources.sam_url_template", &self.sam_url_template),
        ] {
            if !template.contains(VERSION_PLACEHOLDER) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must contain {VERSION_PLACEHOLDER}"
                )));
            }
            validate_url(field, &template.replace(VERSION_PLACEHOLDER, "v0"))?;
        }
        Ok(())
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_http_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Returns the request timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates HTTP settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 || self.timeout_ms > MAX_HTTP_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "http.timeout_ms must be between 1 and {MAX_HTTP_TIMEOUT_MS}"
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("http.user_agent must be non-empty".to_string()));
        }
        Ok(())
    }
}

/// JSON handler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonHandlerConfig {
    /// Settings document holding the association list.
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,
    /// Settings key holding the association list.
    #[serde(default = "default_settings_key")]
    pub settings_key: String,
    /// Association URLs ending with one of these suffixes are removed once.
    #[serde(default = "default_stale_url_suffixes")]
    pub stale_url_suffixes: Vec<String>,
}

impl Default for JsonHandlerConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            settings_key: default_settings_key(),
            stale_url_suffixes: default_stale_url_suffixes(),
        }
    }
}

impl JsonHandlerConfig {
    /// Validates JSON handler settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("json.settings_path", &self.settings_path.to_string_lossy())?;
        if self.settings_key.trim().is_empty() {
            return Err(ConfigError::Invalid("json.settings_key must be non-empty".to_string()));
        }
        if self.stale_url_suffixes.len() > MAX_STALE_SUFFIXES {
            return Err(ConfigError::Invalid("too many json.stale_url_suffixes".to_string()));
        }
        if self.stale_url_suffixes.iter().any(|suffix| suffix.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "json.stale_url_suffixes entries must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// YAML handler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YamlHandlerConfig {
    /// URI scheme used for contributed schema URIs.
    #[serde(default = "default_yaml_scheme")]
    pub scheme: String,
}

impl Default for YamlHandlerConfig {
    fn default() -> Self {
        Self {
            scheme: default_yaml_scheme(),
        }
    }
}

impl YamlHandlerConfig {
    /// Validates YAML handler settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut chars = self.scheme.chars();
        let valid_start = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic());
        let valid_rest = chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'));
        if !valid_start || !valid_rest {
            return Err(ConfigError::Invalid(format!(
                "yaml.scheme is not a valid uri scheme: {}",
                self.scheme
            )));
        }
        Ok(())
    }
}

/// Event log sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Events are discarded.
    None,
}

/// Event log configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Sink receiving events.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path when `sink = "file"`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("logging.sink=file requires logging.path".to_string()))
            }
            (LogSinkKind::File, Some(path)) => {
                validate_path_string("logging.path", &path.to_string_lossy())
            }
            (LogSinkKind::Stderr | LogSinkKind::None, _) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default drain period.
const fn default_update_period_ms() -> u64 {
    DEFAULT_UPDATE_PERIOD_MS
}

/// Default storage directory.
fn default_storage_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_DIR)
}

/// Default version cache file name.
fn default_version_cache_file() -> String {
    DEFAULT_VERSION_CACHE_FILE.to_string()
}

/// Default manifest URL.
fn default_manifest_url() -> String {
    DEFAULT_MANIFEST_URL.to_string()
}

/// Default CloudFormation URL template.
fn default_cfn_url_template() -> String {
    DEFAULT_CFN_URL_TEMPLATE.to_string()
}

/// Default SAM URL template.
fn default_sam_url_template() -> String {
    DEFAULT_SAM_URL_TEMPLATE.to_string()
}

/// Default buildspec CDN URL.
fn default_buildspec_primary_url() -> String {
    DEFAULT_BUILDSPEC_PRIMARY_URL.to_string()
}

/// Default buildspec fallback URL.
fn default_buildspec_fallback_url() -> String {
    DEFAULT_BUILDSPEC_FALLBACK_URL.to_string()
}

/// Default HTTP timeout.
const fn default_http_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

/// Default HTTP user agent.
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Default settings document path.
fn default_settings_path() -> PathBuf {
    PathBuf::from(DEFAULT_SETTINGS_PATH)
}

/// Default settings key.
fn default_settings_key() -> String {
    DEFAULT_SETTINGS_KEY.to_string()
}

/// Default stale URL suffixes.
fn default_stale_url_suffixes() -> Vec<String> {
    vec![DEFAULT_STALE_URL_SUFFIX.to_string()]
}

/// Default YAML scheme.
fn default_yaml_scheme() -> String {
    DEFAULT_YAML_SCHEME.to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// Returns the path and whether it was explicitly requested.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an absolute `http`, `https`, or `file` URL.
fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let url = Url::parse(trimmed)
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    match url.scheme() {
        "http" | "https" | "file" => Ok(()),
        scheme => Err(ConfigError::Invalid(format!("{field} has unsupported scheme: {scheme}"))),
    }
}
