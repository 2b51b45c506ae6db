//! Layered configuration for loxhook.
//!
//! Four layers, lowest precedence first: built-in defaults, a TOML file,
//! `LOXHOOK_*` environment variables, and command-line flags. Every layer
//! is read into the same flat [`RawConfig`] of basic types and merged
//! field by field; URL and duration fields are converted only once, after
//! the final merge, into an [`EffectiveConfig`].
//!
//! A layer value equal to the built-in default is treated as absent, so a
//! higher layer can never reset a field back to its default.

mod validate;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Value},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use validate::{is_valid_hostname, validate_controls_dir, validate_hostname, validate_listen_port};

/// Prefix shared by every configuration environment variable.
pub const ENV_PREFIX: &str = "LOXHOOK_";

/// Environment variable naming the configuration file.
pub const CONFIG_FILE_ENV: &str = "LOXHOOK_CONFIG";

/// File read when neither the environment nor a flag names one.
pub const DEFAULT_CONFIG_FILE: &str = "./loxhook.toml";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("listen port must be between 1 and 65534, got {port}")]
    InvalidPort { port: i64 },

    #[error("invalid public hostname '{hostname}'")]
    InvalidHostname { hostname: String },

    #[error("public hostname must not start with http:// or https:// ('{hostname}')")]
    HostnameHasScheme { hostname: String },

    #[error("cannot resolve public hostname '{hostname}': {source}")]
    HostnameLookup {
        hostname: String,
        #[source]
        source: std::io::Error,
    },

    #[error("controls directory {} is not accessible: {source}", path.display())]
    ControlsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("controls directory {} is not a directory", path.display())]
    ControlsNotDir { path: PathBuf },

    #[error("no *.toml control definition file found in {}", path.display())]
    NoDefinitionFiles { path: PathBuf },

    #[error(transparent)]
    Controls(#[from] loxhook_core::ControlError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Raw layer ───────────────────────────────────────────────────────

/// One configuration layer in basic types.
///
/// Fields that a source does not mention keep their default, which the
/// merge treats as "not set".
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RawConfig {
    pub log_file_main: String,
    pub log_file_http_error: String,
    pub log_file_http_access: String,
    pub listen_port: i64,
    pub public_hostname: String,
    pub cert_cache: String,
    pub controls_dir: String,
    pub miniserver_url: String,
    pub miniserver_user: String,
    pub miniserver_password: String,
    /// Seconds.
    pub miniserver_timeout: u64,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            log_file_main: String::new(),
            log_file_http_error: String::new(),
            log_file_http_access: String::new(),
            listen_port: 80,
            public_hostname: String::new(),
            cert_cache: "./cache/letsencrypt".into(),
            controls_dir: "./controls.d".into(),
            miniserver_url: String::new(),
            miniserver_user: "admin".into(),
            miniserver_password: "admin".into(),
            miniserver_timeout: 2,
        }
    }
}

impl fmt::Debug for RawConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawConfig")
            .field("log_file_main", &self.log_file_main)
            .field("log_file_http_error", &self.log_file_http_error)
            .field("log_file_http_access", &self.log_file_http_access)
            .field("listen_port", &self.listen_port)
            .field("public_hostname", &self.public_hostname)
            .field("cert_cache", &self.cert_cache)
            .field("controls_dir", &self.controls_dir)
            .field("miniserver_url", &self.miniserver_url)
            .field("miniserver_user", &self.miniserver_user)
            .field("miniserver_password", &"[REDACTED]")
            .field("miniserver_timeout", &self.miniserver_timeout)
            .finish()
    }
}

macro_rules! overlay_fields {
    ($base:ident, $layer:ident, $defaults:ident; $($field:ident),+ $(,)?) => {
        $(
            if $layer.$field != $defaults.$field {
                $base.$field = $layer.$field;
            }
        )+
    };
}

impl RawConfig {
    /// Read a layer from any figment provider on top of the defaults.
    pub fn from_provider(provider: impl Provider) -> Result<Self, ConfigError> {
        let raw = Figment::from(Serialized::defaults(Self::default()))
            .merge(provider)
            .extract()?;
        Ok(raw)
    }

    /// Apply every field of `layer` that differs from its default.
    pub fn overlay(&mut self, layer: Self) {
        let defaults = Self::default();
        overlay_fields!(self, layer, defaults;
            log_file_main,
            log_file_http_error,
            log_file_http_access,
            listen_port,
            public_hostname,
            cert_cache,
            controls_dir,
            miniserver_url,
            miniserver_user,
            miniserver_password,
            miniserver_timeout,
        );
    }

    /// Convert the merged layers into typed settings.
    pub fn into_effective(self, config_file: Option<PathBuf>) -> Result<EffectiveConfig, ConfigError> {
        let listen_port = validate_listen_port(self.listen_port)?;

        let miniserver_url = Url::parse(&self.miniserver_url).map_err(|e| ConfigError::Validation {
            field: "miniserver_url".into(),
            reason: format!("'{}': {e}", self.miniserver_url),
        })?;
        if !matches!(miniserver_url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "miniserver_url".into(),
                reason: format!("unsupported scheme '{}'", miniserver_url.scheme()),
            });
        }

        if self.miniserver_timeout == 0 {
            return Err(ConfigError::Validation {
                field: "miniserver_timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }

        Ok(EffectiveConfig {
            config_file,
            missing_config_file: None,
            log_file_main: optional_path(self.log_file_main),
            log_file_http_error: optional_path(self.log_file_http_error),
            log_file_http_access: optional_path(self.log_file_http_access),
            listen_port,
            public_hostname: self.public_hostname,
            cert_cache: PathBuf::from(self.cert_cache),
            controls_dir: PathBuf::from(self.controls_dir),
            miniserver_url,
            miniserver_user: self.miniserver_user,
            miniserver_password: SecretString::from(self.miniserver_password),
            miniserver_timeout: Duration::from_secs(self.miniserver_timeout),
        })
    }
}

fn optional_path(raw: String) -> Option<PathBuf> {
    (!raw.is_empty()).then(|| PathBuf::from(raw))
}

// ── Flags ───────────────────────────────────────────────────────────

/// Values given on the command line. `None` means the flag was not passed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlagOverrides {
    /// Configuration file; consulted only when `LOXHOOK_CONFIG` is unset.
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_main: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_http_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_http_access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_cache: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controls_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miniserver_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miniserver_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miniserver_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miniserver_timeout: Option<u64>,
}

// ── Layers ──────────────────────────────────────────────────────────

/// Pick the configuration file: environment, then flag, then default.
///
/// Returns the path and whether it was named explicitly.
pub fn config_file_path(flags: &FlagOverrides) -> (PathBuf, bool) {
    if let Some(path) = std::env::var_os(CONFIG_FILE_ENV).filter(|p| !p.is_empty()) {
        return (PathBuf::from(path), true);
    }
    if let Some(path) = &flags.config_file {
        return (path.clone(), true);
    }
    (PathBuf::from(DEFAULT_CONFIG_FILE), false)
}

/// Read the file layer. A missing file contributes nothing.
pub fn file_layer(path: &Path) -> Result<Option<RawConfig>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    RawConfig::from_provider(Toml::string(&text)).map(Some)
}

/// Fields whose environment value is parsed; every other field takes the
/// variable's text verbatim.
const NUMERIC_FIELDS: &[&str] = &["listen_port", "miniserver_timeout"];

/// Read the `LOXHOOK_*` environment layer.
///
/// String fields keep the raw text, so `LOXHOOK_MINISERVER_PASSWORD=007`
/// is the password "007" and not the number 7.
pub fn env_layer() -> Result<RawConfig, ConfigError> {
    let mut dict = Dict::new();
    for (key, text) in Env::prefixed(ENV_PREFIX).ignore(&["config"]).iter() {
        let key = key.as_str().to_owned();
        let value = if NUMERIC_FIELDS.contains(&key.as_str()) {
            match text.parse::<Value>() {
                Ok(value) => value,
                Err(never) => match never {},
            }
        } else {
            Value::from(text)
        };
        dict.insert(key, value);
    }
    RawConfig::from_provider(Serialized::defaults(dict))
}

/// Read the command-line layer.
pub fn flag_layer(flags: &FlagOverrides) -> Result<RawConfig, ConfigError> {
    RawConfig::from_provider(Serialized::defaults(flags))
}

// ── Resolution ──────────────────────────────────────────────────────

/// Merge all layers and convert, without the semantic checks.
pub fn resolve(flags: &FlagOverrides) -> Result<EffectiveConfig, ConfigError> {
    let (path, explicit) = config_file_path(flags);
    let file = file_layer(&path)?;
    let missing = (file.is_none() && explicit).then(|| path.clone());
    let used_file = file.is_some().then_some(path);

    let mut merged = RawConfig::default();
    if let Some(file) = file {
        merged.overlay(file);
    }
    merged.overlay(env_layer()?);
    merged.overlay(flag_layer(flags)?);

    let mut config = merged.into_effective(used_file)?;
    config.missing_config_file = missing;
    Ok(config)
}

/// Resolve and run the local validation checks.
///
/// The Miniserver reachability probe is left to the caller, which owns
/// the HTTP client.
pub fn load(flags: &FlagOverrides) -> Result<EffectiveConfig, ConfigError> {
    let config = resolve(flags)?;
    config.validate()?;
    Ok(config)
}

// ── Effective configuration ─────────────────────────────────────────

/// The single merged configuration used by the running process.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    /// Config file actually read, if any.
    pub config_file: Option<PathBuf>,
    /// File named by `--config` or `LOXHOOK_CONFIG` that does not exist.
    /// Resolution runs before logging is up, so the caller reports it.
    pub missing_config_file: Option<PathBuf>,
    /// `None` logs to stderr.
    pub log_file_main: Option<PathBuf>,
    pub log_file_http_error: Option<PathBuf>,
    pub log_file_http_access: Option<PathBuf>,
    pub listen_port: u16,
    pub public_hostname: String,
    pub cert_cache: PathBuf,
    pub controls_dir: PathBuf,
    pub miniserver_url: Url,
    pub miniserver_user: String,
    pub miniserver_password: SecretString,
    pub miniserver_timeout: Duration,
}

impl EffectiveConfig {
    /// Local checks: listen port, public hostname, controls directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_listen_port(i64::from(self.listen_port))?;
        validate_hostname(&self.public_hostname)?;
        validate_controls_dir(&self.controls_dir)?;
        Ok(())
    }
}

impl fmt::Display for EffectiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn path_or(p: Option<&PathBuf>, fallback: &str) -> String {
            p.map_or_else(|| fallback.to_owned(), |p| p.display().to_string())
        }

        writeln!(f, "Config file:          {}", path_or(self.config_file.as_ref(), "(none)"))?;
        writeln!(f, "Log file main:        {}", path_or(self.log_file_main.as_ref(), "stderr"))?;
        writeln!(
            f,
            "Log file http errors: {}",
            path_or(self.log_file_http_error.as_ref(), "stderr")
        )?;
        writeln!(
            f,
            "Log file http access: {}",
            path_or(self.log_file_http_access.as_ref(), "stderr")
        )?;
        writeln!(f, "Listen port:          {}", self.listen_port)?;
        writeln!(f, "Public hostname:      {}", self.public_hostname)?;
        writeln!(f, "Certificate cache:    {}", self.cert_cache.display())?;
        writeln!(f, "Controls directory:   {}", self.controls_dir.display())?;
        writeln!(f, "Miniserver URL:       {}", self.miniserver_url)?;
        writeln!(f, "Miniserver user:      {}", self.miniserver_user)?;
        write!(f, "Miniserver timeout:   {} seconds", self.miniserver_timeout.as_secs())
    }
}
