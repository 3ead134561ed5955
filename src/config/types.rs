// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub validator: ValidatorConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            workers: None,
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_port() -> u16 {
    DEFAULT_PORT
}

/// How the command template is turned into a process
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    /// Split the template into words and exec the first one directly
    Argv,
    /// Hand the expanded template to `<shell> -c`
    #[default]
    Shell,
}

impl std::str::FromStr for ExecMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "argv" => Ok(Self::Argv),
            "shell" => Ok(Self::Shell),
            other => Err(format!("unknown exec mode '{other}' (expected 'argv' or 'shell')")),
        }
    }
}

/// External validator configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ValidatorConfig {
    /// SDK jar; must exist when a request is validated
    #[serde(default)]
    pub jar_path: Option<PathBuf>,
    /// Command template, `{input}` is replaced by the temp file path
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub mode: ExecMode,
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Directory for temp files (OS temp dir if not set)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,
    #[serde(default = "default_temp_suffix")]
    pub temp_suffix: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            jar_path: None,
            command: None,
            mode: ExecMode::default(),
            shell: default_shell(),
            temp_dir: None,
            temp_prefix: default_temp_prefix(),
            temp_suffix: default_temp_suffix(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_shell() -> String {
    "/bin/sh".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_temp_prefix() -> String {
    "zatca-".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_temp_suffix() -> String {
    ".xml".to_string()
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_body_size() -> usize {
    DEFAULT_MAX_BODY_SIZE
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default)]
    pub access_log: bool,
    /// Access log format (combined, common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: false,
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    #[serde(default = "default_keep_alive")]
    pub keep_alive: bool,
    #[serde(default)]
    pub max_connections: Option<usize>,
    /// How long shutdown waits for open connections
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive: default_keep_alive(),
            max_connections: None,
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_keep_alive() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_shutdown_grace_ms() -> u64 {
    5000
}
