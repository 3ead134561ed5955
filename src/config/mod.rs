// Configuration module entry point
// Builds the immutable configuration once at startup and exposes the shared state

mod state;
mod types;

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::logger;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, ExecMode, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    ValidatorConfig, DEFAULT_HOST, DEFAULT_MAX_BODY_SIZE, DEFAULT_PORT,
};

/// Legacy environment variables understood on top of `SIDECAR__*`
pub const ENV_PORT: &str = "PORT";
pub const ENV_JAR_PATH: &str = "ZATCA_JAR_PATH";
pub const ENV_VALIDATE_CMD: &str = "ZATCA_VALIDATE_CMD";
pub const ENV_VALIDATE_MODE: &str = "ZATCA_VALIDATE_MODE";

const INPUT_PLACEHOLDER: &str = crate::validator::INPUT_PLACEHOLDER;

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "sidecar.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SIDECAR").separator("__"))
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("validator.mode", "shell")?
            .set_default("logging.access_log", false)?
            .set_default("logging.access_log_format", "combined")?
            .build()?;

        let mut cfg: Self = settings.try_deserialize()?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Overlay the legacy process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay legacy variables using `lookup` instead of the process environment.
    ///
    /// An empty variable counts as unset for the jar path and command. A `PORT`
    /// that is not a valid port keeps the configured port.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_PORT).filter(|v| !v.is_empty()) {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => logger::log_warning(&format!(
                    "Invalid {ENV_PORT} value '{raw}', falling back to port {}",
                    self.server.port
                )),
            }
        }

        if let Some(jar) = lookup(ENV_JAR_PATH) {
            self.validator.jar_path = Some(jar).filter(|v| !v.is_empty()).map(PathBuf::from);
        }

        if let Some(cmd) = lookup(ENV_VALIDATE_CMD) {
            self.validator.command = Some(cmd).filter(|v| !v.is_empty());
        }

        if let Some(raw) = lookup(ENV_VALIDATE_MODE).filter(|v| !v.is_empty()) {
            match raw.parse::<ExecMode>() {
                Ok(mode) => self.validator.mode = mode,
                Err(e) => logger::log_warning(&format!("Ignoring {ENV_VALIDATE_MODE}: {e}")),
            }
        }
    }

    /// Startup sanity checks. Problems are only warnings: requests report them.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        match &self.validator.jar_path {
            None => out.push(format!("{ENV_JAR_PATH} is not set, /validate will return 500")),
            Some(p) if !p.exists() => {
                out.push(format!("ZATCA JAR not found at {}", p.display()));
            }
            Some(_) => {}
        }
        match &self.validator.command {
            None => out.push(format!("{ENV_VALIDATE_CMD} is not set, /validate will return 500")),
            Some(c) if !c.contains(INPUT_PLACEHOLDER) => out.push(format!(
                "{ENV_VALIDATE_CMD} has no {INPUT_PLACEHOLDER} placeholder, the payload path will not be passed"
            )),
            Some(_) => {}
        }
        out
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
