//! External validator module
//!
//! Writes the payload to a scoped temp file, runs the configured command
//! against it and turns the exit status into a [`ValidationResult`].

pub mod command;
pub mod process;

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::config::ValidatorConfig;
use crate::error::{Result, SidecarError};
use crate::server::Shutdown;

pub use command::{build_argv, INPUT_PLACEHOLDER};
pub use process::{run_merged, CommandOutput};

/// First error reported when the command exits non-zero
pub const VALIDATION_FAILED: &str = "SDK validation failed";

/// The only response shape the sidecar produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub const fn valid() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            errors: vec![message.into()],
        }
    }

    /// Verdict for a finished command: exit 0 is valid, anything else carries
    /// the captured output on a single line.
    pub fn from_output(out: &CommandOutput) -> Self {
        if out.success {
            return Self::valid();
        }
        let text = String::from_utf8_lossy(&out.output).replace(['\n', '\r'], " ");
        Self {
            ok: false,
            errors: vec![VALIDATION_FAILED.to_string(), text],
        }
    }
}

impl From<&SidecarError> for ValidationResult {
    fn from(err: &SidecarError) -> Self {
        Self::rejected(err.to_string())
    }
}

/// Check the settings a validation needs and return the command template.
pub fn check_config(cfg: &ValidatorConfig) -> Result<&str> {
    let jar = cfg.jar_path.as_deref().ok_or(SidecarError::JarPathUnset)?;
    if jar.as_os_str().is_empty() {
        return Err(SidecarError::JarPathUnset);
    }
    if !jar.exists() {
        return Err(SidecarError::JarNotFound {
            path: jar.to_path_buf(),
        });
    }
    cfg.command
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(SidecarError::CommandUnset)
}

/// Payload file that is removed when dropped, whichever way the request ends
pub struct TempPayload {
    file: NamedTempFile,
    path: PathBuf,
}

impl TempPayload {
    pub fn create(cfg: &ValidatorConfig, payload: &[u8]) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&cfg.temp_prefix).suffix(&cfg.temp_suffix);
        let mut file = match &cfg.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(payload)?;
        file.flush()?;
        let path = std::path::absolute(file.path())?;
        Ok(Self { file, path })
    }

    /// Absolute path handed to the command
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file now, reporting failures instead of ignoring them
    pub fn remove(self) -> Result<()> {
        self.file.close()?;
        Ok(())
    }
}

/// Validate `payload` with the configured external command.
///
/// Configuration errors, spawn failures and interruption are errors; a
/// non-zero exit is a normal `ok: false` verdict.
pub async fn validate(cfg: &ValidatorConfig, payload: &[u8], shutdown: &Shutdown) -> Result<ValidationResult> {
    let template = check_config(cfg)?;
    let temp = TempPayload::create(cfg, payload)?;

    let argv = build_argv(template, temp.path(), cfg.mode, &cfg.shell)?;
    let outcome = run_merged(&argv, shutdown).await;

    if let Err(e) = temp.remove() {
        crate::logger::log_warning(&format!("Failed to remove temp payload: {e}"));
    }

    let output = outcome?;
    if !output.success {
        let code = output
            .code
            .map_or_else(|| "signal".to_string(), |code| code.to_string());
        crate::logger::log_info(&format!(
            "Validator rejected payload (exit {code}, {} bytes of output)",
            output.output.len()
        ));
    }
    Ok(ValidationResult::from_output(&output))
}
