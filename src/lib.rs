//! HTTP sidecar that validates documents with an external command.
//!
//! `POST /validate` stores the body in a temp file, runs the configured
//! validator against it and answers `{"ok":true}` or
//! `{"ok":false,"errors":[...]}`. `GET /health` always answers `{"ok":true}`.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod validator;

pub use config::{AppState, Config};
pub use error::SidecarError;
pub use validator::ValidationResult;
