use hyper::StatusCode;
use thiserror::Error;

/// Everything that stops a request from producing a validator verdict.
///
/// The display string is what the client sees in `errors[0]`.
#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Empty body")]
    EmptyBody,

    #[error("Payload too large")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to read body: {0}")]
    Body(String),

    #[error("ZATCA_JAR_PATH is not set")]
    JarPathUnset,

    #[error("ZATCA JAR not found")]
    JarNotFound { path: std::path::PathBuf },

    #[error("ZATCA_VALIDATE_CMD is not set")]
    CommandUnset,

    #[error("Invalid ZATCA_VALIDATE_CMD: {reason}")]
    InvalidTemplate { reason: String },

    #[error("Failed to start validator command: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SidecarError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::EmptyBody | Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::JarPathUnset
            | Self::JarNotFound { .. }
            | Self::CommandUnset
            | Self::InvalidTemplate { .. }
            | Self::Spawn { .. }
            | Self::Interrupted
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, SidecarError>;
