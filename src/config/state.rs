// Application state module
// Shared, read-only configuration plus the process-wide runtime handles

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use super::types::Config;
use crate::server::Shutdown;

/// Application state shared by every connection
pub struct AppState {
    pub config: Config,
    /// Cancellation token for in-flight validations and the accept loop
    pub shutdown: Arc<Shutdown>,
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shutdown: Arc::new(Shutdown::new()),
            active_connections: AtomicUsize::new(0),
        }
    }
}
