// Server module entry point
// Listener creation, accept loop, connection handling and shutdown

pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;

pub use listener::create_listener;
pub use signal::{start_signal_handler, Shutdown};

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept connections until the shutdown token fires, then drain.
///
/// After shutdown the listener is closed and open connections get up to
/// `performance.shutdown_grace_ms` to finish before the loop returns.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    loop {
        tokio::select! {
            () = state.shutdown.wait() => break,
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(stream, peer_addr, &state);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }
        }
    }

    drop(listener);
    drain_connections(&state).await;
    Ok(())
}

/// Wait for open connections to close, bounded by the configured grace period
async fn drain_connections(state: &AppState) {
    let grace = Duration::from_millis(state.config.performance.shutdown_grace_ms);
    let deadline = tokio::time::Instant::now() + grace;

    loop {
        let open = state.active_connections.load(Ordering::SeqCst);
        if open == 0 {
            logger::log_info("[SHUTDOWN] All connections closed");
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "[SHUTDOWN] {open} connection(s) still open after {}ms, exiting anyway",
                grace.as_millis()
            ));
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
