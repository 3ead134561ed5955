// Connection handling module
// Accepts a single TCP connection and serves it with hyper

use std::pin::pin;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;

use crate::config::AppState;
use crate::handler;
use crate::logger::{self, AccessLogEntry};

/// Accept a connection, enforcing the optional connection limit.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
) {
    // Increment counter first, then check limit
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= max_conn {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// Serve one connection in its own task.
///
/// No connection timeout: a validation may take as long as the external
/// command needs. A dropped connection drops the request future, which kills
/// the child and removes the temp file.
fn handle_connection(stream: tokio::net::TcpStream, peer_addr: std::net::SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.config.performance.keep_alive);

        let service_state = Arc::clone(&state);
        let mut conn = pin!(builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                async move {
                    if !state.config.logging.access_log {
                        return handler::handle_request(req, state).await;
                    }

                    let started = Instant::now();
                    let mut entry = AccessLogEntry::new(
                        peer_addr.ip().to_string(),
                        req.method().to_string(),
                        req.uri().path().to_string(),
                    );
                    entry.query = req.uri().query().map(ToString::to_string);
                    entry.http_version = logger::http_version_label(req.version()).to_string();
                    entry.user_agent = req
                        .headers()
                        .get(hyper::header::USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                        .map(ToString::to_string);

                    let response = handler::handle_request(req, Arc::clone(&state)).await;
                    if let Ok(resp) = &response {
                        entry.status = resp.status().as_u16();
                        entry.body_bytes = hyper::body::Body::size_hint(resp.body())
                            .exact()
                            .and_then(|n| usize::try_from(n).ok())
                            .unwrap_or(0);
                    }
                    entry.request_time_us =
                        u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
                    logger::log_access(&entry, &state.config.logging.access_log_format);
                    response
                }
            }),
        ));

        let finished = tokio::select! {
            result = conn.as_mut() => Some(result),
            () = state.shutdown.wait() => None,
        };
        let result = match finished {
            Some(result) => result,
            None => {
                // Let the in-flight response go out, then close
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        };
        if let Err(err) = result {
            logger::log_connection_error(&err);
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}
