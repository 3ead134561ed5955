//! Logger module
//!
//! Provides logging utilities for the sidecar:
//! - Startup banner
//! - Optional access log in combined/common/json format
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use hyper::Version;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    for line in server_start_lines(addr, config) {
        write_info(&line);
    }
}

fn server_start_lines(addr: &SocketAddr, config: &Config) -> Vec<String> {
    let mut lines = vec![
        format!("ZATCA SDK sidecar listening on :{}", addr.port()),
        format!("  - Bound to: http://{addr}"),
        format!("  - Exec mode: {:?}", config.validator.mode),
    ];
    match &config.validator.jar_path {
        Some(jar) => lines.push(format!("  - SDK jar: {}", jar.display())),
        None => lines.push("  - SDK jar: (not set)".to_string()),
    }
    lines.push(format!(
        "  - Max body size: {} bytes (larger requests get 413)",
        config.http.max_body_size
    ));
    if let Some(workers) = config.server.workers {
        lines.push(format!("  - Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        lines.push(format!("  - Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        lines.push(format!("  - Error log: {path}"));
    }
    lines
}

pub fn log_info(message: &str) {
    write_info(message);
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}

/// Version label used in request lines ("1.1", "2", ...)
pub fn http_version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
