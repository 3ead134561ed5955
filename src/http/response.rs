//! HTTP response building module
//!
//! Builders for the responses the sidecar sends, decoupled from request handling.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{header, Response, StatusCode};

use crate::validator::ValidationResult;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Build a JSON response carrying a `ValidationResult`
pub fn build_json_response(status: StatusCode, result: &ValidationResult) -> Response<Full<Bytes>> {
    let json = match serde_json::to_string(result) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_raw_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"ok":false,"errors":["Internal server error"]}"#.to_string(),
            );
        }
    };
    build_raw_json(status, json)
}

/// `{"ok":true}` health response
pub fn build_health_response() -> Response<Full<Bytes>> {
    build_json_response(StatusCode::OK, &ValidationResult::valid())
}

/// Build 405 Method Not Allowed response for the POST-only endpoint
pub fn build_405_response(message: &str) -> Response<Full<Bytes>> {
    let mut resp = build_json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ValidationResult::rejected(message),
    );
    resp.headers_mut()
        .insert(header::ALLOW, header::HeaderValue::from_static("POST"));
    resp
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from("404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 Not Found")))
        })
}

fn build_raw_json(status: StatusCode, json: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
