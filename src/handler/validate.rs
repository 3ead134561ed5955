//! Validation endpoint
//!
//! `POST /validate`: method check, body check, config check, then the
//! external validator. Every failure short-circuits into a JSON error.

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode};

use crate::config::AppState;
use crate::error::{Result, SidecarError};
use crate::http;
use crate::logger;
use crate::validator::{self, ValidationResult};

/// Handle `/validate` and always produce a response
pub async fn handle_validate<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match process(req, state).await {
        // A failed validation is still a successful request
        Ok(result) => http::build_json_response(StatusCode::OK, &result),
        Err(err @ SidecarError::MethodNotAllowed) => http::build_405_response(&err.to_string()),
        Err(err) => {
            log_failure(&err);
            http::build_json_response(err.status(), &ValidationResult::from(&err))
        }
    }
}

async fn process<B>(req: Request<B>, state: &AppState) -> Result<ValidationResult>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    // Clients that send a lowercase method are still served
    if !req.method().as_str().eq_ignore_ascii_case(Method::POST.as_str()) {
        return Err(SidecarError::MethodNotAllowed);
    }

    let body = read_body(req.into_body(), state.config.http.max_body_size).await?;
    if body.is_empty() {
        return Err(SidecarError::EmptyBody);
    }

    validator::validate(&state.config.validator, &body, &state.shutdown).await
}

/// Collect the whole body, refusing anything over `limit` bytes
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(SidecarError::PayloadTooLarge { limit }),
        Err(e) => Err(SidecarError::Body(e.to_string())),
    }
}

fn log_failure(err: &SidecarError) {
    match err {
        SidecarError::Interrupted => {
            logger::log_warning("Validation interrupted by shutdown, temp payload removed");
        }
        SidecarError::Spawn { program, source } => {
            logger::log_error(&format!("Failed to start validator '{program}': {source}"));
        }
        SidecarError::InvalidTemplate { .. } | SidecarError::Io(_) => {
            logger::log_error(&err.to_string());
        }
        SidecarError::PayloadTooLarge { limit } => {
            logger::log_warning(&format!("Rejected payload over {limit} bytes"));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ExecMode};
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct TestState {
        state: Arc<AppState>,
        tmp: TempDir,
        _jar_dir: TempDir,
    }

    fn test_state(command: Option<&str>, mode: ExecMode) -> TestState {
        let jar_dir = TempDir::new().unwrap();
        let jar = jar_dir.path().join("zatca-einvoicing-sdk.jar");
        std::fs::write(&jar, b"PK").unwrap();
        let tmp = TempDir::new().unwrap();

        let mut config = Config::default();
        config.validator.jar_path = Some(jar);
        config.validator.command = command.map(ToString::to_string);
        config.validator.mode = mode;
        config.validator.temp_dir = Some(tmp.path().to_path_buf());

        TestState {
            state: Arc::new(AppState::new(config)),
            tmp,
            _jar_dir: jar_dir,
        }
    }

    fn post(body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method("POST")
            .uri("/validate")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn call(req: Request<Full<Bytes>>, state: &AppState) -> (StatusCode, String) {
        let resp = handle_validate(req, state).await;
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn assert_no_temp_files(dir: &Path) {
        let leftovers: Vec<_> = std::fs::read_dir(dir).unwrap().collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_non_post_is_405() {
        let ts = test_state(Some("true"), ExecMode::Argv);
        for method in ["GET", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"] {
            let req = Request::builder()
                .method(method)
                .uri("/validate")
                .body(Full::new(Bytes::from("<Invoice/>")))
                .unwrap();
            let (status, body) = call(req, &ts.state).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "method {method}");
            assert_eq!(body, r#"{"ok":false,"errors":["Method not allowed"]}"#);
        }
    }

    #[tokio::test]
    async fn test_post_method_case_insensitive() {
        let ts = test_state(Some("exit 0"), ExecMode::Shell);
        for method in ["post", "Post"] {
            let req = Request::builder()
                .method(method)
                .uri("/validate")
                .body(Full::new(Bytes::from("<Invoice/>")))
                .unwrap();
            let (status, body) = call(req, &ts.state).await;
            assert_eq!(status, StatusCode::OK, "method {method}");
            assert_eq!(body, r#"{"ok":true}"#);
        }
        assert_no_temp_files(ts.tmp.path());
    }

    #[tokio::test]
    async fn test_empty_body_is_400() {
        let ts = test_state(Some("true"), ExecMode::Argv);
        let (status, body) = call(post(""), &ts.state).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"ok":false,"errors":["Empty body"]}"#);
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let jar_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.validator.jar_path = Some(jar_dir.path().to_path_buf());
        config.validator.command = Some("true".to_string());
        config.http.max_body_size = 8;
        let state = AppState::new(config);

        let (status, body) = call(post("<Invoice>too long</Invoice>"), &state).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, r#"{"ok":false,"errors":["Payload too large"]}"#);
    }

    #[tokio::test]
    async fn test_missing_jar_is_500() {
        let mut config = Config::default();
        config.validator.command = Some("true".to_string());
        let state = AppState::new(config.clone());
        let (status, body) = call(post("<Invoice/>"), &state).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"ok":false,"errors":["ZATCA_JAR_PATH is not set"]}"#);

        config.validator.jar_path = Some("/no/such/dir/zatca.jar".into());
        let state = AppState::new(config);
        let (status, body) = call(post("<Invoice/>"), &state).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"ok":false,"errors":["ZATCA JAR not found"]}"#);
    }

    #[tokio::test]
    async fn test_missing_command_is_500() {
        let ts = test_state(None, ExecMode::Argv);
        let (status, body) = call(post("<Invoice/>"), &ts.state).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"ok":false,"errors":["ZATCA_VALIDATE_CMD is not set"]}"#);
        assert_no_temp_files(ts.tmp.path());
    }

    #[tokio::test]
    async fn test_passing_command_is_ok() {
        let ts = test_state(Some("sh -c 'exit 0' sh {input}"), ExecMode::Argv);
        let (status, body) = call(post("<Invoice/>"), &ts.state).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"ok":true}"#);
        assert_no_temp_files(ts.tmp.path());
    }

    #[tokio::test]
    async fn test_failing_command_reports_output() {
        let ts = test_state(Some("printf 'bad input'; exit 1"), ExecMode::Shell);
        let (status, body) = call(post("<Invoice/>"), &ts.state).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"ok":false,"errors":["SDK validation failed","bad input"]}"#);
        assert_no_temp_files(ts.tmp.path());
    }

    #[tokio::test]
    async fn test_stderr_and_newlines_in_output() {
        let ts = test_state(Some("echo line1; echo line2 >&2; exit 2"), ExecMode::Shell);
        let (status, body) = call(post("<Invoice/>"), &ts.state).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            r#"{"ok":false,"errors":["SDK validation failed","line1 line2 "]}"#
        );
    }

    #[tokio::test]
    async fn test_quotes_and_backslashes_are_escaped() {
        let ts = test_state(
            Some(r#"printf '%s' 'say "hi" \ there'; exit 3"#),
            ExecMode::Shell,
        );
        let (status, body) = call(post("<Invoice/>"), &ts.state).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"say \"hi\" \\ there"#), "body: {body}");

        let parsed: ValidationResult = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.errors[1], r#"say "hi" \ there"#);
    }

    #[tokio::test]
    async fn test_command_receives_temp_path() {
        let ts = test_state(Some("printf '%s' {input}; exit 1"), ExecMode::Shell);
        let (_, body) = call(post("<Invoice/>"), &ts.state).await;
        let parsed: ValidationResult = serde_json::from_str(&body).unwrap();
        let path = Path::new(&parsed.errors[1]);

        assert!(path.is_absolute());
        assert!(path.starts_with(ts.tmp.path()));
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("zatca-") && name.ends_with(".xml"), "name: {name}");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_payload_written_verbatim() {
        let ts = test_state(Some(r#"sh -c 'cat "$1"; exit 1' sh {input}"#), ExecMode::Argv);
        let payload = "<Invoice xmlns=\"urn:oasis\">\u{0641}\u{0627}\u{062a}\u{0648}\u{0631}\u{0629}</Invoice>";
        let (_, body) = call(post(payload), &ts.state).await;
        let parsed: ValidationResult = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.errors[1], payload);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_running_command() {
        let ts = test_state(Some("exec sleep 10"), ExecMode::Shell);
        let shutdown = Arc::clone(&ts.state.shutdown);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            shutdown.trigger();
        });

        let (status, body) = tokio::time::timeout(Duration::from_secs(5), call(post("<Invoice/>"), &ts.state))
            .await
            .expect("interrupted before the command finished");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"ok":false,"errors":["Command interrupted"]}"#);
        assert!(ts.state.shutdown.is_triggered());
        assert_no_temp_files(ts.tmp.path());
    }

    #[tokio::test]
    async fn test_dropped_request_removes_temp_file() {
        let ts = test_state(Some("exec sleep 10"), ExecMode::Shell);
        let state = Arc::clone(&ts.state);
        let pending = tokio::spawn(async move { call(post("<Invoice/>"), &state).await });

        tokio::time::sleep(Duration::from_millis(200)).await;
        let created = std::fs::read_dir(ts.tmp.path()).unwrap().count();
        assert_eq!(created, 1);

        pending.abort();
        let _ = pending.await;
        assert_no_temp_files(ts.tmp.path());
    }

    #[tokio::test]
    async fn test_unstartable_command_is_500() {
        let ts = test_state(Some("/no/such/validator {input}"), ExecMode::Argv);
        let (status, body) = call(post("<Invoice/>"), &ts.state).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Failed to start validator command"), "body: {body}");
        assert_no_temp_files(ts.tmp.path());
    }
}
