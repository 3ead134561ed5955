//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Only two paths exist; everything
//! else is a plain 404.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use super::validate;
use crate::config::AppState;
use crate::http;

pub const HEALTH_PATH: &str = "/health";
pub const VALIDATE_PATH: &str = "/validate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Health,
    Validate,
    NotFound,
}

fn route_for(path: &str) -> Route {
    match path {
        HEALTH_PATH => Route::Health,
        VALIDATE_PATH => Route::Validate,
        _ => Route::NotFound,
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let response = match route_for(req.uri().path()) {
        // Health ignores the method and the validator configuration
        Route::Health => http::build_health_response(),
        Route::Validate => validate::handle_validate(req, &state).await,
        Route::NotFound => http::build_404_response(),
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn request(method: &str, path: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[test]
    fn test_route_for() {
        assert_eq!(route_for("/health"), Route::Health);
        assert_eq!(route_for("/validate"), Route::Validate);
        assert_eq!(route_for("/validate/extra"), Route::NotFound);
        assert_eq!(route_for("/"), Route::NotFound);
    }

    #[tokio::test]
    async fn test_health_without_validator_config() {
        let state = Arc::new(AppState::new(Config::default()));
        for method in ["GET", "HEAD", "POST"] {
            let resp = handle_request(request(method, "/health"), Arc::clone(&state))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let body = resp.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], br#"{"ok":true}"#);
        }
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let state = Arc::new(AppState::new(Config::default()));
        let resp = handle_request(request("GET", "/metrics"), state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
