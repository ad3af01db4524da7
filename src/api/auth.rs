//! Optional API key authentication
//!
//! When `ApiConfig::api_key` is set, every request must carry a matching
//! `X-Api-Key` header or it is answered with 401.

use crate::error::ApiError;
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware rejecting requests without the configured API key
///
/// Passes everything through when no key is configured.
///
/// # Examples
///
/// ```no_run
/// use axum::{Router, middleware};
/// use cloudmail_dl::api::auth::require_api_key;
///
/// let api_key = Some("secret-key-123".to_string());
/// let router: Router = Router::new()
///     .layer(middleware::from_fn_with_state(api_key, require_api_key));
/// ```
pub async fn require_api_key(
    State(expected_api_key): State<Option<String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected_key) = expected_api_key else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(key) if constant_time_eq(key.as_bytes(), expected_key.as_bytes()) => {
            next.run(request).await
        }
        Some(_) => unauthorized_response("Invalid API key"),
        None => unauthorized_response("Missing X-Api-Key header"),
    }
}

/// Compare every byte regardless of where the first mismatch is
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn unauthorized_response(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(ApiError::unauthorized(message))).into_response()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, middleware, routing::get};
    use tower::ServiceExt;

    fn app(api_key: Option<&str>) -> Router {
        Router::new()
            .route("/jobs", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                api_key.map(str::to_string),
                require_api_key,
            ))
    }

    async fn status_for(api_key: Option<&str>, header: Option<&str>) -> StatusCode {
        let mut request = Request::builder().uri("/jobs");
        if let Some(value) = header {
            request = request.header("X-Api-Key", value);
        }
        app(api_key)
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn open_when_no_key_configured() {
        assert_eq!(status_for(None, None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn accepts_matching_key() {
        assert_eq!(status_for(Some("s3cret"), Some("s3cret")).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_wrong_or_missing_key() {
        assert_eq!(
            status_for(Some("s3cret"), Some("S3CRET")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(Some("s3cret "), Some("s3cret")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_for(Some("s3cret"), None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejection_body_uses_error_envelope() {
        let response = app(Some("s3cret"))
            .oneshot(Request::builder().uri("/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.error.code, "unauthorized");
        assert!(error.error.message.contains("Missing X-Api-Key"));
    }

    #[test]
    fn constant_time_eq_compares_exactly() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
