//! Admin key guard for destructive endpoints.
//!
//! Implements constant-time comparison to mitigate timing attacks.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::AppState;

/// Header name for the admin key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject the request unless it carries the configured admin key.
///
/// With no key configured every request passes, matching an open deployment.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.config.admin_psk.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .map(|s| s.to_string());

    match provided {
        Some(key) if constant_time_compare(&key, expected) => next.run(request).await,
        Some(_) => AppError::Unauthorized("Invalid admin key".to_string()).into_response(),
        None => AppError::Unauthorized("Missing admin key".to_string()).into_response(),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
