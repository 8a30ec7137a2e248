//! REST API module.
//!
//! Contains all API routes and handlers, plus the extractors they share.

mod files;
mod public;
mod snippets;

pub use files::*;
pub use public::*;
pub use snippets::*;

use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::AppError;
use crate::AppState;

/// Response type for handlers answering 200 with a JSON body.
pub type ApiResult<T> = Result<Json<T>, AppError>;

/// 201 response wrapper for newly created resources.
#[derive(Debug)]
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

/// Plain confirmation body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyResponse {
    pub message: String,
    pub copy_count: u64,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub message: String,
    pub likes: u64,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub message: String,
    pub download_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub share_url: String,
}

/// Parse a path id the way clients send it; anything that is not a number matches nothing.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::NotFound(format!("{} {} not found", what, raw)))
}

/// Unwrap a JSON body, turning malformed or wrong-typed input into a 400.
pub(crate) fn json_body<T: DeserializeOwned>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// The network address of the caller, used to deduplicate likes and copies.
///
/// This is a weak identity: clients behind one address share it, and a client whose
/// address changes is counted again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl FromRequestParts<AppState> for ClientIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.config.trust_forwarded_for {
            let forwarded = parts
                .headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(address) = forwarded {
                return Ok(Self(address.to_string()));
            }
        }

        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| Self(addr.ip().to_canonical().to_string()))
            .ok_or_else(|| AppError::Internal("Client address unavailable".to_string()))
    }
}

/// Scheme and host that share URLs are built on.
#[derive(Debug, Clone)]
pub struct BaseUrl(pub String);

impl FromRequestParts<AppState> for BaseUrl {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(base) = &state.config.public_base_url {
            return Ok(Self(base.clone()));
        }

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing Host header".to_string()))?;

        let scheme = if state.config.trust_forwarded_for {
            parts
                .headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .filter(|p| *p == "http" || *p == "https")
                .unwrap_or("http")
        } else {
            "http"
        };

        Ok(Self(format!("{}://{}", scheme, host)))
    }
}
