//! Public share-link routes outside `/api`.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};

use super::files::ensure_uploads_enabled;
use super::{parse_id, ApiResult};
use crate::errors::AppError;
use crate::models::{FileRecord, Snippet};
use crate::AppState;

/// GET /kode/:id/:slug - Resolve a snippet share link.
pub async fn open_shared_snippet(
    State(state): State<AppState>,
    Path((id, slug)): Path<(String, String)>,
) -> ApiResult<Snippet> {
    let id = parse_id(&id, "Snippet")?;
    Ok(Json(state.repo.get_snippet_by_slug(id, &slug).await?))
}

/// GET /files/:id/:slug - Resolve a file share link to its record.
pub async fn open_shared_file(
    State(state): State<AppState>,
    Path((id, slug)): Path<(String, String)>,
) -> ApiResult<FileRecord> {
    let id = parse_id(&id, "File")?;
    Ok(Json(state.repo.get_file_by_slug(id, &slug).await?))
}

/// GET /download/:id/:slug - Send the file content and count the download.
///
/// Content comes from the inline `file` payload when the record has one, otherwise
/// from the blob store.
pub async fn download_file(
    State(state): State<AppState>,
    Path((id, slug)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "File")?;
    let record = state.repo.get_file_by_slug(id, &slug).await?;

    let data = match record.file.as_deref() {
        Some(encoded) => decode_inline(id, encoded)?,
        None if record.filename.is_empty() => {
            return Err(AppError::NotFound(format!(
                "Stored content for file {} not found",
                id
            )));
        }
        None => {
            ensure_uploads_enabled(&state)?;
            state
                .repo
                .blobs()
                .read(&record.filename)
                .await?
                .ok_or_else(|| {
                    tracing::warn!("Blob for file {} is missing", id);
                    AppError::NotFound(format!("Stored content for file {} not found", id))
                })?
        }
    };

    state.repo.record_download(id).await?;

    let content_type = record.mimetype.clone().unwrap_or_else(|| {
        mime_guess::from_path(record.download_name())
            .first_or_octet_stream()
            .to_string()
    });
    let disposition = format!(
        "attachment; filename=\"{}\"",
        attachment_name(record.download_name())
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}

/// Decode an inline payload, with or without a `data:<mime>;base64,` prefix.
fn decode_inline(id: i64, encoded: &str) -> Result<Vec<u8>, AppError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    STANDARD.decode(payload.trim()).map_err(|e| {
        tracing::error!("Inline content of file {} is not valid base64: {}", id, e);
        AppError::Internal(format!("Inline content of file {} is unreadable: {}", id, e))
    })
}

/// Make a file name safe to place inside a quoted header parameter.
fn attachment_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim().is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}
