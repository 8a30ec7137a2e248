//! File API endpoints.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};

use super::{
    parse_id, ApiResult, BaseUrl, ClientIdentity, Created, DownloadResponse, LikeResponse,
    MessageResponse, ShareResponse,
};
use crate::db::Collection;
use crate::errors::AppError;
use crate::models::{FileRecord, NewFile, MAX_TITLE_CHARS};
use crate::storage::BlobStore;
use crate::AppState;

/// Name of the multipart field carrying the file bytes.
const FILE_FIELD: &str = "file";

/// GET /api/files - List all files.
pub async fn list_files(State(state): State<AppState>) -> ApiResult<Vec<FileRecord>> {
    Ok(Json(state.repo.list_files().await?))
}

/// GET /api/files/:id - Get a single file record.
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<FileRecord> {
    let id = parse_id(&id, "File")?;
    Ok(Json(state.repo.get_file(id).await?))
}

/// POST /api/files - Upload a file (multipart field `file`, optional `judul`).
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Created<FileRecord>, AppError> {
    ensure_uploads_enabled(&state)?;
    let mut multipart =
        multipart.map_err(|e| AppError::BadRequest(format!("Expected a multipart form: {}", e)))?;

    let mut judul: Option<String> = None;
    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            FILE_FIELD => {
                let originalname = field.file_name().unwrap_or("upload.bin").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                upload = Some((originalname, content_type, data.to_vec()));
            }
            "judul" => {
                let text = field.text().await.map_err(multipart_error)?;
                judul = Some(text);
            }
            _ => continue,
        }
    }

    let Some((originalname, content_type, data)) = upload else {
        return Err(AppError::Validation("A file is required".to_string()));
    };
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let judul = judul.filter(|j| !j.trim().is_empty());
    if let Some(j) = &judul {
        if j.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "judul must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }
    }

    let blobs = state.repo.blobs();
    let filename = BlobStore::stored_name(&originalname);
    let size = blobs.save(&filename, &data).await?;
    let mimetype = content_type.or_else(|| {
        mime_guess::from_path(&originalname)
            .first()
            .map(|m| m.to_string())
    });

    let new_file = NewFile {
        path: format!("{}/{}", blobs.prefix(), filename),
        filename: filename.clone(),
        originalname,
        judul,
        size,
        mimetype,
    };

    match state.repo.create_file(new_file).await {
        Ok(record) => {
            tracing::info!("Stored upload {} as {}", record.id, record.filename);
            Ok(Created(record))
        }
        Err(e) => {
            if let Err(cleanup) = blobs.remove(&filename).await {
                tracing::warn!("Failed to clean up blob {}: {}", filename, cleanup);
            }
            Err(e)
        }
    }
}

/// DELETE /api/files/:id - Delete a file record and its stored blob.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    let id = parse_id(&id, "File")?;
    state.repo.delete_file(id).await?;
    tracing::info!("Deleted file {}", id);

    Ok(Json(MessageResponse {
        message: "File deleted".to_string(),
    }))
}

/// POST /api/files/:id/like - Like a file, once per client.
pub async fn like_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ClientIdentity(client): ClientIdentity,
) -> ApiResult<LikeResponse> {
    let id = parse_id(&id, "File")?;
    let likes = state.repo.record_like(Collection::Files, id, &client).await?;

    Ok(Json(LikeResponse {
        message: "Like recorded".to_string(),
        likes,
        liked: true,
    }))
}

/// POST /api/files/:id/download - Count a download.
pub async fn count_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DownloadResponse> {
    let id = parse_id(&id, "File")?;
    let download_count = state.repo.record_download(id).await?;

    Ok(Json(DownloadResponse {
        message: "Download recorded".to_string(),
        download_count,
    }))
}

/// GET /api/files/:id/share - Build a shareable URL.
pub async fn share_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    BaseUrl(base): BaseUrl,
) -> ApiResult<ShareResponse> {
    let id = parse_id(&id, "File")?;
    let share_url = state.repo.share_url(Collection::Files, id, &base).await?;
    Ok(Json(ShareResponse { share_url }))
}

pub(crate) fn ensure_uploads_enabled(state: &AppState) -> Result<(), AppError> {
    if state.config.uploads_enabled {
        Ok(())
    } else {
        Err(AppError::NotImplemented(
            "File uploads are not enabled on this server".to_string(),
        ))
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Uploaded file is too large".to_string())
    } else {
        AppError::BadRequest(format!("Multipart error: {}", err))
    }
}
