//! Snippet API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{
    json_body, parse_id, ApiResult, BaseUrl, ClientIdentity, CopyResponse, Created, LikeResponse,
    MessageResponse, ShareResponse,
};
use crate::db::Collection;
use crate::errors::AppError;
use crate::models::{Comment, CreateCommentRequest, CreateSnippetRequest, Snippet};
use crate::AppState;

/// GET /api/kode - List all snippets.
pub async fn list_snippets(State(state): State<AppState>) -> ApiResult<Vec<Snippet>> {
    Ok(Json(state.repo.list_snippets().await?))
}

/// GET /api/kode/:id - Get a single snippet.
pub async fn get_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Snippet> {
    let id = parse_id(&id, "Snippet")?;
    Ok(Json(state.repo.get_snippet(id).await?))
}

/// POST /api/kode - Create a new snippet.
pub async fn create_snippet(
    State(state): State<AppState>,
    payload: Result<Json<CreateSnippetRequest>, JsonRejection>,
) -> Result<Created<Snippet>, AppError> {
    let request = json_body(payload)?;
    let (Some(judul), Some(kode)) = (request.judul, request.kode) else {
        return Err(AppError::Validation(
            "judul and kode are required".to_string(),
        ));
    };

    let snippet = state.repo.create_snippet(&judul, &kode).await?;
    tracing::info!("Created snippet {}", snippet.id);
    Ok(Created(snippet))
}

/// DELETE /api/kode/:id - Delete a snippet.
pub async fn delete_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    let id = parse_id(&id, "Snippet")?;
    state.repo.delete_snippet(id).await?;
    tracing::info!("Deleted snippet {}", id);

    Ok(Json(MessageResponse {
        message: "Snippet deleted".to_string(),
    }))
}

/// POST /api/kode/:id/copy - Count a copy, once per client.
pub async fn copy_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ClientIdentity(client): ClientIdentity,
) -> ApiResult<CopyResponse> {
    let id = parse_id(&id, "Snippet")?;
    let copy_count = state.repo.record_copy(id, &client).await?;

    Ok(Json(CopyResponse {
        message: "Copy recorded".to_string(),
        copy_count,
    }))
}

/// POST /api/kode/:id/like - Like a snippet, once per client.
pub async fn like_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ClientIdentity(client): ClientIdentity,
) -> ApiResult<LikeResponse> {
    let id = parse_id(&id, "Snippet")?;
    let likes = state.repo.record_like(Collection::Kode, id, &client).await?;

    Ok(Json(LikeResponse {
        message: "Like recorded".to_string(),
        likes,
        liked: true,
    }))
}

/// GET /api/kode/:id/comments - List comments in the order they were added.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Comment>> {
    let id = parse_id(&id, "Snippet")?;
    Ok(Json(state.repo.list_comments(id).await?))
}

/// POST /api/kode/:id/comments - Add a comment.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<Created<Comment>, AppError> {
    let id = parse_id(&id, "Snippet")?;
    let request = json_body(payload)?;
    let (Some(author), Some(text)) = (request.author, request.text) else {
        return Err(AppError::Validation(
            "author and text are required".to_string(),
        ));
    };

    let comment = state.repo.add_comment(id, &author, &text).await?;
    Ok(Created(comment))
}

/// GET /api/kode/:id/share - Build a shareable URL.
pub async fn share_snippet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    BaseUrl(base): BaseUrl,
) -> ApiResult<ShareResponse> {
    let id = parse_id(&id, "Snippet")?;
    let share_url = state.repo.share_url(Collection::Kode, id, &base).await?;
    Ok(Json(ShareResponse { share_url }))
}
