//! Media upload and deletion handlers.
//!
//! # Endpoints
//!
//! - `POST /upload-video` - Store the multipart field `file`
//! - `POST /upload/pdf` - Store the multipart field `pdf` (`.pdf` only)
//! - `DELETE /delete-video` - Remove a previously uploaded video by URL

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::blob::{extension_of, generate_key, is_plain_key, MediaKind};
use crate::error::{ApiError, BlobError};

use super::extract::JsonBody;
use super::handlers::{AppState, MessageResponse};

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct VideoUploadResponse {
    /// Served path of the stored video
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfUploadResponse {
    pub message: String,

    /// Served path of the stored PDF
    pub file_path: String,
}

// =============================================================================
// Upload Handlers
// =============================================================================

/// `POST /upload-video`
///
/// Streams the `file` field to the blob store under a fresh key. Any file
/// type is accepted.
///
/// # Errors
///
/// - `400 Bad Request`: no `file` field
/// - `413 Payload Too Large`: more than 5 GiB
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<VideoUploadResponse>, ApiError> {
    let key = receive_upload(&state, MediaKind::Video, multipart).await?;
    Ok(Json(VideoUploadResponse {
        url: MediaKind::Video.served_path(&key),
    }))
}

/// `POST /upload/pdf`
///
/// # Errors
///
/// - `400 Bad Request`: no `pdf` field, or its file name does not end in
///   `.pdf` (case-insensitive); nothing is written in that case
/// - `413 Payload Too Large`: more than 100 MiB
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PdfUploadResponse>, ApiError> {
    let key = receive_upload(&state, MediaKind::Pdf, multipart).await?;
    Ok(Json(PdfUploadResponse {
        message: "PDF uploaded successfully".to_string(),
        file_path: MediaKind::Pdf.served_path(&key),
    }))
}

/// Find the file part for `kind` and stream it into the blob store.
///
/// Parts with another name, and plain form values without a file name, are
/// skipped. Returns the generated key.
async fn receive_upload(
    state: &AppState,
    kind: MediaKind,
    mut multipart: Multipart,
) -> Result<String, ApiError> {
    let limit = state.blobs.max_bytes(kind);
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::from(multipart_error(err, limit)))?
    {
        if field.name() != Some(kind.form_field()) {
            continue;
        }
        let Some(original) = field.file_name().map(str::to_string) else {
            continue;
        };
        if kind == MediaKind::Pdf {
            let extension = extension_of(&original);
            if !extension.eq_ignore_ascii_case(".pdf") {
                return Err(ApiError::UnsupportedFileType(if extension.is_empty() {
                    original
                } else {
                    extension
                }));
            }
        }

        let key = generate_key(&original);
        let body = field
            .map(move |chunk| chunk.map_err(|err| multipart_error(err, limit)))
            .boxed();
        let bytes = state.blobs.put(kind, &key, body).await?;

        info!(
            kind = ?kind,
            key = %key,
            original = %original,
            bytes,
            "Stored upload"
        );
        return Ok(key);
    }

    Err(ApiError::MissingFile(kind.form_field()))
}

/// The request body limit surfaces as a multipart error; keep it a 413.
fn multipart_error(err: MultipartError, limit: u64) -> BlobError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        BlobError::TooLarge { limit }
    } else {
        BlobError::Body(err.body_text())
    }
}

// =============================================================================
// Deletion
// =============================================================================

/// `DELETE /delete-video`
///
/// The body carries the URL handed out by `/upload-video`, either absolute
/// (`http://host/uploads/<key>`) or as the served path (`/uploads/<key>`).
///
/// # Errors
///
/// - `400 Bad Request`: missing `url` (including an empty or non-JSON body),
///   a path outside `/uploads/`, or a key that is not a single file name
/// - `404 Not Found`: no such file
pub async fn delete_video(
    State(state): State<AppState>,
    body: Result<JsonBody<Value>, ApiError>,
) -> Result<Json<MessageResponse<()>>, ApiError> {
    let body = match body {
        Ok(JsonBody(body)) => body,
        Err(ApiError::InvalidBody(_)) => Value::Null,
        Err(err) => return Err(err),
    };
    let raw = body
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::InvalidPath("missing 'url'".to_string()))?;

    let key = video_key_from_url(raw)?;
    state.blobs.delete(MediaKind::Video, &key).await?;

    info!(key = %key, "Deleted video");
    Ok(Json(MessageResponse::text("Video deleted successfully")))
}

/// Extract the storage key from a video URL or served path.
pub fn video_key_from_url(raw: &str) -> Result<String, ApiError> {
    let invalid = || ApiError::InvalidPath(raw.to_string());

    let path = match url::Url::parse(raw) {
        Ok(parsed) => parsed.path().to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
        Err(_) => return Err(invalid()),
    };

    let prefix = format!("{}/", MediaKind::Video.mount());
    let encoded = path.strip_prefix(&prefix).ok_or_else(invalid)?;
    let key = urlencoding::decode(encoded).map_err(|_| invalid())?;

    if !is_plain_key(&key) {
        return Err(invalid());
    }
    Ok(key.into_owned())
}
