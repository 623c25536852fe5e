//! HTTP request handlers for the document collections.
//!
//! Every handler performs exactly one document store operation. Handlers are
//! written once and bound to a [`Collection`] when the router is built, so
//! `GET /all-courses` and `GET /all-ebooks` share [`list_documents`].
//!
//! # Endpoints
//!
//! - `GET /{collection}` - List all documents
//! - `GET /{collection}/{id}` - Fetch one document
//! - `POST /{collection}` - Insert a document
//! - `PUT /{collection}/{id}` - Overwrite allow-listed fields
//! - `DELETE /live-enroll/{id}` - Delete an enrollment
//! - `POST /all-users` - Insert a user unless the email is taken
//! - `GET|PUT /all-users/{id}/enrolled` - Read or append recorded enrollments
//! - `GET|PUT /all-users/{id}/live_enroll` - Read or append live enrollments

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::extract::JsonBody;
use crate::blob::BlobStore;
use crate::error::ApiError;
use crate::store::{
    body_to_document, bson_to_json, document_to_json, json_kind, json_to_bson, parse_object_id,
    select_fields, Collection, DocumentStore, EnrollmentList, InsertOutcome, UpdateOutcome,
};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// Both handles are created once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    /// Document store for all collections
    pub store: Arc<dyn DocumentStore>,

    /// Storage for uploaded media
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_id")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Insert acknowledgment, shaped like the driver's `InsertOneResult`.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertResponse {
    pub fn new(id: ObjectId) -> Self {
        Self {
            acknowledged: true,
            inserted_id: id.to_hex(),
        }
    }
}

/// A message, optionally with the store result that produced it.
#[derive(Debug, Serialize)]
pub struct MessageResponse<T: Serialize> {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl MessageResponse<()> {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            result: None,
        }
    }
}

impl<T: Serialize> MessageResponse<T> {
    pub fn with_result(message: impl Into<String>, result: T) -> Self {
        Self {
            message: message.into(),
            result: Some(result),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Document store backend in use
    pub store: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

impl ApiError {
    /// Status code and stable error identifier for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
            ApiError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "invalid_body"),
            ApiError::MissingFile(_) => (StatusCode::BAD_REQUEST, "missing_file"),
            ApiError::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "unsupported_file_type"),
            ApiError::InvalidPath(_) => (StatusCode::BAD_REQUEST, "invalid_path"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::PayloadTooLarge { .. } | ApiError::BodyTooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
            }
            ApiError::Store(_) | ApiError::Blob(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

/// Convert ApiError to HTTP response.
///
/// 5xx errors are logged at ERROR, 404s at DEBUG and other 4xx at WARN.
/// Server errors keep their diagnostic message in the body.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Validate a path identifier before it reaches the store.
pub fn require_object_id(raw: &str) -> Result<ObjectId, ApiError> {
    parse_object_id(raw).ok_or_else(|| ApiError::InvalidIdentifier(raw.to_string()))
}

fn not_found(collection: Collection, id: &ObjectId) -> ApiError {
    ApiError::NotFound(format!("{} not found: {}", collection.label(), id))
}

fn require_object(body: Value) -> Result<serde_json::Map<String, Value>, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::InvalidBody(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

// =============================================================================
// Collection Handlers
// =============================================================================

/// `GET /{collection}` - every document, in natural order, unpaginated.
pub async fn list_documents(
    State(state): State<AppState>,
    collection: Collection,
) -> Result<Json<Vec<Value>>, ApiError> {
    let docs = state.store.list(collection).await?;
    debug!(collection = collection.name(), count = docs.len(), "Listed documents");
    Ok(Json(docs.into_iter().map(document_to_json).collect()))
}

/// `GET /{collection}/{id}`
///
/// # Errors
///
/// - `400 Bad Request`: `id` is not a valid ObjectId
/// - `404 Not Found`: no document has that id
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    collection: Collection,
) -> Result<Json<Value>, ApiError> {
    let id = require_object_id(&id)?;
    let doc = state
        .store
        .find_by_id(collection, id)
        .await?
        .ok_or_else(|| not_found(collection, &id))?;
    Ok(Json(document_to_json(doc)))
}

/// `POST /{collection}` - insert the body as a new document.
///
/// The body must be a JSON object; it is stored as-is apart from any `_id`,
/// which the store always assigns. Enrollments answer `201 Created` with a
/// message envelope, everything else `200 OK` with the bare acknowledgment.
pub async fn create_document(
    State(state): State<AppState>,
    collection: Collection,
    JsonBody(body): JsonBody<Value>,
) -> Result<Response, ApiError> {
    let doc = body_to_document(body).map_err(|e| ApiError::InvalidBody(e.to_string()))?;
    let id = state.store.insert(collection, doc).await?;
    info!(collection = collection.name(), id = %id, "Inserted document");

    let ack = InsertResponse::new(id);
    let response = if collection == Collection::LiveEnrollments {
        (
            StatusCode::CREATED,
            Json(MessageResponse::with_result("Enrollment successful", ack)),
        )
            .into_response()
    } else {
        Json(ack).into_response()
    };
    Ok(response)
}

/// `POST /all-users` - insert a user unless the email is already registered.
///
/// The existence check and the insert are a single atomic store operation,
/// so two concurrent signups with one email store exactly one user. A
/// duplicate is not an error: it answers `200 OK` with
/// `{"message": "account already exist"}` and writes nothing.
///
/// # Errors
///
/// - `400 Bad Request`: body is not an object or has no string `email`
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Response, ApiError> {
    let collection = Collection::Users;
    let field = collection.unique_field().unwrap_or("email");

    match body.get(field) {
        Some(Value::String(email)) if !email.trim().is_empty() => {}
        _ => {
            return Err(ApiError::InvalidBody(format!(
                "a non-empty string '{}' is required",
                field
            )))
        }
    }

    let doc = body_to_document(body).map_err(|e| ApiError::InvalidBody(e.to_string()))?;
    match state.store.insert_unique(collection, field, doc).await? {
        InsertOutcome::Inserted(id) => {
            info!(collection = collection.name(), id = %id, "Registered user");
            Ok(Json(InsertResponse::new(id)).into_response())
        }
        InsertOutcome::Conflict => {
            debug!(collection = collection.name(), "User already registered");
            Ok(Json(MessageResponse::text("account already exist")).into_response())
        }
    }
}

/// `PUT /{collection}/{id}` - overwrite allow-listed fields.
///
/// Only fields named by [`Collection::updatable_fields`] are copied from the
/// body; everything else, including `_id`, is dropped. Allow-listed fields
/// absent from the body keep their stored values.
///
/// # Errors
///
/// - `400 Bad Request`: invalid id, non-object body, or no updatable field
/// - `404 Not Found`: no document has that id
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    collection: Collection,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<MessageResponse<UpdateOutcome>>, ApiError> {
    let id = require_object_id(&id)?;
    let body = require_object(body)?;

    let allowed = collection.updatable_fields();
    let fields = select_fields(&body, allowed);
    if fields.is_empty() {
        return Err(ApiError::InvalidBody(format!(
            "no updatable fields supplied (allowed: {})",
            allowed.join(", ")
        )));
    }

    let outcome = state.store.set_fields(collection, id, fields).await?;
    if !outcome.matched() {
        return Err(not_found(collection, &id));
    }

    debug!(
        collection = collection.name(),
        id = %id,
        modified = outcome.modified_count,
        "Updated document"
    );
    Ok(Json(MessageResponse::with_result(
        format!("{} updated successfully", collection.label()),
        outcome,
    )))
}

/// `DELETE /{collection}/{id}` - remove exactly one document.
///
/// # Errors
///
/// - `400 Bad Request`: invalid id
/// - `404 Not Found`: nothing was deleted
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    collection: Collection,
) -> Result<Json<MessageResponse<()>>, ApiError> {
    let id = require_object_id(&id)?;
    let deleted = state.store.delete(collection, id).await?;
    if deleted != 1 {
        return Err(not_found(collection, &id));
    }

    info!(collection = collection.name(), id = %id, "Deleted document");
    Ok(Json(MessageResponse::text(format!(
        "{} deleted successfully",
        collection.label()
    ))))
}

// =============================================================================
// User Enrollment Handlers
// =============================================================================

/// `GET /all-users/{id}/{list}` - the embedded sequence, or `[]` if unset.
pub async fn get_enrollments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    list: EnrollmentList,
) -> Result<Json<Value>, ApiError> {
    let id = require_object_id(&id)?;
    let mut user = state
        .store
        .find_by_id(Collection::Users, id)
        .await?
        .ok_or_else(|| not_found(Collection::Users, &id))?;

    let entries = user
        .remove(list.field())
        .map(bson_to_json)
        .unwrap_or_else(|| Value::Array(Vec::new()));
    Ok(Json(entries))
}

/// `PUT /all-users/{id}/{list}` - append the body to the embedded sequence.
///
/// The append is a single atomic push; existing entries are never touched.
///
/// # Errors
///
/// - `400 Bad Request`: invalid id
/// - `404 Not Found`: no user has that id (nothing is created)
pub async fn append_enrollment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    list: EnrollmentList,
    JsonBody(entry): JsonBody<Value>,
) -> Result<Json<MessageResponse<UpdateOutcome>>, ApiError> {
    let id = require_object_id(&id)?;
    let outcome = state
        .store
        .push(Collection::Users, id, list.field(), json_to_bson(entry))
        .await?;
    if !outcome.matched() {
        return Err(not_found(Collection::Users, &id));
    }

    debug!(user = %id, list = list.field(), "Appended enrollment");
    Ok(Json(MessageResponse::with_result(
        "Enrollment updated successfully",
        outcome,
    )))
}

// =============================================================================
// Service Handlers
// =============================================================================

/// `GET /` - plain-text liveness banner.
pub async fn root_handler() -> &'static str {
    " server in running "
}

/// `GET /health`
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "store": "mongodb"
/// }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.store.backend().to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
