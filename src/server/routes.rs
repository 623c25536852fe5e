//! Router configuration for the course CMS.
//!
//! This module binds the generic handlers to each collection and applies
//! body limits, static file mounts, CORS and tracing.
//!
//! # Route Structure
//!
//! ```text
//! /                                  - Liveness banner
//! /health                            - Health check
//! /{collection}                      - List (GET), create (POST)
//! /{collection}/{id}                 - Fetch (GET), update (PUT)
//! /live-enroll/{id}                  - Also DELETE
//! /all-users/{id}/enrolled           - Read (GET), append (PUT)
//! /all-users/{id}/live_enroll        - Read (GET), append (PUT)
//! /upload-video                      - Multipart video upload
//! /upload/pdf                        - Multipart PDF upload
//! /delete-video                      - Remove an uploaded video
//! /uploads/*, /ebooks/*              - Uploaded media, served statically
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use course_cms::blob::LocalBlobStore;
//! use course_cms::server::{create_router, AppState, RouterConfig};
//! use course_cms::store::MemoryStore;
//!
//! let state = AppState::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(LocalBlobStore::new("uploads", "ebooks")),
//! );
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://admin.example.com".to_string()]);
//!
//! let router = create_router(state, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Path, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::debug;

use super::extract::JsonBody;
use super::handlers::{
    append_enrollment, create_document, create_user, delete_document, get_document,
    get_enrollments, health_handler, list_documents, root_handler, update_document, AppState,
};
use super::uploads::{delete_video, upload_pdf, upload_video};
use crate::blob::MediaKind;
use crate::config::DEFAULT_MAX_JSON_BODY;
use crate::store::{Collection, EnrollmentList};

/// Allowance for multipart boundaries and headers on top of the file cap.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Maximum JSON request body in bytes
    pub max_json_body: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - JSON bodies are capped at 16 MiB
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
            max_json_body: DEFAULT_MAX_JSON_BODY,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Set the JSON body limit in bytes.
    pub fn with_max_json_body(mut self, bytes: usize) -> Self {
        self.max_json_body = bytes;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Collection routes for every [`Collection`]
/// - User enrollment routes
/// - Upload routes with per-kind body limits
/// - Static mounts for media the blob store can serve from disk
/// - CORS configuration
/// - Request tracing (optional)
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler));

    for collection in Collection::ALL {
        router = router.merge(collection_routes(collection));
    }

    for list in [EnrollmentList::Recorded, EnrollmentList::Live] {
        router = router.route(
            &format!("/all-users/{{id}}/{}", list.route_segment()),
            get(move |state: State<AppState>, id: Path<String>| {
                get_enrollments(state, id, list)
            })
            .put(
                move |state: State<AppState>, id: Path<String>, body: JsonBody<Value>| {
                    append_enrollment(state, id, list, body)
                },
            ),
        );
    }

    let video_limit = upload_body_limit(state.blobs.max_bytes(MediaKind::Video));
    let pdf_limit = upload_body_limit(state.blobs.max_bytes(MediaKind::Pdf));
    let router = router
        .route("/upload-video", post(upload_video).layer(video_limit))
        .route("/upload/pdf", post(upload_pdf).layer(pdf_limit))
        .route("/delete-video", delete(delete_video));

    let mut router = router.with_state(state.clone());

    for kind in [MediaKind::Video, MediaKind::Pdf] {
        if let Some(root) = state.blobs.served_root(kind) {
            debug!(mount = kind.mount(), root = %root.display(), "Serving media directory");
            let static_routes = Router::new()
                .nest_service(kind.mount(), ServeDir::new(root))
                .layer(middleware::from_fn_with_state(kind, force_content_type));
            router = router.merge(static_routes);
        }
    }

    let router = router
        .layer(DefaultBodyLimit::max(config.max_json_body))
        .layer(build_cors_layer(&config));

    // Add tracing if enabled
    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// List, create, fetch and update routes for one collection.
fn collection_routes(collection: Collection) -> Router<AppState> {
    let base = format!("/{}", collection.name());
    let item = format!("/{}/{{id}}", collection.name());

    let list = get(move |state: State<AppState>| list_documents(state, collection));
    let list = if collection == Collection::Users {
        list.post(create_user)
    } else {
        list.post(move |state: State<AppState>, body: JsonBody<Value>| {
            create_document(state, collection, body)
        })
    };

    let by_id = get(move |state: State<AppState>, id: Path<String>| {
        get_document(state, id, collection)
    })
    .put(
        move |state: State<AppState>, id: Path<String>, body: JsonBody<Value>| {
            update_document(state, id, collection, body)
        },
    );
    let by_id = if collection.is_deletable() {
        by_id.delete(move |state: State<AppState>, id: Path<String>| {
            delete_document(state, id, collection)
        })
    } else {
        by_id
    };

    Router::new().route(&base, list).route(&item, by_id)
}

/// Body limit for an upload route: the file cap plus multipart framing.
fn upload_body_limit(file_limit: u64) -> DefaultBodyLimit {
    let limit = file_limit.saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

/// Override the guessed `Content-Type` for the kind's canonical extension.
async fn force_content_type(
    State(kind): State<MediaKind>,
    request: Request,
    next: Next,
) -> Response {
    let (extension, mime) = kind.forced_content_type();
    let forced = request
        .uri()
        .path()
        .to_ascii_lowercase()
        .ends_with(extension);

    let mut response = next.run(request).await;
    if forced && response.status().is_success() {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(mime));
    }
    response
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins).allow_credentials(true)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
