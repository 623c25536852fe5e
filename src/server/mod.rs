//! HTTP server layer for the course CMS.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   /{collection}[/{id}]   /all-users/{id}/...   /upload-*        │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │   uploads   │  │        routes           │  │
//! │  │   (CRUD)    │  │ (multipart) │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                  │
//!            ▼                  ▼
//!     DocumentStore         BlobStore
//! ```

pub mod extract;
pub mod handlers;
pub mod routes;
pub mod uploads;

pub use extract::JsonBody;
pub use handlers::{
    health_handler, AppState, ErrorResponse, HealthResponse, InsertResponse, MessageResponse,
};
pub use routes::{create_router, RouterConfig};
pub use uploads::{video_key_from_url, PdfUploadResponse, VideoUploadResponse};
