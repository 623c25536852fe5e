//! # Course CMS
//!
//! A REST backend for a course platform's content: recorded courses, live
//! courses, ebooks, users and their enrollments, session recordings and
//! homepage banners, plus upload and serving of lecture videos and ebook
//! PDFs.
//!
//! ## Features
//!
//! - **Uniform collection API**: list, fetch, create and allow-listed update
//!   for every collection, with ObjectId validation on every id route
//! - **Atomic signup**: user emails are unique at the store, not by
//!   check-then-insert
//! - **Streaming uploads**: multipart files stream straight to the blob store
//!   with per-kind size caps and path containment on delete
//! - **Pluggable backends**: MongoDB or an in-memory store behind one trait
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`store`] - Document store trait, MongoDB and in-memory backends
//! - [`blob`] - Blob store trait and local-disk backend for uploads
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types for each layer
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use course_cms::{create_router, AppState, LocalBlobStore, MemoryStore, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = AppState::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(LocalBlobStore::new("uploads", "ebooks")),
//!     );
//!     let router = create_router(state, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod blob;
pub mod config;
pub mod error;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use blob::{BlobStore, LocalBlobStore, MediaKind};
pub use config::{CheckConfig, Cli, Command, MediaConfig, ServeConfig, StoreConfig};
pub use error::{ApiError, BlobError, StoreError};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
pub use store::{
    Collection, DocumentStore, EnrollmentList, InsertOutcome, MemoryStore, MongoStore,
    UpdateOutcome,
};
