//! Document store abstraction.
//!
//! Handlers never talk to MongoDB directly. They go through the
//! [`DocumentStore`] trait, which has two implementations:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │  Arc<dyn DocumentStore>
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │   MongoStore    │    │    MemoryStore      │
//! │  (production)   │    │ (tests, local dev)  │
//! └─────────────────┘    └─────────────────────┘
//! ```
//!
//! Every operation is a single round trip; there are no multi-document
//! transactions.

mod collection;
mod json;
mod memory;
mod mongo;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use serde::Serialize;

use crate::error::StoreError;

pub use collection::{Collection, EnrollmentList};
pub use json::{
    body_to_document, bson_to_json, document_to_json, json_kind, json_to_bson, parse_object_id,
    select_fields,
};
pub use memory::MemoryStore;
pub use mongo::{build_mongo_uri, MongoStore};

/// Outcome of an insert that may collide with a unique field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The document was stored under the new identifier.
    Inserted(ObjectId),
    /// Another document already holds the unique value; nothing was written.
    Conflict,
}

/// Match/modify counts returned by update operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateOutcome {
    /// Whether the filter matched any document.
    pub fn matched(&self) -> bool {
        self.matched_count > 0
    }
}

/// Operations the HTTP layer needs from a document store.
///
/// Implementations must be safe to share across all in-flight requests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in the collection, in natural (insertion) order.
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    /// The document with the given identifier, if any.
    async fn find_by_id(
        &self,
        collection: Collection,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError>;

    /// Insert a document and return its new identifier.
    ///
    /// Any `_id` already present in `doc` is replaced.
    async fn insert(&self, collection: Collection, doc: Document) -> Result<ObjectId, StoreError>;

    /// Insert a document unless another document already has the same
    /// value for `field`. The check and the write are atomic.
    async fn insert_unique(
        &self,
        collection: Collection,
        field: &str,
        doc: Document,
    ) -> Result<InsertOutcome, StoreError>;

    /// Overwrite the given top-level fields on one document (`$set`).
    async fn set_fields(
        &self,
        collection: Collection,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Append one value to an array field on one document (`$push`).
    ///
    /// A missing field is created as a one-element array.
    async fn push(
        &self,
        collection: Collection,
        id: ObjectId,
        field: &str,
        value: Bson,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Delete one document, returning how many were removed (0 or 1).
    async fn delete(&self, collection: Collection, id: ObjectId) -> Result<u64, StoreError>;

    /// Round-trip to the backend to verify it is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release backend resources. Called once after the server stops.
    async fn close(&self);

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}
