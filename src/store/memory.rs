//! In-process document store.
//!
//! Holds every collection in memory behind a single `RwLock`. Used by the
//! test suite and by `serve --memory-store` for local development without a
//! MongoDB deployment. Contents are lost when the process exits.

use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;

use crate::error::StoreError;

use super::{Collection, DocumentStore, InsertOutcome, UpdateOutcome};

/// Document store backed by in-memory vectors, one per collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in a collection.
    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// Return `doc` with a fresh `_id` as its first field.
fn with_new_id(mut doc: Document) -> (ObjectId, Document) {
    let id = ObjectId::new();
    doc.remove("_id");
    let mut stored = Document::new();
    stored.insert("_id", id);
    for (key, value) in doc {
        stored.insert(key, value);
    }
    (id, stored)
}

fn has_id(doc: &Document, id: &ObjectId) -> bool {
    doc.get_object_id("_id").map(|v| v == *id).unwrap_or(false)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| has_id(doc, &id)).cloned()))
    }

    async fn insert(&self, collection: Collection, doc: Document) -> Result<ObjectId, StoreError> {
        let (id, stored) = with_new_id(doc);
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(stored);
        Ok(id)
    }

    async fn insert_unique(
        &self,
        collection: Collection,
        field: &str,
        doc: Document,
    ) -> Result<InsertOutcome, StoreError> {
        // Hold the write lock across the check and the push so concurrent
        // inserts of the same value serialize here.
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        // Only string values are constrained, matching the partial unique
        // index the Mongo backend creates.
        if let Some(Bson::String(value)) = doc.get(field) {
            let taken = docs
                .iter()
                .any(|existing| matches!(existing.get(field), Some(Bson::String(v)) if v == value));
            if taken {
                return Ok(InsertOutcome::Conflict);
            }
        }

        let (id, stored) = with_new_id(doc);
        docs.push(stored);
        Ok(InsertOutcome::Inserted(id))
    }

    async fn set_fields(
        &self,
        collection: Collection,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| has_id(doc, &id)))
        else {
            return Ok(UpdateOutcome::default());
        };

        let mut modified = false;
        for (key, value) in fields {
            if doc.get(&key) != Some(&value) {
                modified = true;
                doc.insert(key, value);
            }
        }

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn push(
        &self,
        collection: Collection,
        id: ObjectId,
        field: &str,
        value: Bson,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| has_id(doc, &id)))
        else {
            return Ok(UpdateOutcome::default());
        };

        match doc.get_mut(field) {
            Some(Bson::Array(items)) => items.push(value),
            None => {
                doc.insert(field, vec![value]);
            }
            Some(_) => {
                return Err(StoreError::Database(format!(
                    "The field '{}' must be an array",
                    field
                )))
            }
        }

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: 1,
        })
    }

    async fn delete(&self, collection: Collection, id: ObjectId) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        match docs.iter().position(|doc| has_id(doc, &id)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}

    fn backend(&self) -> &'static str {
        "memory"
    }
}
