//! MongoDB-backed document store.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Database, IndexModel};
use tracing::{debug, info};

use crate::error::StoreError;

use super::{Collection, DocumentStore, InsertOutcome, UpdateOutcome};

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Build a connection string from credentials and a cluster host.
///
/// The result targets an SRV record, so `cluster` should be the bare host
/// name (e.g. `cluster0.example.mongodb.net`).
pub fn build_mongo_uri(user: &str, password: &str, cluster: &str, app_name: &str) -> String {
    format!(
        "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority&appName={}",
        urlencoding::encode(user),
        urlencoding::encode(password),
        cluster,
        urlencoding::encode(app_name)
    )
}

/// Document store backed by a single shared MongoDB client.
///
/// The driver pools connections internally; clones of the client share that
/// pool, so one `MongoStore` serves every request.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connect to `uri` and select database `db_name`.
    ///
    /// Uses the Stable API v1 in strict mode. The driver connects lazily, so
    /// call [`DocumentStore::ping`] to verify reachability.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
        let db = client.database(db_name);
        Ok(Self { client, db })
    }

    /// Create the indexes the application relies on.
    ///
    /// The unique index on `all-users.email` is partial (string values only)
    /// so documents without an email never collide with each other.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            let Some(field) = collection.unique_field() else {
                continue;
            };
            let options = IndexOptions::builder()
                .unique(true)
                .name(format!("{}_unique", field))
                .partial_filter_expression(doc! { field: { "$type": "string" } })
                .build();
            let model = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(options)
                .build();
            self.db
                .collection::<Document>(collection.name())
                .create_index(model)
                .await
                .map_err(|err| {
                    if is_duplicate_key(&err) {
                        StoreError::Database(format!(
                            "cannot build unique index on '{}.{}': existing documents share a value ({})",
                            collection.name(),
                            field,
                            err
                        ))
                    } else {
                        store_error(err)
                    }
                })?;
            info!(collection = collection.name(), field, "Unique index ensured");
        }
        Ok(())
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.db.collection(collection.name())
    }
}

fn store_error(err: MongoError) -> StoreError {
    match *err.kind {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
            StoreError::Connection(err.to_string())
        }
        ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
            StoreError::Encoding(err.to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}

/// Duplicate key from an insert (write error) or an index build (command error).
fn is_duplicate_key(err: &MongoError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(ref command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn inserted_id(id: Bson) -> Result<ObjectId, StoreError> {
    id.as_object_id()
        .ok_or_else(|| StoreError::Encoding(format!("unexpected inserted id: {}", id)))
}

/// Copy `doc` with a fresh `_id` so the driver never reuses a client value.
fn with_new_id(mut doc: Document) -> Document {
    doc.remove("_id");
    let mut stored = doc! { "_id": ObjectId::new() };
    for (key, value) in doc {
        stored.insert(key, value);
    }
    stored
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let cursor = self
            .collection(collection)
            .find(doc! {})
            .await
            .map_err(store_error)?;
        cursor.try_collect().await.map_err(store_error)
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError> {
        self.collection(collection)
            .find_one(doc! { "_id": id })
            .await
            .map_err(store_error)
    }

    async fn insert(&self, collection: Collection, doc: Document) -> Result<ObjectId, StoreError> {
        let result = self
            .collection(collection)
            .insert_one(with_new_id(doc))
            .await
            .map_err(store_error)?;
        inserted_id(result.inserted_id)
    }

    async fn insert_unique(
        &self,
        collection: Collection,
        field: &str,
        doc: Document,
    ) -> Result<InsertOutcome, StoreError> {
        // Relies on the unique index from `ensure_indexes`; the server rejects
        // the second of two racing inserts with a duplicate key error.
        match self.collection(collection).insert_one(with_new_id(doc)).await {
            Ok(result) => inserted_id(result.inserted_id).map(InsertOutcome::Inserted),
            Err(err) if is_duplicate_key(&err) => {
                debug!(collection = collection.name(), field, "Duplicate key on insert");
                Ok(InsertOutcome::Conflict)
            }
            Err(err) => Err(store_error(err)),
        }
    }

    async fn set_fields(
        &self,
        collection: Collection,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await
            .map_err(store_error)?;
        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn push(
        &self,
        collection: Collection,
        id: ObjectId,
        field: &str,
        value: Bson,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": id }, doc! { "$push": { field: value } })
            .await
            .map_err(store_error)?;
        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete(&self, collection: Collection, id: ObjectId) -> Result<u64, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id })
            .await
            .map_err(store_error)?;
        Ok(result.deleted_count)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(store_error)
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        info!("MongoDB client shut down");
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}
