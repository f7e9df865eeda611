use async_trait::async_trait;
use bson::{Bson, Document};

use crate::{Collection, DeleteResult, DocumentId, InsertResult, Result, UpdateResult};

/// Core trait for document store implementations.
///
/// A single store handle is shared by every request; implementations must
/// be thread-safe (Send + Sync) and cheap to clone behind the handle.
/// No operation spans more than one document-store round trip, and there
/// is no cross-operation transaction.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document, generating an `_id` when the document has none.
    ///
    /// Fails with `DuplicateKey` if a unique field registered through
    /// [`DocumentStore::ensure_unique`] already holds the same value.
    async fn insert_one(&self, collection: Collection, document: Document) -> Result<InsertResult>;

    /// Returns every document in the collection, in insertion order.
    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>>;

    /// Returns the document with the given id, if any.
    async fn find_by_id(&self, collection: Collection, id: DocumentId) -> Result<Option<Document>>;

    /// Returns the first document whose top-level `field` equals `value`.
    ///
    /// A `Null` value matches documents where the field is missing.
    async fn find_one_where(
        &self,
        collection: Collection,
        field: &str,
        value: Bson,
    ) -> Result<Option<Document>>;

    /// Deletes the document with the given id. Deleting a missing id is a no-op.
    async fn delete_by_id(&self, collection: Collection, id: DocumentId) -> Result<DeleteResult>;

    /// Deletes every document in the collection.
    async fn delete_all(&self, collection: Collection) -> Result<DeleteResult>;

    /// Merges `fields` into the document with the given id.
    ///
    /// When no document matches, a new one is created at that id (upsert).
    /// An `_id` key inside `fields` is ignored.
    async fn upsert_fields(
        &self,
        collection: Collection,
        id: DocumentId,
        fields: Document,
    ) -> Result<UpdateResult>;

    /// Registers a uniqueness constraint on a top-level field.
    async fn ensure_unique(&self, collection: Collection, field: &str) -> Result<()>;

    /// Round-trips to the backing store to confirm it is reachable.
    async fn ping(&self) -> Result<()>;

    /// Releases the connection. Called once, after the server has drained.
    async fn shutdown(&self) {}
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Checks if any document has `field == value`.
    async fn exists_where(&self, collection: Collection, field: &str, value: Bson) -> Result<bool> {
        Ok(self
            .find_one_where(collection, field, value)
            .await?
            .is_some())
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}

/// Drops any `_id` key from an update payload; ids are immutable.
pub(crate) fn strip_id(mut fields: Document) -> Document {
    fields.remove(crate::document::ID_FIELD);
    fields
}
