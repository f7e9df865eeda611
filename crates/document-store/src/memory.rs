use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use tokio::sync::RwLock;

use crate::document::{ID_FIELD, apply_set, field_matches, unique_key, values_equal};
use crate::store::{DocumentStore, strip_id};
use crate::{
    Collection, DeleteResult, DocumentId, DocumentStoreError, InsertResult, Result, UpdateResult,
};

/// In-memory document store implementation for testing and local runs.
///
/// Provides the same interface and write semantics as the MongoDB
/// implementation. Unique constraints are checked under the collection
/// write lock, so concurrent inserts cannot both pass.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
    unique_fields: Arc<RwLock<HashMap<Collection, Vec<String>>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents in a collection.
    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }

    async fn unique_fields_for(&self, collection: Collection) -> Vec<String> {
        let mut fields = vec![ID_FIELD.to_string()];
        if let Some(extra) = self.unique_fields.read().await.get(&collection) {
            fields.extend(extra.iter().cloned());
        }
        fields
    }
}

/// Returns the first unique field on which `candidate` collides with another
/// document. The document at `skip` (the one being updated) is ignored.
fn find_collision(
    documents: &[Document],
    candidate: &Document,
    unique_fields: &[String],
    skip: Option<usize>,
) -> Option<String> {
    unique_fields
        .iter()
        .find(|field| {
            let key = unique_key(candidate, field);
            documents
                .iter()
                .enumerate()
                .filter(|(idx, _)| Some(*idx) != skip)
                .any(|(_, existing)| values_equal(&unique_key(existing, field), &key))
        })
        .cloned()
}

fn id_filter(id: DocumentId) -> Bson {
    Bson::from(id)
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert_one(&self, collection: Collection, document: Document) -> Result<InsertResult> {
        let unique_fields = self.unique_fields_for(collection).await;

        let mut stored = Document::new();
        if !document.contains_key(ID_FIELD) {
            stored.insert(ID_FIELD, ObjectId::new());
        }
        stored.extend(document);

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();

        if let Some(field) = find_collision(documents, &stored, &unique_fields, None) {
            return Err(DocumentStoreError::DuplicateKey { collection, field });
        }

        let inserted_id = stored.get(ID_FIELD).cloned().unwrap_or(Bson::Null);
        documents.push(stored);
        Ok(InsertResult::new(inserted_id))
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(&self, collection: Collection, id: DocumentId) -> Result<Option<Document>> {
        self.find_one_where(collection, ID_FIELD, id_filter(id)).await
    }

    async fn find_one_where(
        &self,
        collection: Collection,
        field: &str,
        value: Bson,
    ) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).and_then(|documents| {
            documents
                .iter()
                .find(|d| field_matches(d, field, &value))
                .cloned()
        }))
    }

    async fn delete_by_id(&self, collection: Collection, id: DocumentId) -> Result<DeleteResult> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(DeleteResult::new(0));
        };

        let target = id_filter(id);
        match documents
            .iter()
            .position(|d| field_matches(d, ID_FIELD, &target))
        {
            Some(idx) => {
                documents.remove(idx);
                Ok(DeleteResult::new(1))
            }
            None => Ok(DeleteResult::new(0)),
        }
    }

    async fn delete_all(&self, collection: Collection) -> Result<DeleteResult> {
        let mut collections = self.collections.write().await;
        let removed = collections
            .get_mut(&collection)
            .map(std::mem::take)
            .unwrap_or_default();
        Ok(DeleteResult::new(removed.len() as u64))
    }

    async fn upsert_fields(
        &self,
        collection: Collection,
        id: DocumentId,
        fields: Document,
    ) -> Result<UpdateResult> {
        let fields = strip_id(fields);
        let unique_fields = self.unique_fields_for(collection).await;
        let target = id_filter(id);

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();

        let Some(idx) = documents
            .iter()
            .position(|d| field_matches(d, ID_FIELD, &target))
        else {
            let mut created = Document::new();
            created.insert(ID_FIELD, target.clone());
            apply_set(&mut created, fields)?;
            if let Some(field) = find_collision(documents, &created, &unique_fields, None) {
                return Err(DocumentStoreError::DuplicateKey { collection, field });
            }
            documents.push(created);
            return Ok(UpdateResult::upserted(target));
        };

        let mut updated = documents[idx].clone();
        let modified = apply_set(&mut updated, fields)?;

        if modified {
            if let Some(field) = find_collision(documents, &updated, &unique_fields, Some(idx)) {
                return Err(DocumentStoreError::DuplicateKey { collection, field });
            }
            documents[idx] = updated;
        }

        Ok(UpdateResult::matched(modified))
    }

    async fn ensure_unique(&self, collection: Collection, field: &str) -> Result<()> {
        let collections = self.collections.read().await;
        let mut unique_fields = self.unique_fields.write().await;
        let fields = unique_fields.entry(collection).or_default();
        if fields.iter().any(|f| f == field) {
            return Ok(());
        }

        // Existing duplicates make the constraint impossible to install.
        if let Some(documents) = collections.get(&collection) {
            let mut seen = Vec::with_capacity(documents.len());
            for document in documents {
                let key = unique_key(document, field);
                if seen.iter().any(|s| values_equal(s, &key)) {
                    return Err(DocumentStoreError::DuplicateKey {
                        collection,
                        field: field.to_string(),
                    });
                }
                seen.push(key);
            }
        }

        fields.push(field.to_string());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentStoreExt;
    use bson::doc;

    fn product(name: &str) -> Document {
        doc! { "name": name, "price": 10_i64 }
    }

    fn cart_item(name: &str) -> Document {
        doc! { "productName": name, "quantity": 1_i64 }
    }

    fn inserted_id(result: &InsertResult) -> DocumentId {
        result.inserted_id.as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn insert_generates_object_id_first() {
        let store = InMemoryDocumentStore::new();
        let result = store
            .insert_one(Collection::Products, product("Widget"))
            .await
            .unwrap();
        assert!(result.acknowledged);

        let all = store.find_all(Collection::Products).await.unwrap();
        assert_eq!(all.len(), 1);
        let first_key = all[0].keys().next().unwrap();
        assert_eq!(first_key, ID_FIELD);
        assert_eq!(
            all[0].get_object_id(ID_FIELD).unwrap(),
            inserted_id(&result).as_object_id()
        );
        assert_eq!(all[0].get_str("name").unwrap(), "Widget");
    }

    #[tokio::test]
    async fn insert_keeps_client_supplied_id() {
        let store = InMemoryDocumentStore::new();
        let result = store
            .insert_one(Collection::Products, doc! { "_id": "custom", "name": "x" })
            .await
            .unwrap();
        assert_eq!(result.inserted_id, serde_json::json!("custom"));

        let again = store
            .insert_one(Collection::Products, doc! { "_id": "custom" })
            .await;
        assert!(matches!(
            again,
            Err(DocumentStoreError::DuplicateKey { ref field, .. }) if field == ID_FIELD
        ));
    }

    #[tokio::test]
    async fn find_all_preserves_insertion_order() {
        let store = InMemoryDocumentStore::new();
        for name in ["a", "b", "c"] {
            store
                .insert_one(Collection::Products, product(name))
                .await
                .unwrap();
        }

        let names: Vec<_> = store
            .find_all(Collection::Products)
            .await
            .unwrap()
            .iter()
            .map(|d| d.get_str("name").unwrap().to_string())
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn collections_are_independent() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_one(Collection::Products, product("a"))
            .await
            .unwrap();

        assert!(store.find_all(Collection::Cart).await.unwrap().is_empty());
        assert_eq!(store.count(Collection::Products).await, 1);
    }

    #[tokio::test]
    async fn find_by_id_missing_returns_none() {
        let store = InMemoryDocumentStore::new();
        let found = store
            .find_by_id(Collection::PromoCodes, DocumentId::new())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn find_one_where_matches_field() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_one(Collection::Cart, cart_item("Shoe"))
            .await
            .unwrap();

        assert!(
            store
                .exists_where(Collection::Cart, "productName", Bson::from("Shoe"))
                .await
                .unwrap()
        );
        assert!(
            !store
                .exists_where(Collection::Cart, "productName", Bson::from("Hat"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn delete_by_id_missing_is_noop() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_one(Collection::Cart, cart_item("Shoe"))
            .await
            .unwrap();

        let result = store
            .delete_by_id(Collection::Cart, DocumentId::new())
            .await
            .unwrap();
        assert_eq!(result.deleted_count, 0);
        assert_eq!(store.count(Collection::Cart).await, 1);
    }

    #[tokio::test]
    async fn delete_by_id_removes_document() {
        let store = InMemoryDocumentStore::new();
        let inserted = store
            .insert_one(Collection::Cart, cart_item("Shoe"))
            .await
            .unwrap();

        let result = store
            .delete_by_id(Collection::Cart, inserted_id(&inserted))
            .await
            .unwrap();
        assert_eq!(result.deleted_count, 1);
        assert_eq!(store.count(Collection::Cart).await, 0);
    }

    #[tokio::test]
    async fn delete_all_empties_collection() {
        let store = InMemoryDocumentStore::new();
        for name in ["a", "b", "c"] {
            store
                .insert_one(Collection::Cart, cart_item(name))
                .await
                .unwrap();
        }

        let result = store.delete_all(Collection::Cart).await.unwrap();
        assert_eq!(result.deleted_count, 3);
        assert_eq!(store.count(Collection::Cart).await, 0);

        let again = store.delete_all(Collection::Cart).await.unwrap();
        assert_eq!(again.deleted_count, 0);
    }

    #[tokio::test]
    async fn upsert_merges_into_existing_document() {
        let store = InMemoryDocumentStore::new();
        let inserted = store
            .insert_one(Collection::Orders, doc! { "item": "Shoe", "status": "pending" })
            .await
            .unwrap();
        let id = inserted_id(&inserted);

        let result = store
            .upsert_fields(Collection::Orders, id, doc! { "status": "shipped" })
            .await
            .unwrap();
        assert_eq!(result.matched_count, 1);
        assert_eq!(result.modified_count, 1);
        assert!(!result.was_upsert());

        let order = store
            .find_by_id(Collection::Orders, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.get_str("status").unwrap(), "shipped");
        assert_eq!(order.get_str("item").unwrap(), "Shoe");
    }

    #[tokio::test]
    async fn upsert_with_same_values_reports_unmodified() {
        let store = InMemoryDocumentStore::new();
        let inserted = store
            .insert_one(Collection::Orders, doc! { "status": "pending" })
            .await
            .unwrap();

        let result = store
            .upsert_fields(
                Collection::Orders,
                inserted_id(&inserted),
                doc! { "status": "pending" },
            )
            .await
            .unwrap();
        assert_eq!(result.matched_count, 1);
        assert_eq!(result.modified_count, 0);
    }

    #[tokio::test]
    async fn upsert_on_missing_id_creates_document() {
        let store = InMemoryDocumentStore::new();
        let id = DocumentId::new();

        let result = store
            .upsert_fields(Collection::PromoCodes, id, doc! { "discount": 15_i64 })
            .await
            .unwrap();
        assert!(result.was_upsert());
        assert_eq!(result.matched_count, 0);
        assert_eq!(result.upserted_id, Some(serde_json::json!(id.to_hex())));

        let created = store
            .find_by_id(Collection::PromoCodes, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.get_i64("discount").unwrap(), 15);
    }

    #[tokio::test]
    async fn upsert_ignores_id_in_fields() {
        let store = InMemoryDocumentStore::new();
        let id = DocumentId::new();

        store
            .upsert_fields(
                Collection::Orders,
                id,
                doc! { "_id": "hijack", "status": "paid" },
            )
            .await
            .unwrap();

        let all = store.find_all(Collection::Orders).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get_object_id(ID_FIELD).unwrap(), id.as_object_id());
    }

    #[tokio::test]
    async fn unique_constraint_rejects_duplicate_insert() {
        let store = InMemoryDocumentStore::new();
        store
            .ensure_unique(Collection::Cart, "productName")
            .await
            .unwrap();

        store
            .insert_one(Collection::Cart, cart_item("Shoe"))
            .await
            .unwrap();
        let second = store.insert_one(Collection::Cart, cart_item("Shoe")).await;

        assert!(matches!(
            second,
            Err(DocumentStoreError::DuplicateKey { collection: Collection::Cart, ref field })
                if field == "productName"
        ));
        assert_eq!(store.count(Collection::Cart).await, 1);
    }

    #[tokio::test]
    async fn unique_constraint_holds_under_concurrent_inserts() {
        let store = InMemoryDocumentStore::new();
        store
            .ensure_unique(Collection::Cart, "productName")
            .await
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert_one(Collection::Cart, cart_item("Shoe")).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(store.count(Collection::Cart).await, 1);
    }

    #[tokio::test]
    async fn ensure_unique_fails_on_existing_duplicates() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_one(Collection::Cart, cart_item("Shoe"))
            .await
            .unwrap();
        store
            .insert_one(Collection::Cart, cart_item("Shoe"))
            .await
            .unwrap();

        let result = store.ensure_unique(Collection::Cart, "productName").await;
        assert!(matches!(result, Err(DocumentStoreError::DuplicateKey { .. })));
    }

    #[tokio::test]
    async fn ensure_unique_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        store
            .ensure_unique(Collection::Cart, "productName")
            .await
            .unwrap();
        store
            .ensure_unique(Collection::Cart, "productName")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upsert_dotted_path_updates_nested_field() {
        let store = InMemoryDocumentStore::new();
        let id = DocumentId::new();
        store
            .upsert_fields(
                Collection::Orders,
                id,
                doc! { "shipping": { "carrier": "dhl", "eta": 3_i64 } },
            )
            .await
            .unwrap();

        let result = store
            .upsert_fields(Collection::Orders, id, doc! { "shipping.eta": 5_i64 })
            .await
            .unwrap();
        assert_eq!(result.modified_count, 1);

        let order = store
            .find_by_id(Collection::Orders, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            order,
            doc! { "_id": id.as_object_id(), "shipping": { "carrier": "dhl", "eta": 5_i64 } }
        );
    }

    #[tokio::test]
    async fn upsert_create_expands_dotted_paths() {
        let store = InMemoryDocumentStore::new();
        let id = DocumentId::new();
        store
            .upsert_fields(Collection::PromoCodes, id, doc! { "limits.perUser": 2_i64 })
            .await
            .unwrap();

        let created = store
            .find_by_id(Collection::PromoCodes, id)
            .await
            .unwrap()
            .unwrap();
        assert!(!created.contains_key("limits.perUser"));
        assert_eq!(
            created.get_document("limits").unwrap().get_i64("perUser").unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn upsert_rejected_path_leaves_document_unchanged() {
        let store = InMemoryDocumentStore::new();
        let inserted = store
            .insert_one(Collection::Orders, doc! { "status": "pending" })
            .await
            .unwrap();
        let id = inserted_id(&inserted);

        let result = store
            .upsert_fields(Collection::Orders, id, doc! { "status.code": 1_i64 })
            .await;
        assert!(matches!(result, Err(DocumentStoreError::InvalidUpdate { .. })));

        let order = store
            .find_by_id(Collection::Orders, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.get_str("status").unwrap(), "pending");
    }

    #[tokio::test]
    async fn find_one_where_compares_numbers_by_value() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_one(Collection::Cart, doc! { "productName": 5_i64 })
            .await
            .unwrap();

        assert!(
            store
                .exists_where(Collection::Cart, "productName", Bson::Double(5.0))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn unique_constraint_treats_equal_numbers_as_duplicates() {
        let store = InMemoryDocumentStore::new();
        store
            .ensure_unique(Collection::Cart, "productName")
            .await
            .unwrap();
        store
            .insert_one(Collection::Cart, doc! { "productName": 5_i64 })
            .await
            .unwrap();

        let second = store
            .insert_one(Collection::Cart, doc! { "productName": 5.0 })
            .await;
        assert!(matches!(second, Err(DocumentStoreError::DuplicateKey { .. })));
    }

    #[tokio::test]
    async fn operator_shaped_value_matches_only_equal_documents() {
        let store = InMemoryDocumentStore::new();
        store
            .insert_one(Collection::Cart, cart_item("Shoe"))
            .await
            .unwrap();

        assert!(
            !store
                .exists_where(
                    Collection::Cart,
                    "productName",
                    Bson::Document(doc! { "$exists": true }),
                )
                .await
                .unwrap()
        );
    }
}
