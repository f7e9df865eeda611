pub mod document;
pub mod error;
pub mod memory;
pub mod mongo;
pub mod result;
pub mod store;

pub use bson::{Bson, Document};
pub use common::{Collection, DocumentId, InvalidDocumentId};
pub use error::{DocumentStoreError, Result};
pub use memory::InMemoryDocumentStore;
pub use mongo::{MongoDocumentStore, StoreOptions};
pub use result::{DeleteResult, InsertResult, UpdateResult};
pub use store::{DocumentStore, DocumentStoreExt};
