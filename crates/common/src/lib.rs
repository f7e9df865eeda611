pub mod types;

pub use types::{Collection, DocumentId, InvalidDocumentId};
