use std::str::FromStr;

use bson::Bson;
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a stored document.
///
/// Wraps a BSON ObjectId so path parameters are parsed into the store's
/// native id format before any query is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(ObjectId);

impl DocumentId {
    /// Creates a new, freshly generated document ID.
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Returns the underlying ObjectId.
    pub fn as_object_id(&self) -> ObjectId {
        self.0
    }

    /// Returns the 24-character hex form.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returned when a string is not a valid 24-character hex ObjectId.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid document id {input:?}: {reason}")]
pub struct InvalidDocumentId {
    pub input: String,
    pub reason: String,
}

impl FromStr for DocumentId {
    type Err = InvalidDocumentId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
            .map(Self)
            .map_err(|e| InvalidDocumentId {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<ObjectId> for DocumentId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl From<DocumentId> for ObjectId {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl From<DocumentId> for Bson {
    fn from(id: DocumentId) -> Self {
        Bson::ObjectId(id.0)
    }
}

/// The named collections owned by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Cart,
    Orders,
    PromoCodes,
}

impl Collection {
    /// The collection name as stored in the database.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Cart => "cart",
            Collection::Orders => "orders",
            Collection::PromoCodes => "promocodes",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
