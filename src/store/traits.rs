use bson::oid::ObjectId;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::ModelKind;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Backend(String),
    #[error("document serialization failed: {0}")]
    Serialization(String),
}

/// Persistence seam for the gateway. The store owns identifiers (24-hex
/// ObjectIds assigned on insert) and executes queries; documents cross the
/// boundary as plain JSON objects with `_id` rendered as a hex string.
///
/// Subtype models are scoped by their discriminator tag: a `find_all` on
/// `post` only sees documents tagged `Post`, while the base `content` model
/// spans the whole collection.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document, returning the assigned identifier.
    async fn insert(&self, model: ModelKind, doc: Map<String, Value>)
        -> Result<String, StoreError>;

    /// Every document visible to the model, in no guaranteed order.
    async fn find_all(&self, model: ModelKind) -> Result<Vec<Value>, StoreError>;

    async fn find_by_id(&self, model: ModelKind, id: &ObjectId)
        -> Result<Option<Value>, StoreError>;

    /// Field-level merge of `patch` into the stored document. Returns false
    /// if no document matched. Last write wins under concurrency.
    async fn update_by_id(
        &self,
        model: ModelKind,
        id: &ObjectId,
        patch: Map<String, Value>,
    ) -> Result<bool, StoreError>;

    /// Hard removal. Returns false if no document matched.
    async fn delete_by_id(&self, model: ModelKind, id: &ObjectId) -> Result<bool, StoreError>;
}
