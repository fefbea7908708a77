use std::collections::HashMap;

use bson::oid::ObjectId;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::model::ModelKind;
use crate::store::traits::{DocumentStore, StoreError};

/// In-memory document store used by the test suite. Mirrors the Mongo
/// implementation's semantics: store-assigned 24-hex identifiers,
/// discriminator-scoped queries, top-level field merge on update.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<&'static str, HashMap<String, Map<String, Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn visible_to(model: ModelKind, doc: &Map<String, Value>) -> bool {
    match model.discriminator() {
        Some(tag) => doc.get("kind").and_then(Value::as_str) == Some(tag),
        None => true,
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(
        &self,
        model: ModelKind,
        mut doc: Map<String, Value>,
    ) -> Result<String, StoreError> {
        let id = ObjectId::new().to_hex();
        doc.insert("_id".to_string(), Value::String(id.clone()));
        self.collections
            .write()
            .entry(model.collection())
            .or_default()
            .insert(id.clone(), doc);
        Ok(id)
    }

    async fn find_all(&self, model: ModelKind) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read();
        let docs = collections
            .get(model.collection())
            .map(|collection| {
                collection
                    .values()
                    .filter(|doc| visible_to(model, doc))
                    .map(|doc| Value::Object(doc.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn find_by_id(
        &self,
        model: ModelKind,
        id: &ObjectId,
    ) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read();
        let found = collections
            .get(model.collection())
            .and_then(|collection| collection.get(&id.to_hex()))
            .filter(|doc| visible_to(model, doc))
            .map(|doc| Value::Object(doc.clone()));
        Ok(found)
    }

    async fn update_by_id(
        &self,
        model: ModelKind,
        id: &ObjectId,
        patch: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write();
        let Some(doc) = collections
            .get_mut(model.collection())
            .and_then(|collection| collection.get_mut(&id.to_hex()))
            .filter(|doc| visible_to(model, doc))
        else {
            return Ok(false);
        };
        for (key, value) in patch {
            doc.insert(key, value);
        }
        Ok(true)
    }

    async fn delete_by_id(&self, model: ModelKind, id: &ObjectId) -> Result<bool, StoreError> {
        let mut collections = self.collections.write();
        let Some(collection) = collections.get_mut(model.collection()) else {
            return Ok(false);
        };
        let hex = id.to_hex();
        let matches = collection
            .get(&hex)
            .map(|doc| visible_to(model, doc))
            .unwrap_or(false);
        if matches {
            collection.remove(&hex);
        }
        Ok(matches)
    }
}
