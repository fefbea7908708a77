use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::{Client, Collection};
use serde_json::{Map, Value};

use crate::model::ModelKind;
use crate::store::traits::{DocumentStore, StoreError};

/// MongoDB-backed document store. One shared client; collections are
/// resolved per model on each call.
#[derive(Clone)]
pub struct MongoStore {
    db: mongodb::Database,
}

impl MongoStore {
    /// Connect and verify the deployment is reachable.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        log::info!("Connecting to MongoDB database '{}'", db_name);

        // Bound server selection so startup fails fast on an unreachable
        // deployment instead of hanging.
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| StoreError::Backend(format!("failed to connect to MongoDB: {}", e)))?;

        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Backend(format!("MongoDB ping failed: {}", e)))?;

        Ok(Self { db })
    }

    fn collection(&self, model: ModelKind) -> Collection<Document> {
        self.db.collection(model.collection())
    }
}

/// Query filter scoping a model to its discriminator tag, optionally pinned
/// to one identifier.
fn filter_for(model: ModelKind, id: Option<&ObjectId>) -> Document {
    let mut filter = Document::new();
    if let Some(oid) = id {
        filter.insert("_id", *oid);
    }
    if let Some(tag) = model.discriminator() {
        filter.insert("kind", tag);
    }
    filter
}

fn to_bson_document(map: &Map<String, Value>) -> Result<Document, StoreError> {
    bson::to_document(map).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Render a stored document for the wire: ObjectIds become hex strings,
/// BSON datetimes become RFC 3339 strings.
fn document_to_json(doc: Document) -> Value {
    bson_to_json(Bson::Document(doc))
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or(Value::Null),
        Bson::Document(doc) => Value::Object(
            doc.into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

#[async_trait::async_trait]
impl DocumentStore for MongoStore {
    async fn insert(
        &self,
        model: ModelKind,
        mut doc: Map<String, Value>,
    ) -> Result<String, StoreError> {
        // Identifiers are never client-supplied.
        doc.remove("_id");
        let document = to_bson_document(&doc)?;
        let result = self
            .collection(model)
            .insert_one(document)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let id = result
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .unwrap_or_else(|| result.inserted_id.to_string());
        log::debug!("inserted {} {}", model.name(), id);
        Ok(id)
    }

    async fn find_all(&self, model: ModelKind) -> Result<Vec<Value>, StoreError> {
        let cursor = self
            .collection(model)
            .find(filter_for(model, None))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(docs.into_iter().map(document_to_json).collect())
    }

    async fn find_by_id(
        &self,
        model: ModelKind,
        id: &ObjectId,
    ) -> Result<Option<Value>, StoreError> {
        let found = self
            .collection(model)
            .find_one(filter_for(model, Some(id)))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(found.map(document_to_json))
    }

    async fn update_by_id(
        &self,
        model: ModelKind,
        id: &ObjectId,
        patch: Map<String, Value>,
    ) -> Result<bool, StoreError> {
        if patch.is_empty() {
            // Mongo rejects an empty $set; an empty patch is an existence check.
            return Ok(self.find_by_id(model, id).await?.is_some());
        }
        let set = to_bson_document(&patch)?;
        let result = self
            .collection(model)
            .update_one(filter_for(model, Some(id)), doc! { "$set": set })
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_by_id(&self, model: ModelKind, id: &ObjectId) -> Result<bool, StoreError> {
        let result = self
            .collection(model)
            .delete_one(filter_for(model, Some(id)))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_scopes_subtypes_but_not_base_models() {
        assert_eq!(filter_for(ModelKind::Content, None), Document::new());
        assert_eq!(filter_for(ModelKind::Person, None), Document::new());
        assert_eq!(
            filter_for(ModelKind::Post, None),
            doc! { "kind": "Post" }
        );

        let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let filter = filter_for(ModelKind::Release, Some(&oid));
        assert_eq!(filter.get_object_id("_id").unwrap(), oid);
        assert_eq!(filter.get_str("kind").unwrap(), "Release");
    }

    #[test]
    fn object_ids_render_as_hex_strings() {
        let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let json = document_to_json(doc! { "_id": oid, "title": "x", "n": 3_i64 });
        assert_eq!(json["_id"], json!("507f1f77bcf86cd799439011"));
        assert_eq!(json["title"], json!("x"));
        assert_eq!(json["n"], json!(3));
    }

    #[test]
    fn bson_datetimes_render_as_rfc3339() {
        let dt = bson::DateTime::from_millis(1_622_505_600_000);
        let json = document_to_json(doc! { "at": dt });
        assert_eq!(json["at"], json!("2021-06-01T00:00:00Z"));
    }
}
