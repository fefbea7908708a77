use bson::oid::ObjectId;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::content::{ContentFields, PostExt, RecordingExt, ReleaseExt};
use crate::model::person::Person;

/// The closed set of registered content-type models. The `{model}` path
/// segment resolves into one of these variants; unknown segments are a typed
/// miss rather than a runtime lookup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Person,
    Content,
    Post,
    Recording,
    Release,
}

/// A payload rejected before it reaches the store.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload must be a JSON object")]
    NotAnObject,
    #[error("invalid {model} payload: {source}")]
    Invalid {
        model: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{model} validation failed: {field} must not be empty")]
    EmptyField {
        model: &'static str,
        field: &'static str,
    },
    #[error("invalid Person reference in {field}: {value}")]
    BadReference { field: &'static str, value: String },
    #[error("failed to serialize {model} document: {source}")]
    Serialize {
        model: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ModelKind {
    /// Resolve a path segment against the registry. Case-sensitive; only the
    /// registered lowercase names match.
    pub fn resolve(segment: &str) -> Option<ModelKind> {
        match segment {
            "person" => Some(ModelKind::Person),
            "content" => Some(ModelKind::Content),
            "post" => Some(ModelKind::Post),
            "recording" => Some(ModelKind::Recording),
            "release" => Some(ModelKind::Release),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Person => "person",
            ModelKind::Content => "content",
            ModelKind::Post => "post",
            ModelKind::Recording => "recording",
            ModelKind::Release => "release",
        }
    }

    /// Store collection backing this model. Content subtypes share the base
    /// collection and are told apart by the `kind` tag.
    pub fn collection(&self) -> &'static str {
        match self {
            ModelKind::Person => "people",
            _ => "content",
        }
    }

    /// Discriminator tag stored with subtype documents. `None` for Person
    /// (own collection) and for the base Content model, whose queries span
    /// every subtype in the collection.
    pub fn discriminator(&self) -> Option<&'static str> {
        match self {
            ModelKind::Person | ModelKind::Content => None,
            ModelKind::Post => Some("Post"),
            ModelKind::Recording => Some("Recording"),
            ModelKind::Release => Some("Release"),
        }
    }

    /// Parse and validate a create payload into the document to persist.
    ///
    /// Required-field and enum violations surface as `PayloadError` with the
    /// deserializer's own message; defaults (dates, `deleted`, empty
    /// reference lists) are applied here so the stored document is complete.
    pub fn parse_payload(&self, body: Value) -> Result<Map<String, Value>, PayloadError> {
        if !body.is_object() {
            return Err(PayloadError::NotAnObject);
        }
        let model = self.name();
        if let ModelKind::Person = self {
            let person: Person = from_body(model, body)?;
            person.validate()?;
            return to_object(model, &person);
        }

        let base: ContentFields = from_body(model, body.clone())?;
        base.validate(model)?;
        let mut doc = to_object(model, &base)?;
        match self {
            ModelKind::Post => {
                let ext: PostExt = from_body(model, body)?;
                doc.extend(to_object(model, &ext)?);
            }
            ModelKind::Recording => {
                let ext: RecordingExt = from_body(model, body)?;
                ext.validate()?;
                doc.extend(to_object(model, &ext)?);
            }
            ModelKind::Release => {
                let ext: ReleaseExt = from_body(model, body)?;
                doc.extend(to_object(model, &ext)?);
            }
            ModelKind::Content | ModelKind::Person => {}
        }
        if let Some(tag) = self.discriminator() {
            doc.insert("kind".to_string(), Value::String(tag.to_string()));
        }
        Ok(doc)
    }
}

fn from_body<T: serde::de::DeserializeOwned>(
    model: &'static str,
    body: Value,
) -> Result<T, PayloadError> {
    serde_json::from_value(body).map_err(|source| PayloadError::Invalid { model, source })
}

fn to_object<T: Serialize>(
    model: &'static str,
    value: &T,
) -> Result<Map<String, Value>, PayloadError> {
    match serde_json::to_value(value).map_err(|source| PayloadError::Serialize { model, source })? {
        Value::Object(map) => Ok(map),
        _ => Err(PayloadError::NotAnObject),
    }
}

/// Person references travel as 24-hex identifiers. Existence of the
/// referenced Person is not checked here.
pub(crate) fn check_person_refs(
    refs: &[String],
    field: &'static str,
) -> Result<(), PayloadError> {
    for value in refs {
        if ObjectId::parse_str(value).is_err() {
            return Err(PayloadError::BadReference {
                field,
                value: value.clone(),
            });
        }
    }
    Ok(())
}
