use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::registry::{check_person_refs, PayloadError};

/// Publication status of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Unpublished,
    Published,
    Archived,
}

/// Fields shared by every content subtype. Subtype-specific fields live in
/// the extension structs below; the stored document carries both plus a
/// `kind` discriminator tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFields {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default)]
    pub deleted: bool,
    /// Ordered Person references (24-hex identifiers). Referential
    /// integrity is left to the store.
    #[serde(default)]
    pub authors: Vec<String>,
}

impl ContentFields {
    pub(crate) fn validate(&self, model: &'static str) -> Result<(), PayloadError> {
        if self.title.trim().is_empty() {
            return Err(PayloadError::EmptyField {
                model,
                field: "title",
            });
        }
        check_person_refs(&self.authors, "authors")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostExt {
    #[serde(default = "Utc::now")]
    pub post_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingExt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub composers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watson_tone_statistics: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soundcloud_id: Option<String>,
}

impl RecordingExt {
    pub(crate) fn validate(&self) -> Result<(), PayloadError> {
        check_person_refs(&self.composers, "composers")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseExt {
    #[serde(default = "Utc::now")]
    pub release_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soundcloud_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itunes_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liner_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_uses_lowercase_wire_names() {
        assert_eq!(
            serde_json::to_value(Status::Unpublished).unwrap(),
            json!("unpublished")
        );
        let status: Status = serde_json::from_value(json!("archived")).unwrap();
        assert_eq!(status, Status::Archived);
    }

    #[test]
    fn content_defaults_apply() {
        let fields: ContentFields =
            serde_json::from_value(json!({ "title": "Liner notes" })).unwrap();
        assert!(!fields.deleted);
        assert!(fields.authors.is_empty());
        assert!(fields.status.is_none());
    }

    #[test]
    fn post_date_defaults_to_now() {
        let before = Utc::now();
        let ext: PostExt = serde_json::from_value(json!({})).unwrap();
        assert!(ext.post_date >= before);
    }

    #[test]
    fn release_date_round_trips() {
        let ext: ReleaseExt =
            serde_json::from_value(json!({ "releaseDate": "2021-06-01T00:00:00Z" })).unwrap();
        let value = serde_json::to_value(&ext).unwrap();
        assert_eq!(value["releaseDate"], json!("2021-06-01T00:00:00Z"));
        // optional identifiers are omitted, not serialized as null
        assert!(value.get("spotifyId").is_none());
    }
}
