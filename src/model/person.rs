use serde::{Deserialize, Serialize};

use crate::model::registry::PayloadError;

/// A person referenced by content items as author or composer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub given_name: String,
    pub family_name: String,
}

impl Person {
    pub(crate) fn validate(&self) -> Result<(), PayloadError> {
        if self.given_name.trim().is_empty() {
            return Err(PayloadError::EmptyField {
                model: "person",
                field: "givenName",
            });
        }
        if self.family_name.trim().is_empty() {
            return Err(PayloadError::EmptyField {
                model: "person",
                field: "familyName",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_names() {
        let person = Person {
            given_name: "  ".to_string(),
            family_name: "Lovelace".to_string(),
        };
        assert!(person.validate().is_err());

        let person = Person {
            given_name: "Ada".to_string(),
            family_name: String::new(),
        };
        assert!(person.validate().is_err());
    }

    #[test]
    fn accepts_full_name() {
        let person = Person {
            given_name: "Ada".to_string(),
            family_name: "Lovelace".to_string(),
        };
        assert!(person.validate().is_ok());
    }
}
