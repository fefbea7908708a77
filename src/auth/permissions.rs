use axum::http::Method;

use crate::auth::jwt::Identity;
use crate::model::ModelKind;

/// Permission string guarding a verb + model pair. Exact match only; no
/// wildcards or hierarchy.
pub fn required_permission(method: &Method, model: ModelKind) -> String {
    format!("{}:{}", method.as_str().to_lowercase(), model.name())
}

impl Identity {
    pub fn is_allowed(&self, permission: &str) -> bool {
        self.permissions.iter().any(|granted| granted == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(permissions: &[&str]) -> Identity {
        Identity {
            subject: "auth0|tester".to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn permission_string_lowercases_the_verb() {
        assert_eq!(
            required_permission(&Method::POST, ModelKind::Person),
            "post:person"
        );
        assert_eq!(
            required_permission(&Method::DELETE, ModelKind::Release),
            "delete:release"
        );
    }

    #[test]
    fn exact_match_only() {
        let identity = identity(&["get:person", "post:person"]);
        assert!(identity.is_allowed("get:person"));
        assert!(!identity.is_allowed("get:release"));
        assert!(!identity.is_allowed("get:"));
        assert!(!identity.is_allowed("person"));
    }

    #[test]
    fn no_wildcard_semantics() {
        let identity = identity(&["*:*", "get:*"]);
        assert!(!identity.is_allowed("get:person"));
    }
}
