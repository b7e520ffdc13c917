//! Subjects the issuer may assert after a login.
//!
//! The set of subject kinds is fixed at compile time; only `user` exists.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties", rename_all = "lowercase")]
pub enum Subject {
    User { id: String },
}

impl Subject {
    /// Build a `user` subject. Returns `None` for an empty id.
    pub fn user(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Subject::User { id })
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Subject::User { .. } => "user",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_subject_wire_shape() {
        let subject = Subject::user("42").unwrap();
        assert_eq!(
            serde_json::to_value(&subject).unwrap(),
            json!({ "type": "user", "properties": { "id": "42" } })
        );
        assert_eq!(subject.kind(), "user");
    }

    #[test]
    fn empty_id_is_rejected() {
        assert!(Subject::user("").is_none());
    }

    #[test]
    fn unknown_kind_does_not_parse() {
        let raw = json!({ "type": "admin", "properties": { "id": "1" } });
        assert!(serde_json::from_value::<Subject>(raw).is_err());
    }
}
