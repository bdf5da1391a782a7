//! Core identifier types for domain entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a message in the provider's mailbox.
///
/// Produced by a mailbox search and consumed by the content decoder. The
/// identifier is whatever the provider hands out; it is never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    /// Provider-assigned message identifier.
    pub id: String,
}

impl MessageRef {
    /// Creates a reference from a provider message ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl From<String> for MessageRef {
    fn from(s: String) -> Self {
        Self { id: s }
    }
}

impl From<&str> for MessageRef {
    fn from(s: &str) -> Self {
        Self { id: s.to_owned() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ref_equality() {
        let a = MessageRef::from("18c2f0a1");
        let b = MessageRef::new("18c2f0a1".to_string());
        let c = MessageRef::from("18c2f0a2");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn message_ref_display() {
        assert_eq!(MessageRef::from("abc").to_string(), "abc");
    }

    #[test]
    fn message_ref_ignores_extra_provider_fields() {
        let parsed: MessageRef =
            serde_json::from_str(r#"{"id":"m-1","threadId":"t-1"}"#).unwrap();
        assert_eq!(parsed.id, "m-1");
    }
}
