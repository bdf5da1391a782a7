//! Message representations: provider-native structure and decoded content.

use serde::{Deserialize, Serialize};

/// A single `(name, value)` header pair, kept exactly as the provider sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Header name, e.g. `From`.
    pub name: String,
    /// Raw header value.
    pub value: String,
}

impl MessageHeader {
    /// Creates a header pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Full message structure as returned by a provider fetch.
///
/// Mirrors the Gmail `users.messages.get?format=full` resource so the
/// provider can deserialize straight into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    /// Provider message ID.
    pub id: String,
    /// Top-level MIME part carrying headers and body.
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

impl RawMessage {
    /// Creates a message with the given payload.
    pub fn new(id: impl Into<String>, payload: MessagePart) -> Self {
        Self {
            id: id.into(),
            payload: Some(payload),
        }
    }

    /// Returns the top-level headers, or an empty slice without a payload.
    pub fn headers(&self) -> &[MessageHeader] {
        self.payload
            .as_ref()
            .map(|p| p.headers.as_slice())
            .unwrap_or_default()
    }
}

/// One MIME part of a message; multipart messages nest further parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    /// MIME type such as `text/plain` or `multipart/alternative`.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Headers attached to this part.
    #[serde(default)]
    pub headers: Vec<MessageHeader>,
    /// Inline body, if any.
    #[serde(default)]
    pub body: Option<PartBody>,
    /// Child parts for multipart content.
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    /// Creates an empty part of the given MIME type.
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
            ..Default::default()
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(MessageHeader::new(name, value));
        self
    }

    /// Sets the inline body data (already base64url-encoded).
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.body = Some(PartBody {
            data: Some(data.into()),
            size: None,
        });
        self
    }

    /// Appends a child part.
    pub fn with_part(mut self, part: MessagePart) -> Self {
        self.parts.push(part);
        self
    }

    /// Returns true if this part has the given MIME type (case-insensitive).
    pub fn is_mime(&self, mime_type: &str) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case(mime_type))
    }

    /// Inline body data, if present and non-empty.
    pub fn inline_data(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
    }
}

/// Body of a MIME part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartBody {
    /// Base64url-encoded content. Absent for attachments and containers.
    #[serde(default)]
    pub data: Option<String>,
    /// Decoded size in bytes as reported by the provider.
    #[serde(default)]
    pub size: Option<u32>,
}

/// Decoded content of one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    /// `Date` header value in provider-native format, or `"Unknown Date"`.
    pub date: String,
    /// `Subject` header value, or `"No Subject"`.
    pub subject: String,
    /// Plain-text body; empty when the message has no text part.
    pub body: String,
    /// All top-level headers, unmodified.
    pub headers: Vec<MessageHeader>,
}

impl MessageContent {
    /// Looks up the first header with the given name (ASCII case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Finds the first header named `name`, ignoring ASCII case.
pub(crate) fn find_header<'a>(headers: &'a [MessageHeader], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_gmail_full_message() {
        let json = r#"{
            "id": "18c2f0a1",
            "threadId": "18c2f0a1",
            "labelIds": ["INBOX", "CATEGORY_PERSONAL"],
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [
                    {"name": "From", "value": "Acme Careers <jobs@acme.com>"},
                    {"name": "Subject", "value": "We received your application"}
                ],
                "body": {"size": 0},
                "parts": [
                    {"partId": "0", "mimeType": "text/plain", "body": {"size": 5, "data": "aGVsbG8="}},
                    {"partId": "1", "mimeType": "text/html", "body": {"size": 12, "data": "PGI-aGk8L2I-"}}
                ]
            }
        }"#;

        let message: RawMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.id, "18c2f0a1");
        assert_eq!(message.headers().len(), 2);

        let payload = message.payload.unwrap();
        assert!(payload.is_mime("multipart/alternative"));
        assert!(payload.inline_data().is_none());
        assert_eq!(payload.parts.len(), 2);
        assert_eq!(payload.parts[0].inline_data(), Some("aGVsbG8="));
    }

    #[test]
    fn message_without_payload_has_no_headers() {
        let message: RawMessage = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(message.headers().is_empty());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let content = MessageContent {
            date: "Unknown Date".to_string(),
            subject: "No Subject".to_string(),
            body: String::new(),
            headers: vec![
                MessageHeader::new("from", "a@b.com"),
                MessageHeader::new("From", "c@d.com"),
            ],
        };

        assert_eq!(content.header("FROM"), Some("a@b.com"));
        assert_eq!(content.header("Reply-To"), None);
    }

    #[test]
    fn builder_produces_nested_parts() {
        let part = MessagePart::new("multipart/mixed")
            .with_header("Subject", "hi")
            .with_part(MessagePart::new("TEXT/PLAIN").with_data("aGk"));

        assert_eq!(part.headers[0].value, "hi");
        assert!(part.parts[0].is_mime("text/plain"));
        assert_eq!(part.parts[0].inline_data(), Some("aGk"));
    }
}
