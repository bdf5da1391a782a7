//! Message fetching and body decoding.
//!
//! The [`ContentService`] fetches a full message and reduces it to a
//! [`MessageContent`]: the `Subject` and `Date` headers plus the first
//! plain-text body part, decoded from base64url.

use std::sync::Arc;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use super::PipelineError;
use crate::domain::{find_header, MessageContent, MessagePart, MessageRef, RawMessage};
use crate::providers::email::MailProvider;

/// Subject used when the header is absent.
pub const NO_SUBJECT: &str = "No Subject";

/// Date used when the header is absent.
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// Gmail omits padding on some bodies and keeps it on others.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Fetches and decodes message content.
pub struct ContentService {
    provider: Arc<dyn MailProvider>,
}

impl ContentService {
    /// Creates a decoder reading from `provider`.
    pub fn new(provider: Arc<dyn MailProvider>) -> Self {
        Self { provider }
    }

    /// Fetches `message` and decodes it.
    pub async fn decode(&self, message: &MessageRef) -> Result<MessageContent, PipelineError> {
        let raw = self
            .provider
            .get_message(message)
            .await
            .map_err(|source| PipelineError::FetchFailed {
                id: message.id.clone(),
                source,
            })?;

        decode_message(&raw)
    }
}

/// Decodes an already-fetched message.
///
/// A message with no plain-text part decodes to an empty body. Invalid
/// base64 in the selected part is a [`PipelineError::DecodeFailed`]; bytes
/// that are not valid UTF-8 are replaced rather than rejected.
pub fn decode_message(raw: &RawMessage) -> Result<MessageContent, PipelineError> {
    let headers = raw.headers().to_vec();

    let subject = find_header(&headers, "Subject")
        .unwrap_or(NO_SUBJECT)
        .to_string();
    let date = find_header(&headers, "Date")
        .unwrap_or(UNKNOWN_DATE)
        .to_string();

    let body = match raw.payload.as_ref().and_then(plain_text_data) {
        Some(data) => decode_body(data).map_err(|e| PipelineError::DecodeFailed {
            id: raw.id.clone(),
            reason: e.to_string(),
        })?,
        None => String::new(),
    };

    Ok(MessageContent {
        date,
        subject,
        body,
        headers,
    })
}

/// Selects the body data to decode.
///
/// Multipart payloads are searched depth-first in part order; a single-part
/// payload is used directly when it is plain text.
fn plain_text_data(payload: &MessagePart) -> Option<&str> {
    if payload.parts.is_empty() {
        return payload
            .is_mime("text/plain")
            .then(|| payload.inline_data())
            .flatten();
    }

    first_plain_text(&payload.parts)
}

fn first_plain_text(parts: &[MessagePart]) -> Option<&str> {
    parts.iter().find_map(|part| {
        part.is_mime("text/plain")
            .then(|| part.inline_data())
            .flatten()
            .or_else(|| first_plain_text(&part.parts))
    })
}

fn decode_body(data: &str) -> Result<String, base64::DecodeError> {
    let bytes = BODY_ENGINE.decode(data.trim())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
