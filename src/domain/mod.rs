//! Domain layer types for jobtrail.
//!
//! This module contains the core types that flow through the ingestion
//! pipeline: the search window, message references, decoded message content,
//! classification results, and the output records.

mod message;
mod record;
mod types;
mod window;

pub(crate) use message::find_header;
pub use message::{MessageContent, MessageHeader, MessagePart, PartBody, RawMessage};
pub use record::{ClassificationResult, Record, UNKNOWN};
pub use types::MessageRef;
pub use window::{date_to_timestamp, DateWindow, WindowError, DATE_FORMAT};
