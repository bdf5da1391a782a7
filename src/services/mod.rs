//! Pipeline services layer.
//!
//! This module contains the stages of an ingestion run and the orchestrator
//! that drives them, coordinating between providers, storage, and domain
//! types.
//!
//! # Architecture
//!
//! ```text
//! DateWindow
//!     |
//!     v
//! SearchService ---> ContentService ---> ClassificationService
//!                                              |
//!                                              v
//!                                        FieldExtractor
//!                                              |
//!                                              v
//!                                         RecordSink
//! ```
//!
//! # Services Overview
//!
//! - [`SearchService`]: Paginated, date-windowed mailbox search
//! - [`ContentService`]: Fetches messages and decodes subject, date and body
//! - [`ClassificationService`]: Zero-shot classification plus entity extraction
//! - [`FieldExtractor`]: Regex and sender-domain fallbacks for unresolved fields
//! - [`PipelineService`]: Runs the stages over a window and collects records

mod classification_service;
mod content_service;
mod error;
mod extraction_service;
mod pipeline_service;
mod search_service;

pub use classification_service::{ClassificationService, JOB_APPLICATION, NOT_JOB_APPLICATION};
pub use content_service::{decode_message, ContentService, NO_SUBJECT, UNKNOWN_DATE};
pub use error::PipelineError;
pub use extraction_service::FieldExtractor;
pub use pipeline_service::{PipelineService, RunReport, SkippedMessage, DEFAULT_CONCURRENCY};
pub use search_service::{SearchService, DEFAULT_PAGE_SIZE};
