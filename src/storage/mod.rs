//! Credential storage and record output.
//!
//! This module provides the persistence edges of a run:
//!
//! - OS keychain integration for OAuth credentials and API tokens
//! - Record sinks that receive the final record set (CSV and XLSX files, in-memory)
//! - Blocking file and keychain work runs via tokio::task::spawn_blocking

mod keychain;
mod sink;

pub use keychain::{KeychainAccess, KeychainError};
pub use sink::{
    CsvSink, MemorySink, MultiSink, RecordSink, SinkError, XlsxSink, RECORD_HEADERS,
};
