//! jobtrail - Finds job-application acknowledgments in a mailbox
//!
//! This crate provides the ingestion pipeline behind the `jobtrail` binary:
//! date-windowed Gmail search, message decoding, zero-shot classification
//! with entity extraction, heuristic field fallbacks, and CSV export.

pub mod app;
pub mod config;
pub mod domain;
pub mod embedding;
pub mod providers;
pub mod services;
pub mod storage;

pub use app::Runtime;
