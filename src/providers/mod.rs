//! External service providers.
//!
//! - [`email`]: mailbox search and fetch
//! - [`nlp`]: zero-shot classification and named-entity recognition

pub mod email;
pub mod nlp;
