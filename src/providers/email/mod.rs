//! Mail provider implementations.
//!
//! This module contains the [`MailProvider`] trait and the Gmail backend:
//!
//! - [`GmailProvider`] - Gmail REST API with OAuth 2.0
//!
//! # Architecture
//!
//! The pipeline only depends on the trait. Search walks
//! [`MailProvider::list_messages`] page by page, and the content decoder calls
//! [`MailProvider::get_message`] once per reference. Tests substitute an
//! in-memory double.

mod gmail;
mod traits;

pub use gmail::{GmailCredentials, GmailProvider};
pub use traits::{MailProvider, MessagePage, PageRequest, ProviderError, Result};
