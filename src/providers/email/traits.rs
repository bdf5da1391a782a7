//! Mail provider trait definition.
//!
//! This module defines the [`MailProvider`] trait which abstracts over the
//! mailbox backend. The pipeline only needs two operations from it: a
//! paginated search and a full message fetch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{MessageRef, RawMessage};

/// Result type alias for mail provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur during mail provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Authentication failed or credentials expired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if known.
        retry_after_secs: Option<u64>,
    },

    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Parameters for one page of a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of references to return.
    pub limit: Option<u32>,
    /// Continuation token from the previous page; `None` on the first call.
    pub page_token: Option<String>,
}

impl PageRequest {
    /// Creates a first-page request with the specified limit.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            page_token: None,
        }
    }

    /// Returns a request for the page identified by `token`, keeping the limit.
    pub fn next_page(&self, token: impl Into<String>) -> Self {
        Self {
            limit: self.limit,
            page_token: Some(token.into()),
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePage {
    /// References returned on this page, in provider order.
    pub messages: Vec<MessageRef>,
    /// Token for the following page; `None` when the listing is exhausted.
    pub next_page_token: Option<String>,
}

/// Trait for mailbox backends.
///
/// Implementations handle their own authentication and wire protocol. Both
/// operations are read-only.
///
/// # Example
///
/// ```ignore
/// use jobtrail::providers::email::{MailProvider, PageRequest};
///
/// async fn first_page(provider: &dyn MailProvider) -> Result<()> {
///     let page = provider
///         .list_messages("category:primary", PageRequest::with_limit(100))
///         .await?;
///
///     for message in page.messages {
///         println!("{}", message);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Returns a short name for logging (e.g. "gmail").
    fn name(&self) -> &str;

    /// Lists message references matching a provider query string.
    ///
    /// # Arguments
    ///
    /// * `query` - Provider search expression, e.g. `after:1740096000`
    /// * `page` - Page size and continuation token
    async fn list_messages(&self, query: &str, page: PageRequest) -> Result<MessagePage>;

    /// Fetches the full structure of a message.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the message does not exist.
    async fn get_message(&self, message: &MessageRef) -> Result<RawMessage>;
}
