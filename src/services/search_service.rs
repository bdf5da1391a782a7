//! Date-windowed mailbox search.
//!
//! The [`SearchService`] turns a [`DateWindow`] into a provider query and
//! follows continuation tokens until the listing is exhausted, yielding every
//! matching [`MessageRef`] exactly once.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};

use super::PipelineError;
use crate::domain::{DateWindow, MessageRef};
use crate::providers::email::{MailProvider, PageRequest, ProviderError};

/// Default number of references requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page the Gmail API accepts.
const MAX_PAGE_SIZE: u32 = 500;

/// Where the next list call should start.
enum Cursor {
    First,
    Token(String),
    Done,
}

/// Pagination state threaded through the page stream.
struct PageState {
    cursor: Cursor,
    seen_tokens: HashSet<String>,
    page: usize,
}

/// Enumerates messages inside a date window.
pub struct SearchService {
    provider: Arc<dyn MailProvider>,
    category: Option<String>,
    page_size: u32,
}

impl SearchService {
    /// Creates a search scoped to the `primary` category.
    pub fn new(provider: Arc<dyn MailProvider>) -> Self {
        Self {
            provider,
            category: Some("primary".to_string()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Scopes the search to a category; an empty string searches all mail.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        let category = category.trim();
        self.category = (!category.is_empty()).then(|| category.to_string());
        self
    }

    /// Sets the page size, clamped to what the provider accepts.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Returns the configured page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Builds the provider query for `window`.
    ///
    /// Bounds are midnight-UTC Unix timestamps; the provider treats `after`
    /// as inclusive and `before` as exclusive.
    pub fn build_query(&self, window: &DateWindow) -> String {
        let bounds = format!(
            "after:{} before:{}",
            window.start_timestamp(),
            window.end_timestamp()
        );

        match &self.category {
            Some(category) => format!("category:{} {}", category, bounds),
            None => bounds,
        }
    }

    /// Streams every message reference in `window`, page by page.
    ///
    /// Pages are requested lazily as the stream is polled. A listing error or
    /// a continuation token seen twice ends the stream with
    /// [`PipelineError::SearchFailed`].
    pub fn stream(
        &self,
        window: &DateWindow,
    ) -> impl Stream<Item = Result<MessageRef, PipelineError>> + Send + 'static {
        let provider = Arc::clone(&self.provider);
        let query = self.build_query(window);
        let first = PageRequest::with_limit(self.page_size);

        let initial = PageState {
            cursor: Cursor::First,
            seen_tokens: HashSet::new(),
            page: 0,
        };

        stream::try_unfold(initial, move |mut state| {
            let provider = Arc::clone(&provider);
            let query = query.clone();
            let first = first.clone();

            async move {
                let request = match state.cursor {
                    Cursor::First => first,
                    Cursor::Token(token) => first.next_page(token),
                    Cursor::Done => return Ok(None),
                };

                let page = provider
                    .list_messages(&query, request)
                    .await
                    .map_err(PipelineError::SearchFailed)?;

                state.page += 1;
                tracing::debug!(
                    page = state.page,
                    count = page.messages.len(),
                    has_more = page.next_page_token.is_some(),
                    "Fetched search page"
                );

                state.cursor = match page.next_page_token {
                    Some(token) if !state.seen_tokens.insert(token.clone()) => {
                        return Err(PipelineError::SearchFailed(ProviderError::Internal(
                            format!("page token {} returned twice", token),
                        )));
                    }
                    Some(token) => Cursor::Token(token),
                    None => Cursor::Done,
                };

                let refs = stream::iter(page.messages.into_iter().map(Ok::<_, PipelineError>));
                Ok::<_, PipelineError>(Some((refs, state)))
            }
        })
        .try_flatten()
    }

    /// Collects every message reference in `window`.
    ///
    /// References keep provider order; a reference repeated across pages is
    /// kept only at its first position.
    pub async fn search(&self, window: &DateWindow) -> Result<Vec<MessageRef>, PipelineError> {
        let mut seen = HashSet::new();
        let refs: Vec<MessageRef> = self
            .stream(window)
            .try_filter(|message| futures::future::ready(seen.insert(message.id.clone())))
            .try_collect()
            .await?;

        tracing::info!(
            window = %window,
            query = %self.build_query(window),
            count = refs.len(),
            "Search complete"
        );

        Ok(refs)
    }
}
