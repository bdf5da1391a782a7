//! Gmail API provider implementation.
//!
//! This module provides a [`MailProvider`] implementation using the Gmail REST
//! API. It handles OAuth 2.0 access-token refresh and the two read-only calls
//! the pipeline needs.
//!
//! # Authentication
//!
//! Gmail uses OAuth 2.0. A [`GmailCredentials`] value (client ID, client
//! secret and refresh token) is loaded from an authorized-user JSON file or
//! from the system keychain, and [`GmailProvider::authenticate`] exchanges it
//! for a short-lived access token. Obtaining the refresh token in the first
//! place (the consent flow) is out of scope.
//!
//! # API Usage
//!
//! This provider uses the Gmail API v1:
//! - `users.messages.list` for paginated search
//! - `users.messages.get?format=full` for fetching headers and body parts

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use super::{MailProvider, MessagePage, PageRequest, ProviderError, Result};
use crate::domain::{MessageRef, RawMessage};
use crate::storage::KeychainAccess;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Gmail API message list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    messages: Option<Vec<MessageRef>>,
    next_page_token: Option<String>,
    #[allow(dead_code)]
    result_size_estimate: Option<u32>,
}

impl From<MessageListResponse> for MessagePage {
    fn from(response: MessageListResponse) -> Self {
        Self {
            messages: response.messages.unwrap_or_default(),
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

/// OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    expires_in: Option<u64>,
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// OAuth credentials for a Gmail account.
///
/// The field names match Google's authorized-user JSON file, so such a file
/// deserializes directly (extra fields like `token` or `scopes` are ignored).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmailCredentials {
    /// OAuth refresh token.
    pub refresh_token: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl GmailCredentials {
    /// Reads credentials from an authorized-user JSON file.
    pub fn from_authorized_user_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::Authentication(format!("read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&json)
            .map_err(|e| ProviderError::Authentication(format!("invalid credentials: {}", e)))
    }

    /// Loads credentials stored in the system keychain for `account`.
    pub async fn from_keychain(keychain: &KeychainAccess, account: &str) -> Result<Self> {
        let key = KeychainAccess::gmail_credentials_key(account);
        let json = keychain
            .retrieve(&key)
            .await
            .map_err(|e| ProviderError::Authentication(format!("keyring error: {}", e)))?
            .ok_or_else(|| {
                ProviderError::Authentication(format!("no credentials found for {}", account))
            })?;

        serde_json::from_str(&json)
            .map_err(|e| ProviderError::Authentication(format!("invalid credentials: {}", e)))
    }

    /// Saves these credentials to the system keychain for `account`.
    pub async fn save_to_keychain(&self, keychain: &KeychainAccess, account: &str) -> Result<()> {
        let json = serde_json::to_string(self)
            .map_err(|e| ProviderError::Internal(format!("serialize error: {}", e)))?;

        keychain
            .store(&KeychainAccess::gmail_credentials_key(account), &json)
            .await
            .map_err(|e| ProviderError::Authentication(format!("keyring error: {}", e)))
    }
}

/// Gmail API provider.
///
/// Implements [`MailProvider`] using the Gmail REST API with OAuth 2.0
/// authentication.
///
/// # Example
///
/// ```ignore
/// use jobtrail::providers::email::{GmailCredentials, GmailProvider, MailProvider, PageRequest};
///
/// let credentials = GmailCredentials::from_authorized_user_file("token.json")?;
/// let mut provider = GmailProvider::new(credentials);
/// provider.authenticate().await?;
///
/// let page = provider.list_messages("category:primary", PageRequest::with_limit(100)).await?;
/// ```
pub struct GmailProvider {
    /// HTTP client for API requests.
    client: reqwest::Client,
    /// Base URL of the Gmail user resource.
    api_base: String,
    /// OAuth token endpoint.
    token_url: String,
    /// OAuth credentials.
    credentials: GmailCredentials,
    /// Current OAuth access token.
    access_token: Option<String>,
}

impl GmailProvider {
    /// Creates a new Gmail provider.
    ///
    /// The provider is not authenticated until [`authenticate`](Self::authenticate) is called.
    pub fn new(credentials: GmailCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: GMAIL_API_BASE.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            credentials,
            access_token: None,
        }
    }

    /// Overrides the HTTP client (useful for custom timeouts or proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Overrides the API and token endpoints.
    pub fn with_endpoints(mut self, api_base: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.token_url = token_url.into();
        self
    }

    /// Uses an access token obtained elsewhere instead of refreshing one.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Returns whether the provider holds an access token.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Refreshes the OAuth access token using the refresh token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Authentication`] if the token endpoint rejects
    /// the credentials.
    pub async fn authenticate(&mut self) -> Result<()> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Authentication(format!(
                "token refresh failed ({}): {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("parse token response: {}", e)))?;

        self.access_token = Some(token_response.access_token);
        tracing::info!("Gmail provider authenticated");
        Ok(())
    }

    /// Builds authorization headers for API requests.
    fn auth_headers(&self) -> Result<HeaderMap> {
        let token = self
            .access_token
            .as_ref()
            .ok_or_else(|| ProviderError::Authentication("not authenticated".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ProviderError::Internal(format!("invalid header: {}", e)))?,
        );
        Ok(headers)
    }

    /// Makes an authenticated GET request to the Gmail API.
    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.api_base, endpoint);
        let headers = self.auth_headers()?;

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handles API response, checking for errors.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            return Err(self.handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("parse response: {}", e)))
    }

    /// Handles API error responses.
    async fn handle_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return ProviderError::RateLimited { retry_after_secs };
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            400 => ProviderError::InvalidRequest(body),
            401 | 403 => ProviderError::Authentication(format!("unauthorized: {}", body)),
            404 => ProviderError::NotFound(body),
            _ => ProviderError::Internal(format!("API error ({}): {}", status, body)),
        }
    }

    /// Builds the query parameters for a `users.messages.list` call.
    fn list_params(query: &str, page: &PageRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", query.to_string())];
        if let Some(limit) = page.limit {
            params.push(("maxResults", limit.to_string()));
        }
        if let Some(token) = &page.page_token {
            params.push(("pageToken", token.clone()));
        }
        params
    }
}

#[async_trait]
impl MailProvider for GmailProvider {
    fn name(&self) -> &str {
        "gmail"
    }

    async fn list_messages(&self, query: &str, page: PageRequest) -> Result<MessagePage> {
        let params = Self::list_params(query, &page);
        let response: MessageListResponse = self.get("/messages", &params).await?;
        Ok(response.into())
    }

    async fn get_message(&self, message: &MessageRef) -> Result<RawMessage> {
        if message.id.is_empty() || message.id.contains('/') {
            return Err(ProviderError::InvalidRequest(format!(
                "bad message id {:?}",
                message.id
            )));
        }

        let endpoint = format!("/messages/{}", message.id);
        self.get(&endpoint, &[("format", "full".to_string())]).await
    }
}
