//! OS keychain storage for secrets.
//!
//! Holds the Gmail OAuth credentials (as JSON) and the inference API token so
//! they do not have to live in plain files. Every keyring call blocks, so it
//! runs on the blocking thread pool.

use thiserror::Error;

/// Errors that can occur during keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Failed to spawn blocking task: {0}")]
    TaskFailed(String),
}

/// Result type for keychain operations.
pub type Result<T> = std::result::Result<T, KeychainError>;

/// Secrets namespaced under one keychain service.
#[derive(Debug, Clone)]
pub struct KeychainAccess {
    service_name: String,
}

impl KeychainAccess {
    /// Service name used unless another is given.
    pub const DEFAULT_SERVICE: &'static str = "io.jobtrail.app";

    pub fn new() -> Self {
        Self::with_service(Self::DEFAULT_SERVICE)
    }

    /// Uses a separate namespace, e.g. to keep tests away from real secrets.
    pub fn with_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Saves `value` under `key`, replacing any existing secret.
    pub async fn store(&self, key: &str, value: &str) -> Result<()> {
        let value = value.to_string();
        self.with_entry(key, move |entry| Ok(entry.set_password(&value)?))
            .await
    }

    /// Reads the secret under `key`; `None` if nothing is stored.
    pub async fn retrieve(&self, key: &str) -> Result<Option<String>> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        })
        .await
    }

    async fn with_entry<T, F>(&self, key: &str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&keyring::Entry) -> Result<T> + Send + 'static,
    {
        let service = self.service_name.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let entry = keyring::Entry::new(&service, &key)?;
            op(&entry)
        })
        .await
        .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }

    /// Key holding the OAuth credentials JSON for a Gmail account.
    pub fn gmail_credentials_key(account: &str) -> String {
        format!("gmail.credentials.{}", account)
    }

    /// Key holding the Hugging Face inference token.
    pub fn inference_token_key() -> String {
        "nlp.api_token.huggingface".to_string()
    }
}

impl Default for KeychainAccess {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces() {
        assert_eq!(KeychainAccess::new().service_name(), "io.jobtrail.app");
        assert_eq!(
            KeychainAccess::with_service("io.jobtrail.test").service_name(),
            "io.jobtrail.test"
        );
    }

    #[test]
    fn secret_keys() {
        assert_eq!(
            KeychainAccess::gmail_credentials_key("me@example.com"),
            "gmail.credentials.me@example.com"
        );
        assert_eq!(
            KeychainAccess::inference_token_key(),
            "nlp.api_token.huggingface"
        );
    }

    // Needs a real OS keychain.
    // Run with: cargo test --features keychain-integration-tests -- --ignored
    #[cfg(feature = "keychain-integration-tests")]
    mod integration {
        use super::*;

        #[tokio::test]
        #[ignore = "requires OS keychain access"]
        async fn store_then_retrieve() {
            let keychain = KeychainAccess::with_service("io.jobtrail.test");
            let key = KeychainAccess::gmail_credentials_key("test-account");

            keychain.store(&key, "{}").await.unwrap();
            assert_eq!(keychain.retrieve(&key).await.unwrap(), Some("{}".to_string()));
            assert_eq!(keychain.retrieve("absent").await.unwrap(), None);
        }

        #[tokio::test]
        #[ignore = "requires OS keychain access"]
        async fn secret_outlives_the_accessor_that_stored_it() {
            let key = KeychainAccess::inference_token_key();

            KeychainAccess::with_service("io.jobtrail.test.persist")
                .store(&key, "hf_persisted")
                .await
                .unwrap();

            let fresh = KeychainAccess::with_service("io.jobtrail.test.persist");
            assert_eq!(
                fresh.retrieve(&key).await.unwrap(),
                Some("hf_persisted".to_string())
            );
        }
    }
}
