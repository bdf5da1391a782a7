//! Runtime wiring.
//!
//! [`Runtime`] is the composition root: it turns [`Settings`] into a Gmail
//! provider, the classification models and a [`PipelineService`]. Models are
//! built on first use and shared for the rest of the process.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::OnceCell;

use crate::config::{ClassifierBackend, Settings};
use crate::domain::DateWindow;
use crate::embedding::{EmbeddingClassifier, EmbeddingConfig, EmbeddingEngine};
use crate::providers::email::{GmailCredentials, GmailProvider, MailProvider};
use crate::providers::nlp::{EntityRecognizer, HuggingFaceClient, ZeroShotClassifier};
use crate::services::{
    ClassificationService, ContentService, PipelineService, RunReport, SearchService,
};
use crate::storage::{CsvSink, KeychainAccess, MultiSink, XlsxSink};

/// The classifier and recognizer shared by every message in a run.
#[derive(Clone)]
pub struct Models {
    pub classifier: Arc<dyn ZeroShotClassifier>,
    pub recognizer: Arc<dyn EntityRecognizer>,
}

/// Builds and owns the long-lived pieces of a run.
pub struct Runtime {
    settings: Settings,
    keychain: KeychainAccess,
    models: OnceCell<Models>,
}

impl Runtime {
    /// Creates a runtime; nothing is loaded until it is needed.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            keychain: KeychainAccess::new(),
            models: OnceCell::new(),
        }
    }

    /// Uses a non-default keychain namespace.
    pub fn with_keychain(mut self, keychain: KeychainAccess) -> Self {
        self.keychain = keychain;
        self
    }

    /// Injects prebuilt models instead of loading them from settings.
    pub fn with_models(self, models: Models) -> Self {
        let _ = self.models.set(models);
        self
    }

    /// Returns the active settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the models, building them on first call.
    pub async fn models(&self) -> Result<&Models> {
        self.models.get_or_try_init(|| self.load_models()).await
    }

    async fn load_models(&self) -> Result<Models> {
        let classifier_settings = &self.settings.classifier;
        let token = self.inference_token().await;
        let client = http_client(classifier_settings.http_timeout_secs)?;

        let configure = |model: &str| {
            let hf = HuggingFaceClient::new(model, token.clone())
                .with_client(client.clone())
                .with_max_input_chars(classifier_settings.max_input_chars);
            match &classifier_settings.api_base_url {
                Some(url) => hf.with_base_url(url.as_str()),
                None => hf,
            }
        };

        let recognizer: Arc<dyn EntityRecognizer> =
            Arc::new(configure(&classifier_settings.ner_model));

        let classifier: Arc<dyn ZeroShotClassifier> = match classifier_settings.backend {
            ClassifierBackend::HuggingFace => {
                tracing::info!(model = %classifier_settings.zero_shot_model, "Using hosted zero-shot classifier");
                Arc::new(configure(&classifier_settings.zero_shot_model))
            }
            ClassifierBackend::LocalEmbedding => {
                let model = classifier_settings.embedding_model;
                let engine = EmbeddingEngine::load(EmbeddingConfig {
                    model,
                    model_path: classifier_settings.embedding_model_path.clone(),
                    max_seq_length: model.max_seq_length(),
                    ..Default::default()
                })
                .await
                .context("load embedding model")?;
                Arc::new(
                    EmbeddingClassifier::new(Arc::new(engine))
                        .with_hypothesis_template(classifier_settings.hypothesis_template.as_str()),
                )
            }
        };

        Ok(Models {
            classifier,
            recognizer,
        })
    }

    /// Inference token from settings or the environment, else the keychain.
    async fn inference_token(&self) -> Option<String> {
        if let Some(token) = &self.settings.classifier.api_token {
            return Some(token.clone());
        }

        match self.keychain.retrieve(&KeychainAccess::inference_token_key()).await {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "No inference token in keychain");
                None
            }
        }
    }

    /// Builds an authenticated Gmail provider.
    ///
    /// Credentials come from the configured authorized-user file when it
    /// exists, otherwise from the keychain entry for the configured account.
    pub async fn mail_provider(&self) -> Result<Arc<dyn MailProvider>> {
        let gmail = &self.settings.gmail;

        let credentials = match gmail.credentials_path.as_deref().filter(|p| p.exists()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Reading Gmail credentials file");
                let credentials = GmailCredentials::from_authorized_user_file(path)?;
                if gmail.remember_credentials {
                    self.remember(&credentials).await;
                }
                credentials
            }
            None => GmailCredentials::from_keychain(&self.keychain, &gmail.keychain_account)
                .await
                .with_context(|| {
                    format!("no Gmail credentials for account {}", gmail.keychain_account)
                })?,
        };

        let mut provider =
            GmailProvider::new(credentials).with_client(http_client(gmail.http_timeout_secs)?);
        provider
            .authenticate()
            .await
            .context("authenticate with Gmail")?;

        Ok(Arc::new(provider))
    }

    async fn remember(&self, credentials: &GmailCredentials) {
        let account = &self.settings.gmail.keychain_account;
        match credentials.save_to_keychain(&self.keychain, account).await {
            Ok(()) => tracing::info!(account = %account, "Saved Gmail credentials to keychain"),
            Err(e) => tracing::warn!(account = %account, error = %e, "Could not save Gmail credentials"),
        }
    }

    /// Assembles the pipeline around `provider`.
    pub async fn pipeline(&self, provider: Arc<dyn MailProvider>) -> Result<PipelineService> {
        let models = self.models().await?.clone();

        let search = SearchService::new(Arc::clone(&provider))
            .with_category(self.settings.search.category.as_str())
            .with_page_size(self.settings.search.page_size);
        let content = ContentService::new(provider);
        let classification = ClassificationService::new(models.classifier, models.recognizer);

        Ok(PipelineService::new(search, content, classification)
            .with_concurrency(self.settings.pipeline.concurrency)
            .with_fallback_extraction(self.settings.pipeline.use_fallback_extraction))
    }

    /// The configured output files: always CSV, plus XLSX when a path is set.
    pub fn sink(&self) -> MultiSink {
        let output = &self.settings.output;
        let sink = MultiSink::new().with(CsvSink::new(output.csv_path.clone()));

        match &output.xlsx_path {
            Some(path) => sink.with(XlsxSink::new(path.clone())),
            None => sink,
        }
    }

    /// Runs over `window` against Gmail and writes the configured output files.
    pub async fn run(&self, window: &DateWindow) -> Result<RunReport> {
        let provider = self.mail_provider().await?;
        tracing::info!(provider = provider.name(), window = %window, "Starting run");

        let pipeline = self.pipeline(provider).await?;
        let report = pipeline.run_to_sink(window, &self.sink()).await?;
        Ok(report)
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("build HTTP client")
}
