//! Run settings and configuration types.
//!
//! Settings are read from `settings.json` in the user's config directory
//! (`~/.config/jobtrail/` or the platform equivalent), or from a path given on
//! the command line. A missing file yields the defaults.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable that overrides the inference API token.
pub const API_TOKEN_ENV: &str = "HF_API_TOKEN";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mailbox access.
    pub gmail: GmailSettings,
    /// Search window and query shape.
    pub search: SearchSettings,
    /// Classification and entity recognition backends.
    pub classifier: ClassifierSettings,
    /// Orchestration behavior.
    pub pipeline: PipelineSettings,
    /// Output destination.
    pub output: OutputSettings,
}

impl Settings {
    /// Default settings file location, if a home directory can be found.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "jobtrail", "jobtrail")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads settings from the default location, or defaults if there is none.
    pub fn load_default() -> Result<Self, SettingsError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Applies environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.classifier.api_token = Some(token.trim().to_string());
            }
        }
    }
}

/// Gmail access configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailSettings {
    /// Authorized-user JSON file with the OAuth refresh token.
    pub credentials_path: Option<PathBuf>,
    /// Keychain account name used when no credentials file is configured.
    pub keychain_account: String,
    /// Copy credentials read from the file into the keychain account.
    pub remember_credentials: bool,
    /// HTTP timeout in seconds.
    pub http_timeout_secs: u64,
}

impl Default for GmailSettings {
    fn default() -> Self {
        Self {
            credentials_path: Some(PathBuf::from("token.json")),
            keychain_account: "default".to_string(),
            remember_credentials: false,
            http_timeout_secs: 60,
        }
    }
}

/// Mailbox search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Default window start (`YYYY/MM/DD`) when none is given on the command line.
    pub start_date: Option<String>,
    /// Default window end (`YYYY/MM/DD`).
    pub end_date: Option<String>,
    /// Gmail category to scope the search to; empty searches all mail.
    pub category: String,
    /// References requested per list call.
    pub page_size: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            category: "primary".to_string(),
            page_size: 100,
        }
    }
}

/// Which zero-shot classifier implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierBackend {
    /// Hosted Hugging Face Inference API.
    #[default]
    HuggingFace,
    /// Local Candle sentence-embedding model.
    LocalEmbedding,
}

/// Classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Zero-shot backend.
    pub backend: ClassifierBackend,
    /// Zero-shot model for the hosted backend.
    pub zero_shot_model: String,
    /// Token-classification model for entity recognition.
    pub ner_model: String,
    /// Inference API base URL, for self-hosted endpoints.
    pub api_base_url: Option<String>,
    /// Inference API token; `HF_API_TOKEN` overrides it.
    pub api_token: Option<String>,
    /// Characters of subject+body sent to the models.
    pub max_input_chars: usize,
    /// Embedding model for the local backend.
    pub embedding_model: crate::embedding::ModelType,
    /// Local model directory for the local backend.
    pub embedding_model_path: Option<PathBuf>,
    /// Sentence each label is rendered into for the local backend; `{}` is
    /// the label.
    pub hypothesis_template: String,
    /// HTTP timeout in seconds.
    pub http_timeout_secs: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::default(),
            zero_shot_model: crate::providers::nlp::DEFAULT_ZERO_SHOT_MODEL.to_string(),
            ner_model: crate::providers::nlp::DEFAULT_NER_MODEL.to_string(),
            api_base_url: None,
            api_token: None,
            max_input_chars: 2_000,
            embedding_model: crate::embedding::ModelType::default(),
            embedding_model_path: None,
            hypothesis_template: crate::embedding::DEFAULT_HYPOTHESIS_TEMPLATE.to_string(),
            http_timeout_secs: 60,
        }
    }
}

/// Orchestration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Messages decoded and classified concurrently; 1 is strictly sequential.
    pub concurrency: usize,
    /// Whether regex and sender-domain heuristics fill fields the model left unknown.
    pub use_fallback_extraction: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            use_fallback_extraction: true,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// CSV file receiving the records.
    pub csv_path: PathBuf,
    /// XLSX workbook receiving the same records; `null` skips it.
    pub xlsx_path: Option<PathBuf>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("job_applications.csv"),
            xlsx_path: Some(PathBuf::from("job_applications.xlsx")),
        }
    }
}
