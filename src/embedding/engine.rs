//! Embedding engine.
//!
//! Uses Candle to run a BERT-family sentence-embedding model locally. Model
//! loading is expensive; build one engine per process and share it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{api::tokio::Api, Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};

use super::ModelType;

/// A vector embedding representing text semantics.
///
/// The embedding dimensionality depends on the model used
/// (e.g., 384 for MiniLM, 768 for BERT base).
#[derive(Debug, Clone)]
pub struct Embedding {
    /// The embedding vector.
    pub values: Vec<f32>,
}

impl Embedding {
    /// Creates a new embedding from a vector of values.
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Returns the dimensionality of this embedding.
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Returns a copy scaled to unit length. A zero vector is returned unchanged.
    pub fn normalized(mut self) -> Self {
        let norm: f32 = self.values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            self.values.iter_mut().for_each(|x| *x /= norm);
        }
        self
    }

    /// Computes cosine similarity with another embedding.
    ///
    /// Returns a value between -1.0 and 1.0, where 1.0 means identical.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }

        let dot: f32 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum();

        let norm_a: f32 = self.values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = other.values.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }
}

/// Configuration for the embedding engine.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Model to download from the Hugging Face Hub.
    pub model: ModelType,
    /// Hub revision (branch, tag or commit).
    pub revision: String,
    /// Local directory holding `config.json`, `tokenizer.json` and
    /// `model.safetensors`; skips the Hub download when set.
    pub model_path: Option<PathBuf>,
    /// Maximum sequence length for tokenization.
    pub max_seq_length: usize,
    /// Whether to use GPU acceleration if available.
    pub use_gpu: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let model = ModelType::default();
        Self {
            model,
            revision: "main".to_string(),
            model_path: None,
            max_seq_length: model.max_seq_length(),
            use_gpu: false,
        }
    }
}

/// Engine for generating text embeddings using local ML models.
///
/// The engine uses Candle for inference, avoiding external API calls
/// to maintain user privacy.
pub struct EmbeddingEngine {
    config: EmbeddingConfig,
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl EmbeddingEngine {
    /// Loads the configured model, downloading it from the Hub if no local
    /// path is set.
    pub async fn load(config: EmbeddingConfig) -> Result<Self> {
        let (config_file, tokenizer_file, weights_file) = match &config.model_path {
            Some(dir) => (
                dir.join("config.json"),
                dir.join("tokenizer.json"),
                dir.join("model.safetensors"),
            ),
            None => {
                let api = Api::new().context("initialize Hugging Face Hub client")?;
                let repo = api.repo(Repo::with_revision(
                    config.model.hf_model_id().to_string(),
                    RepoType::Model,
                    config.revision.clone(),
                ));
                (
                    repo.get("config.json").await?,
                    repo.get("tokenizer.json").await?,
                    repo.get("model.safetensors").await?,
                )
            }
        };

        tracing::info!(
            model_id = %config.model.hf_model_id(),
            weights = %weights_file.display(),
            "Loading embedding model"
        );

        tokio::task::spawn_blocking(move || {
            Self::from_files(config, &config_file, &tokenizer_file, &weights_file)
        })
        .await
        .context("embedding model loader panicked")?
    }

    /// Loads a model from explicit file paths.
    pub fn from_files(
        config: EmbeddingConfig,
        config_file: &Path,
        tokenizer_file: &Path,
        weights_file: &Path,
    ) -> Result<Self> {
        let device = if config.use_gpu {
            Device::cuda_if_available(0)?
        } else {
            Device::Cpu
        };

        let bert_config: Config = serde_json::from_str(
            &std::fs::read_to_string(config_file)
                .with_context(|| format!("read {}", config_file.display()))?,
        )?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_file).map_err(anyhow::Error::msg)?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_seq_length,
                ..Default::default()
            }))
            .map_err(anyhow::Error::msg)?;
        tokenizer.with_padding(None);

        let weights = std::fs::read(weights_file)
            .with_context(|| format!("read weights {}", weights_file.display()))?;
        let vb = VarBuilder::from_buffered_safetensors(weights, DTYPE, &device)?;
        let model = BertModel::load(vb, &bert_config)?;

        Ok(Self {
            config,
            model,
            tokenizer,
            device,
        })
    }

    /// Returns the model this engine runs.
    pub fn model_type(&self) -> ModelType {
        self.config.model
    }

    /// Generates an embedding for the given text.
    ///
    /// The text is tokenized, passed through the model, and the token
    /// embeddings are mean-pooled and L2-normalized.
    pub fn embed(&self, text: &str) -> Result<Embedding> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(anyhow::Error::msg)?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let (_batch, n_tokens, _hidden) = hidden.dims3()?;
        let pooled = (hidden.sum(1)? / (n_tokens as f64))?;
        let values: Vec<f32> = pooled.squeeze(0)?.to_vec1()?;

        Ok(Embedding::new(values).normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_dimension() {
        let embedding = Embedding::new(vec![0.1, 0.2, 0.3]);
        assert_eq!(embedding.dimension(), 3);
    }

    #[test]
    fn normalized_has_unit_length() {
        let embedding = Embedding::new(vec![3.0, 4.0]).normalized();
        assert!((embedding.values[0] - 0.6).abs() < 0.0001);
        assert!((embedding.values[1] - 0.8).abs() < 0.0001);
    }

    #[test]
    fn normalized_zero_vector_is_unchanged() {
        let embedding = Embedding::new(vec![0.0, 0.0]).normalized();
        assert_eq!(embedding.values, vec![0.0, 0.0]);
    }

    #[test]
    fn cosine_similarity_identical() {
        let a = Embedding::new(vec![1.0, 0.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0, 0.0]);
        let similarity = a.cosine_similarity(&b);
        assert!((similarity - 1.0).abs() < 0.0001);
    }

    #[test]
    fn cosine_similarity_orthogonal() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0]);
        let similarity = a.cosine_similarity(&b);
        assert!(similarity.abs() < 0.0001);
    }

    #[test]
    fn cosine_similarity_mismatched_dims() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.model, ModelType::AllMiniLmL6V2);
        assert_eq!(config.max_seq_length, 256);
        assert_eq!(config.revision, "main");
        assert!(config.model_path.is_none());
        assert!(!config.use_gpu);
    }

    #[tokio::test]
    async fn load_fails_for_missing_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = EmbeddingConfig {
            model_path: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        assert!(EmbeddingEngine::load(config).await.is_err());
    }
}
