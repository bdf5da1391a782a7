//! Local sentence embeddings and embedding-based zero-shot classification.
//!
//! This module runs a sentence-transformer model on the local machine with
//! Candle, so messages can be classified without sending their content to a
//! hosted API.
//!
//! # Architecture
//!
//! - [`EmbeddingEngine`] - Loads a BERT-family model and produces pooled embeddings
//! - [`EmbeddingClassifier`] - Ranks candidate labels by cosine similarity to the text
//! - [`Embedding`] - A vector representation of text semantics
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jobtrail::embedding::{EmbeddingClassifier, EmbeddingConfig, EmbeddingEngine};
//!
//! let engine = Arc::new(EmbeddingEngine::load(EmbeddingConfig::default()).await?);
//! let classifier = EmbeddingClassifier::new(engine);
//! let ranking = classifier.classify(text, &labels).await?;
//! ```

mod classifier;
mod engine;
mod models;

pub use classifier::{EmbeddingClassifier, DEFAULT_HYPOTHESIS_TEMPLATE};
pub use engine::{Embedding, EmbeddingConfig, EmbeddingEngine};
pub use models::ModelType;
