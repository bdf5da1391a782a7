//! Text classification and entity recognition providers.
//!
//! The pipeline treats both models as black boxes behind two traits:
//!
//! - [`ZeroShotClassifier`] ranks a closed label set against a text
//! - [`EntityRecognizer`] tags entity spans (organizations, people, ...)
//!
//! # Supported Backends
//!
//! - **Hugging Face Inference API**: [`HuggingFaceClient`] implements both
//!   traits against hosted (or self-hosted) pipelines
//! - **Local embeddings**: [`crate::embedding::EmbeddingClassifier`] implements
//!   the classifier with a Candle sentence-embedding model
//!
//! # Example
//!
//! ```rust,no_run
//! use jobtrail::providers::nlp::{EntityRecognizer, HuggingFaceClient, ZeroShotClassifier};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let classifier = HuggingFaceClient::zero_shot(None);
//! let labels = vec!["Job Application".to_string(), "Not Job Application".to_string()];
//! let ranking = classifier.classify("Thanks for applying to Acme", &labels).await?;
//! println!("top label: {:?}", ranking.top_label());
//!
//! let ner = HuggingFaceClient::ner(None);
//! for entity in ner.recognize("Thanks for applying to Acme").await? {
//!     println!("{}: {}", entity.label, entity.text);
//! }
//! # Ok(())
//! # }
//! ```

mod huggingface;
mod traits;

pub use huggingface::{HuggingFaceClient, DEFAULT_NER_MODEL, DEFAULT_ZERO_SHOT_MODEL};
pub use traits::{
    EntityRecognizer, EntitySpan, LabelScores, NlpError, NlpResult, ZeroShotClassifier,
};

#[cfg(test)]
pub use traits::{MockEntityRecognizer, MockZeroShotClassifier};
