//! Zero-shot classification by embedding similarity.
//!
//! Each candidate label is rendered through a hypothesis template, embedded,
//! and compared against the message embedding. Labels are ranked by cosine
//! similarity; scores are softmax-normalized so they sum to one.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Embedding, EmbeddingEngine};
use crate::providers::nlp::{LabelScores, NlpError, NlpResult, ZeroShotClassifier};

/// Default template turning a label into a hypothesis sentence.
pub const DEFAULT_HYPOTHESIS_TEMPLATE: &str = "This email is about {}.";

/// Sharpens the softmax over similarities, which sit in a narrow band.
const TEMPERATURE: f32 = 0.05;

/// Local zero-shot classifier backed by an [`EmbeddingEngine`].
pub struct EmbeddingClassifier {
    engine: Arc<EmbeddingEngine>,
    hypothesis_template: String,
}

impl EmbeddingClassifier {
    /// Creates a classifier sharing `engine`.
    pub fn new(engine: Arc<EmbeddingEngine>) -> Self {
        Self {
            engine,
            hypothesis_template: DEFAULT_HYPOTHESIS_TEMPLATE.to_string(),
        }
    }

    /// Overrides the hypothesis template; `{}` is replaced by the label.
    pub fn with_hypothesis_template(mut self, template: impl Into<String>) -> Self {
        self.hypothesis_template = template.into();
        self
    }
}

/// Renders `label` into `template`, appending it when there is no placeholder.
fn hypothesis(template: &str, label: &str) -> String {
    if template.contains("{}") {
        template.replacen("{}", label, 1)
    } else {
        format!("{} {}", template, label).trim().to_string()
    }
}

/// Ranks labels by similarity of their embeddings to `text`.
fn rank_by_similarity(text: &Embedding, labels: &[String], label_embeddings: &[Embedding]) -> LabelScores {
    let similarities: Vec<f32> = label_embeddings
        .iter()
        .map(|e| text.cosine_similarity(e) / TEMPERATURE)
        .collect();

    let max = similarities.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = similarities.iter().map(|s| (s - max).exp()).collect();
    let total: f32 = exps.iter().sum();

    LabelScores::ranked(
        labels
            .iter()
            .cloned()
            .zip(exps.into_iter().map(|e| e / total)),
    )
}

#[async_trait]
impl ZeroShotClassifier for EmbeddingClassifier {
    async fn classify(&self, text: &str, labels: &[String]) -> NlpResult<LabelScores> {
        if labels.is_empty() {
            return Ok(LabelScores::default());
        }

        let engine = Arc::clone(&self.engine);
        let model = engine.model_type();
        let document = format!("{}{}", model.text_prefix(), text);
        let hypotheses: Vec<String> = labels
            .iter()
            .map(|label| {
                format!(
                    "{}{}",
                    model.label_prefix(),
                    hypothesis(&self.hypothesis_template, label)
                )
            })
            .collect();
        let labels = labels.to_vec();

        tokio::task::spawn_blocking(move || {
            let text_embedding = engine.embed(&document)?;
            let label_embeddings = hypotheses
                .iter()
                .map(|h| engine.embed(h))
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok::<_, anyhow::Error>(rank_by_similarity(&text_embedding, &labels, &label_embeddings))
        })
        .await
        .map_err(|e| NlpError::TaskFailed(e.to_string()))?
        .map_err(|e| NlpError::Model(e.to_string()))
    }
}
