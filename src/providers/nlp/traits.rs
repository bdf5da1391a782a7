//! Text classification and entity recognition traits and supporting types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during model inference.
#[derive(Debug, Error)]
pub enum NlpError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Model is loading, estimated {estimated_secs:?} seconds")]
    ModelLoading { estimated_secs: Option<f64> },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Inference task failed: {0}")]
    TaskFailed(String),
}

/// Result type for inference operations.
pub type NlpResult<T> = Result<T, NlpError>;

/// Ranked output of a zero-shot classification.
///
/// `labels` and `scores` are parallel and sorted by descending score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelScores {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

impl LabelScores {
    /// Builds a ranking from unordered `(label, score)` pairs.
    pub fn ranked(pairs: impl IntoIterator<Item = (String, f32)>) -> Self {
        let mut pairs: Vec<(String, f32)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (labels, scores) = pairs.into_iter().unzip();
        Self { labels, scores }
    }

    /// The highest-ranked label.
    pub fn top_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }
}

/// A span of text tagged with an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Entity type, e.g. `ORG`, `PER`, `LOC`.
    pub label: String,
    /// Surface text of the entity.
    pub text: String,
    /// Model confidence.
    pub score: f32,
}

impl EntitySpan {
    pub fn new(label: impl Into<String>, text: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
            score,
        }
    }
}

/// Zero-shot text classifier.
///
/// Implementations rank an arbitrary closed label set against the input text
/// without task-specific training. They hold no per-call state, so one
/// instance is shared for the whole run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    /// Ranks `labels` for `text`, best first.
    async fn classify(&self, text: &str, labels: &[String]) -> NlpResult<LabelScores>;
}

/// Named-entity recognizer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Returns the entity spans found in `text`, in document order.
    async fn recognize(&self, text: &str) -> NlpResult<Vec<EntitySpan>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranked_sorts_descending() {
        let scores = LabelScores::ranked([
            ("Not Job Application".to_string(), 0.2),
            ("Job Application".to_string(), 0.8),
        ]);

        assert_eq!(scores.top_label(), Some("Job Application"));
        assert_eq!(scores.scores, vec![0.8, 0.2]);
    }

    #[test]
    fn empty_ranking_has_no_top_label() {
        assert_eq!(LabelScores::default().top_label(), None);
    }

    #[test]
    fn label_scores_deserialize_from_pipeline_output() {
        let json = r#"{
            "sequence": "Thank you for applying",
            "labels": ["Job Application", "Not Job Application"],
            "scores": [0.93, 0.07]
        }"#;
        let scores: LabelScores = serde_json::from_str(json).unwrap();
        assert_eq!(scores.top_label(), Some("Job Application"));
    }

    #[test]
    fn nlp_error_display() {
        let err = NlpError::ApiError {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - overloaded");
    }
}
