//! Sentence-embedding models the local classifier can run.

use serde::{Deserialize, Serialize};

/// Hub repository and input conventions of one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModelSpec {
    repo: &'static str,
    max_tokens: usize,
    label_prefix: Option<&'static str>,
    text_prefix: Option<&'static str>,
}

/// A supported BERT-family sentence encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// `all-MiniLM-L6-v2`, small and fast.
    #[default]
    AllMiniLmL6V2,
    /// `bge-small-en-v1.5`.
    BgeSmall,
    /// `e5-small-v2`; expects `query:` / `passage:` prefixes.
    E5Small,
}

impl ModelType {
    const fn spec(self) -> ModelSpec {
        match self {
            Self::AllMiniLmL6V2 => ModelSpec {
                repo: "sentence-transformers/all-MiniLM-L6-v2",
                max_tokens: 256,
                label_prefix: None,
                text_prefix: None,
            },
            Self::BgeSmall => ModelSpec {
                repo: "BAAI/bge-small-en-v1.5",
                max_tokens: 512,
                label_prefix: None,
                text_prefix: None,
            },
            Self::E5Small => ModelSpec {
                repo: "intfloat/e5-small-v2",
                max_tokens: 512,
                label_prefix: Some("query: "),
                text_prefix: Some("passage: "),
            },
        }
    }

    /// Hugging Face Hub repository.
    pub fn hf_model_id(&self) -> &'static str {
        self.spec().repo
    }

    /// Token limit; longer messages are truncated.
    pub fn max_seq_length(&self) -> usize {
        self.spec().max_tokens
    }

    /// Prefix for candidate-label hypotheses.
    pub fn label_prefix(&self) -> &'static str {
        self.spec().label_prefix.unwrap_or_default()
    }

    /// Prefix for message text.
    pub fn text_prefix(&self) -> &'static str {
        self.spec().text_prefix.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_minilm() {
        let model = ModelType::default();
        assert_eq!(model.hf_model_id(), "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(model.max_seq_length(), 256);
        assert_eq!(model.label_prefix(), "");
        assert_eq!(model.text_prefix(), "");
    }

    #[test]
    fn e5_uses_query_and_passage_prefixes() {
        let model = ModelType::E5Small;
        assert_eq!(model.label_prefix(), "query: ");
        assert_eq!(model.text_prefix(), "passage: ");
    }

    #[test]
    fn settings_names() {
        assert_eq!(serde_json::to_string(&ModelType::BgeSmall).unwrap(), "\"bge_small\"");

        let model: ModelType = serde_json::from_str("\"e5_small\"").unwrap();
        assert_eq!(model, ModelType::E5Small);
    }
}
