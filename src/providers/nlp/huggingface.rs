//! Hugging Face Inference API client.
//!
//! Runs hosted `zero-shot-classification` and `token-classification`
//! pipelines. The same client type serves both tasks; which one is meaningful
//! depends on the model it points at.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::traits::{EntityRecognizer, EntitySpan, LabelScores, NlpError, NlpResult, ZeroShotClassifier};

/// Default base URL for the hosted inference API.
const HF_INFERENCE_URL: &str = "https://api-inference.huggingface.co";

/// Default zero-shot model (MNLI-finetuned BART).
pub const DEFAULT_ZERO_SHOT_MODEL: &str = "facebook/bart-large-mnli";

/// Default NER model (CoNLL-2003 tags: PER, ORG, LOC, MISC).
pub const DEFAULT_NER_MODEL: &str = "dslim/bert-base-NER";

/// Default cap on characters sent per request.
const DEFAULT_MAX_INPUT_CHARS: usize = 2_000;

/// Request options shared by every task. `wait_for_model` makes a cold model
/// block the request instead of answering 503.
#[derive(Debug, Clone, Copy, Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            wait_for_model: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
}

/// The API has returned both shapes depending on deployment.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Pipeline(LabelScores),
    Pairs(Vec<LabelScorePair>),
}

#[derive(Debug, Deserialize)]
struct LabelScorePair {
    label: String,
    score: f32,
}

impl From<ZeroShotResponse> for LabelScores {
    fn from(response: ZeroShotResponse) -> Self {
        match response {
            ZeroShotResponse::Pipeline(scores) => {
                LabelScores::ranked(scores.labels.into_iter().zip(scores.scores))
            }
            ZeroShotResponse::Pairs(pairs) => {
                LabelScores::ranked(pairs.into_iter().map(|p| (p.label, p.score)))
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenClassificationRequest<'a> {
    inputs: &'a str,
    parameters: TokenClassificationParameters,
    options: RequestOptions,
}

#[derive(Debug, Serialize)]
struct TokenClassificationParameters {
    aggregation_strategy: &'static str,
}

/// One entity from `token-classification`. Aggregated output carries
/// `entity_group`; raw output carries a BIO-prefixed `entity`.
#[derive(Debug, Deserialize)]
struct ApiEntity {
    entity_group: Option<String>,
    entity: Option<String>,
    word: String,
    score: f32,
}

impl ApiEntity {
    fn into_span(self) -> Option<EntitySpan> {
        let raw = self.entity_group.or(self.entity)?;
        let label = raw
            .strip_prefix("B-")
            .or_else(|| raw.strip_prefix("I-"))
            .unwrap_or(&raw)
            .to_string();
        let text = self.word.trim().to_string();
        (!text.is_empty()).then(|| EntitySpan::new(label, text, self.score))
    }
}

/// Error body returned by the inference API.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
    estimated_time: Option<f64>,
}

/// Client for one model on the Hugging Face Inference API.
pub struct HuggingFaceClient {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    model: String,
    max_input_chars: usize,
}

impl HuggingFaceClient {
    /// Creates a client for `model` on the hosted API.
    pub fn new(model: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: HF_INFERENCE_URL.to_string(),
            api_token,
            model: model.into(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Creates a client for the default zero-shot model.
    pub fn zero_shot(api_token: Option<String>) -> Self {
        Self::new(DEFAULT_ZERO_SHOT_MODEL, api_token)
    }

    /// Creates a client for the default NER model.
    pub fn ner(api_token: Option<String>) -> Self {
        Self::new(DEFAULT_NER_MODEL, api_token)
    }

    /// Points the client at a self-hosted inference endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the HTTP client (useful for custom timeouts or proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Caps the number of characters sent per request.
    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max.max(1);
        self
    }

    /// Returns the model identifier being used.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Creates the zero-shot request body for `text`.
    fn zero_shot_request<'a>(&self, text: &'a str, labels: &'a [String]) -> ZeroShotRequest<'a> {
        ZeroShotRequest {
            inputs: self.truncate(text),
            parameters: ZeroShotParameters {
                candidate_labels: labels,
                multi_label: false,
            },
            options: RequestOptions::default(),
        }
    }

    fn token_classification_request<'a>(&self, text: &'a str) -> TokenClassificationRequest<'a> {
        TokenClassificationRequest {
            inputs: self.truncate(text),
            parameters: TokenClassificationParameters {
                aggregation_strategy: "simple",
            },
            options: RequestOptions::default(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref token) = self.api_token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    fn truncate<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.max_input_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }

    async fn post<B: Serialize, T: for<'de> Deserialize<'de>>(&self, body: &B) -> NlpResult<T> {
        let response = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers())
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| NlpError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    async fn handle_error_response(response: reqwest::Response) -> NlpError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());

            return NlpError::RateLimited {
                retry_after_secs: retry_after,
            };
        }

        match response.json::<ApiError>().await {
            Ok(error) if status == 503 && error.estimated_time.is_some() => NlpError::ModelLoading {
                estimated_secs: error.estimated_time,
            },
            Ok(error) => NlpError::ApiError {
                status,
                message: error.error,
            },
            Err(_) => NlpError::ApiError {
                status,
                message: format!("HTTP {}", status),
            },
        }
    }
}

#[async_trait]
impl ZeroShotClassifier for HuggingFaceClient {
    async fn classify(&self, text: &str, labels: &[String]) -> NlpResult<LabelScores> {
        let request = self.zero_shot_request(text, labels);
        let response: ZeroShotResponse = self.post(&request).await?;
        Ok(response.into())
    }
}

#[async_trait]
impl EntityRecognizer for HuggingFaceClient {
    async fn recognize(&self, text: &str) -> NlpResult<Vec<EntitySpan>> {
        let request = self.token_classification_request(text);
        let entities: Vec<ApiEntity> = self.post(&request).await?;
        Ok(entities.into_iter().filter_map(ApiEntity::into_span).collect())
    }
}
